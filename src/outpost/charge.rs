//! Charge engine - accrual, contest decay and threshold floors
//!
//! Evaluated once per tick, in priority order:
//! 1. a single party that matches (or becomes) the controller accrues charge;
//!    solo control lasts only while a solo player is on the point and yields
//!    to the first lone team
//! 2. any other occupancy with someone present is a contest: charge freezes,
//!    and after the grace period it decays down to the nearest threshold floor
//! 3. an empty point pauses everything
//!
//! Accrual is measured in wall-clock seconds since the previous tick, so tick
//! jitter never changes how long a capture takes.

use serde::{Deserialize, Serialize};

use crate::core::config::OutpostConfig;
use crate::core::types::{Party, Timestamp};
use crate::outpost::boost::BoostLedger;
use crate::outpost::occupancy::OccupantSet;

/// Fully charged
pub const MAX_CHARGE: f64 = 100.0;

/// Snap to full when this close, so float accumulation still lands on 100
const FULL_EPSILON: f64 = 1e-9;

/// What the engine did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePhase {
    /// Nobody on the point
    Paused,
    /// Controller alone on the point, gaining charge
    Accruing,
    /// Someone other than the controller (or several parties) present
    Contested,
    /// A contest outlasted the grace period and charge was reduced
    Decayed,
    /// Charge is at maximum; overtime owns the outpost
    Full,
}

/// Per-tick output of the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeResult {
    pub charge: f64,
    pub controlling_party: Option<Party>,
    pub entered_overtime: bool,
    pub phase: ChargePhase,
}

/// Mutable charge state of one outpost
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeState {
    pub charge: f64,
    pub controlling_party: Option<Party>,
    /// Set only while a contest is ongoing
    pub contest_start_time: Option<Timestamp>,
}

/// Owns an outpost's charge and decides each tick whether to accrue, decay or freeze
#[derive(Debug, Clone)]
pub struct ChargeEngine {
    config: OutpostConfig,
    state: ChargeState,
    last_tick: Option<Timestamp>,
}

impl ChargeEngine {
    pub fn new(config: OutpostConfig) -> Self {
        Self {
            config,
            state: ChargeState::default(),
            last_tick: None,
        }
    }

    pub fn state(&self) -> &ChargeState {
        &self.state
    }

    pub fn charge(&self) -> f64 {
        self.state.charge
    }

    pub fn controlling_party(&self) -> Option<Party> {
        self.state.controlling_party
    }

    /// Overtime may hand control to a new team
    pub fn set_controlling_party(&mut self, party: Option<Party>) {
        self.state.controlling_party = party;
    }

    pub fn is_full(&self) -> bool {
        self.state.charge >= MAX_CHARGE
    }

    /// Start measuring elapsed time from `now` without touching charge
    pub fn resume(&mut self, now: Timestamp) {
        self.last_tick = Some(now);
    }

    /// Zero charge, drop the controller and forget the clock
    pub fn reset(&mut self) {
        self.state = ChargeState::default();
        self.last_tick = None;
    }

    pub fn tick(&mut self, occupants: &OccupantSet, boosts: &BoostLedger, now: Timestamp) -> ChargeResult {
        let elapsed = self
            .last_tick
            .map(|last| now.secs_since(last))
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if self.is_full() {
            return self.result(ChargePhase::Full, false);
        }

        if let Some(party) = self.state.controlling_party {
            if party.is_solo() && occupants.solo_players_in_radius.is_empty() {
                tracing::info!(%party, charge = self.state.charge, "solo controller left, control released");
                self.state.controlling_party = None;
            }
        }

        if occupants.is_empty() {
            self.state.contest_start_time = None;
            return self.result(ChargePhase::Paused, false);
        }

        match occupants.sole_party() {
            Some(party) => {
                let controller = match self.state.controlling_party {
                    Some(current) if current.is_solo() && !party.is_solo() => {
                        tracing::info!(%party, from = %current, "team took over solo capture");
                        self.state.controlling_party = Some(party);
                        party
                    }
                    Some(current) => current,
                    None => {
                        tracing::info!(%party, "started capturing outpost");
                        self.state.controlling_party = Some(party);
                        party
                    }
                };

                if controller.same_side(&party) {
                    // A lone solo player holds whatever solo progress exists
                    self.state.controlling_party = Some(party);
                    self.accrue(&party, boosts, elapsed)
                } else {
                    self.contest(now)
                }
            }
            None => self.contest(now),
        }
    }

    fn accrue(&mut self, party: &Party, boosts: &BoostLedger, elapsed: f64) -> ChargeResult {
        self.state.contest_start_time = None;

        let boost = boosts.boost_for(party);
        let rate = self.config.base_rate() + boost;
        let mut charge = self.state.charge + rate * elapsed;
        if charge >= MAX_CHARGE - FULL_EPSILON {
            charge = MAX_CHARGE;
        }
        self.state.charge = charge.clamp(0.0, MAX_CHARGE);
        tracing::debug!(%party, charge = self.state.charge, boost, "outpost charging");

        if self.is_full() {
            tracing::info!(%party, "outpost fully charged");
            self.result(ChargePhase::Full, true)
        } else {
            self.result(ChargePhase::Accruing, false)
        }
    }

    fn contest(&mut self, now: Timestamp) -> ChargeResult {
        let started = match self.state.contest_start_time {
            Some(started) => started,
            None => {
                tracing::info!(charge = self.state.charge, "outpost contested, charging paused");
                self.state.contest_start_time = Some(now);
                return self.result(ChargePhase::Contested, false);
            }
        };

        if now.secs_since(started) < self.config.contest_grace_secs {
            return self.result(ChargePhase::Contested, false);
        }

        let before = self.state.charge;
        self.state.charge = self.reduced_charge(before);
        self.state.contest_start_time = Some(now);
        tracing::info!(before, after = self.state.charge, "outpost charge reduced by contest");

        if self.state.charge <= 0.0 {
            if let Some(party) = self.state.controlling_party.take() {
                tracing::info!(%party, "contest drained outpost, control released");
            }
        }

        self.result(ChargePhase::Decayed, false)
    }

    /// Charge after one contest reduction, held up by the highest threshold
    /// at or below the pre-reduction charge
    pub fn reduced_charge(&self, before: f64) -> f64 {
        let reduced = (before - self.config.charge_reduction_rate).max(0.0);
        match self.config.threshold_floor(before) {
            Some(floor) => reduced.max(floor),
            None => reduced,
        }
    }

    fn result(&self, phase: ChargePhase, entered_overtime: bool) -> ChargeResult {
        ChargeResult {
            charge: self.state.charge,
            controlling_party: self.state.controlling_party,
            entered_overtime,
            phase,
        }
    }
}

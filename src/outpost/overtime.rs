//! Overtime - sudden death once an outpost is fully charged
//!
//! When the countdown runs out the point is inspected: the controller alone (or
//! nobody) wins, a single challenger takes over and restarts the countdown, and
//! several teams keep overtime running for as long as they fight over it.
//! Resets restore the full countdown up to the reset limit; beyond it each
//! reset shortens the countdown by a second, never below one.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{Party, TeamId, Timestamp};

/// Shortest countdown a run of resets can shrink overtime to
pub const MIN_OVERTIME_SECS: u32 = 1;

/// How an overtime ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OvertimeOutcome {
    Winner(Party),
    NoWinner,
}

impl OvertimeOutcome {
    pub fn winner(&self) -> Option<Party> {
        match self {
            OvertimeOutcome::Winner(party) => Some(*party),
            OvertimeOutcome::NoWinner => None,
        }
    }
}

/// Result of one overtime tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OvertimeStep {
    /// Overtime is not running
    Inactive,
    /// Countdown still running
    Running { remaining_secs: f64 },
    /// A new team took over and the countdown restarted
    Reset {
        controller: TeamId,
        reset_count: u32,
        duration_secs: u32,
    },
    /// Countdown expired with several teams on the point
    Extended,
    Resolved(OvertimeOutcome),
}

/// Overtime bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OvertimeState {
    pub active: bool,
    /// Countdown length currently in force
    pub remaining_duration_secs: u32,
    pub start_time: Option<Timestamp>,
    pub reset_count: u32,
}

#[derive(Debug, Clone)]
pub struct OvertimeResolver {
    duration_secs: u32,
    reset_limit: u32,
    state: OvertimeState,
}

impl OvertimeResolver {
    pub fn new(duration_secs: u32, reset_limit: u32) -> Self {
        Self {
            duration_secs: duration_secs.max(MIN_OVERTIME_SECS),
            reset_limit,
            state: OvertimeState::default(),
        }
    }

    pub fn state(&self) -> &OvertimeState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Seconds left on the countdown at `now`
    pub fn remaining_secs(&self, now: Timestamp) -> f64 {
        match self.state.start_time {
            Some(start) if self.state.active => {
                (self.state.remaining_duration_secs as f64 - now.secs_since(start)).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Enter overtime with a full countdown; ignored if already active
    pub fn activate(&mut self, now: Timestamp) {
        if self.state.active {
            return;
        }
        self.state = OvertimeState {
            active: true,
            remaining_duration_secs: self.duration_secs,
            start_time: Some(now),
            reset_count: 0,
        };
        tracing::info!(duration_secs = self.duration_secs, "overtime started");
    }

    pub fn reset(&mut self) {
        self.state = OvertimeState::default();
    }

    pub fn tick(
        &mut self,
        teams_in_radius: &AHashSet<TeamId>,
        controller: &mut Option<Party>,
        now: Timestamp,
    ) -> OvertimeStep {
        let start = match self.state.start_time {
            Some(start) if self.state.active => start,
            _ => return OvertimeStep::Inactive,
        };

        let countdown_ms = u64::from(self.state.remaining_duration_secs) * 1000;
        if now.millis_since(start) < countdown_ms {
            let remaining_secs = self.remaining_secs(now);
            tracing::debug!(remaining_secs, "overtime ongoing");
            return OvertimeStep::Running { remaining_secs };
        }

        match teams_in_radius.len() {
            0 => self.resolve(*controller),
            1 => {
                let team = match teams_in_radius.iter().next() {
                    Some(team) => *team,
                    None => return OvertimeStep::Extended,
                };
                if *controller == Some(Party::Team(team)) {
                    self.resolve(*controller)
                } else {
                    *controller = Some(Party::Team(team));
                    self.restart(team, now)
                }
            }
            _ => {
                tracing::debug!(teams = teams_in_radius.len(), "overtime contested, extending");
                OvertimeStep::Extended
            }
        }
    }

    fn restart(&mut self, team: TeamId, now: Timestamp) -> OvertimeStep {
        if self.state.reset_count < self.reset_limit {
            self.state.reset_count += 1;
            self.state.remaining_duration_secs = self.duration_secs;
            tracing::info!(
                %team,
                reset_count = self.state.reset_count,
                "overtime reset to full duration"
            );
        } else {
            self.state.remaining_duration_secs = self
                .state
                .remaining_duration_secs
                .saturating_sub(1)
                .max(MIN_OVERTIME_SECS);
            tracing::info!(
                %team,
                duration_secs = self.state.remaining_duration_secs,
                "overtime reset limit reached, duration reduced"
            );
        }
        self.state.start_time = Some(now);

        OvertimeStep::Reset {
            controller: team,
            reset_count: self.state.reset_count,
            duration_secs: self.state.remaining_duration_secs,
        }
    }

    fn resolve(&mut self, controller: Option<Party>) -> OvertimeStep {
        let outcome = match controller {
            Some(party) => {
                tracing::info!(%party, "overtime won");
                OvertimeOutcome::Winner(party)
            }
            None => {
                tracing::info!("overtime ended with no winner");
                OvertimeOutcome::NoWinner
            }
        };
        self.reset();
        OvertimeStep::Resolved(outcome)
    }
}

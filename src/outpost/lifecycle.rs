//! Outposts - a named reference point carrying one objective

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::config::{HoldConfig, OutpostConfig, Settings};
use crate::core::error::{OutpostError, Result};
use crate::core::types::{Party, Position, TeamId, Timestamp};
use crate::hooks::Hooks;
use crate::outpost::contested::{ContestedObjective, KillEvent};
use crate::outpost::hold::{HoldObjective, HoldStep};
use crate::outpost::occupancy::Sighting;
use crate::outpost::overtime::OvertimeOutcome;

/// The two flavours of outpost
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutpostKind {
    /// First individual to hold the point long enough wins
    #[display(fmt = "simple")]
    Simple,
    /// Team charge, contest decay and overtime
    #[display(fmt = "contested")]
    Contested,
}

impl FromStr for OutpostKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "hold" => Ok(OutpostKind::Simple),
            "contested" | "classified" => Ok(OutpostKind::Contested),
            other => Err(format!("unknown outpost kind '{}'", other)),
        }
    }
}

/// A finished objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outpost: String,
    pub kind: OutpostKind,
    pub outcome: OvertimeOutcome,
    pub resolved_at: Timestamp,
}

/// What an outpost looked like after a tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub charge: f64,
    pub controller: Option<Party>,
    pub overtime_active: bool,
    pub resolution: Option<Resolution>,
}

/// Snapshot handed to whatever presents outposts to players
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutpostStatus {
    pub name: String,
    pub kind: OutpostKind,
    pub running: bool,
    pub charge: f64,
    pub controller: Option<Party>,
    pub overtime_active: bool,
    pub overtime_remaining_secs: f64,
    pub overtime_resets: u32,
    pub teams_in_radius: Vec<TeamId>,
    pub solo_in_radius: usize,
}

#[derive(Debug, Clone)]
enum Objective {
    Simple(HoldObjective),
    Contested(ContestedObjective),
}

type ResolvedCallback = Box<dyn FnMut(&Resolution) + Send>;

pub struct Outpost {
    name: String,
    position: Position,
    objective: Objective,
    running: bool,
    last_refill: Option<Timestamp>,
    callbacks: Vec<ResolvedCallback>,
}

impl Outpost {
    /// Build an outpost of `kind` using the matching section of `settings`
    pub fn new(
        name: impl Into<String>,
        position: Position,
        kind: OutpostKind,
        settings: &Settings,
    ) -> Self {
        match kind {
            OutpostKind::Simple => Self::simple(name, position, settings.hold.clone()),
            OutpostKind::Contested => Self::contested(name, position, settings.contested.clone()),
        }
    }

    pub fn contested(name: impl Into<String>, position: Position, config: OutpostConfig) -> Self {
        Self::with_objective(
            name.into(),
            position,
            Objective::Contested(ContestedObjective::new(position, config)),
        )
    }

    pub fn simple(name: impl Into<String>, position: Position, config: HoldConfig) -> Self {
        Self::with_objective(
            name.into(),
            position,
            Objective::Simple(HoldObjective::new(position, config)),
        )
    }

    fn with_objective(name: String, position: Position, objective: Objective) -> Self {
        Self {
            name,
            position,
            objective,
            running: false,
            last_refill: None,
            callbacks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> OutpostKind {
        match self.objective {
            Objective::Simple(_) => OutpostKind::Simple,
            Objective::Contested(_) => OutpostKind::Contested,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The contested state machine, if this outpost has one
    pub fn contested_objective(&self) -> Option<&ContestedObjective> {
        match &self.objective {
            Objective::Contested(obj) => Some(obj),
            Objective::Simple(_) => None,
        }
    }

    pub fn hold_objective(&self) -> Option<&HoldObjective> {
        match &self.objective {
            Objective::Simple(obj) => Some(obj),
            Objective::Contested(_) => None,
        }
    }

    pub fn current_charge_percent(&self) -> f64 {
        match &self.objective {
            Objective::Simple(obj) => obj.best_progress(),
            Objective::Contested(obj) => obj.charge(),
        }
    }

    pub fn controlling_party(&self) -> Option<Party> {
        match &self.objective {
            Objective::Simple(obj) => obj.leader().map(|(player, _)| Party::Solo(player)),
            Objective::Contested(obj) => obj.controlling_party(),
        }
    }

    pub fn is_overtime_active(&self) -> bool {
        match &self.objective {
            Objective::Simple(_) => false,
            Objective::Contested(obj) => obj.is_overtime_active(),
        }
    }

    /// Register a callback for every resolution of this outpost
    pub fn on_resolved(&mut self, callback: impl FnMut(&Resolution) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Start a fresh cycle at `now`
    pub fn start(&mut self, now: Timestamp, hooks: &Hooks) -> Result<()> {
        if self.running {
            return Err(OutpostError::AlreadyRunning(self.name.clone()));
        }
        self.reset(hooks);
        self.running = true;
        match &mut self.objective {
            Objective::Simple(obj) => obj.start(now),
            Objective::Contested(obj) => obj.start(now),
        }
        if self.kind() == OutpostKind::Contested {
            self.refill_loot(now, hooks)?;
        }
        tracing::info!(outpost = %self.name, kind = %self.kind(), "outpost started");
        Ok(())
    }

    /// Stop and clear all state; takes effect between ticks
    pub fn stop(&mut self, hooks: &Hooks) -> Result<()> {
        if !self.running {
            return Err(OutpostError::NotRunning(self.name.clone()));
        }
        self.running = false;
        self.reset(hooks);
        tracing::info!(outpost = %self.name, "outpost stopped");
        Ok(())
    }

    /// Zero charge, controller, boosts and overtime without touching `running`
    ///
    /// Everyone still on the point is reported to the occupancy observer as exited.
    pub fn reset(&mut self, hooks: &Hooks) {
        match &mut self.objective {
            Objective::Simple(obj) => obj.reset(&self.name, hooks),
            Objective::Contested(obj) => obj.reset(&self.name, hooks),
        }
        self.last_refill = None;
    }

    /// Ask the loot collaborator to refill this outpost's containers
    pub fn refill_loot(&mut self, now: Timestamp, hooks: &Hooks) -> Result<()> {
        if self.kind() != OutpostKind::Contested {
            return Err(OutpostError::UnsupportedKind {
                name: self.name.clone(),
                operation: "loot refill".to_string(),
            });
        }
        self.last_refill = Some(now);
        if let Err(e) = hooks.loot.refill_loot(&self.name) {
            tracing::warn!(outpost = %self.name, error = %e, "loot refill failed");
        }
        Ok(())
    }

    /// Credit a kill outside the regular tick
    pub fn record_kill(&mut self, kill: KillEvent, hooks: &Hooks) -> Result<()> {
        if !self.running {
            return Err(OutpostError::NotRunning(self.name.clone()));
        }
        match &mut self.objective {
            Objective::Contested(obj) => {
                obj.record_kill(kill, hooks.roster.as_ref());
                Ok(())
            }
            Objective::Simple(_) => Err(OutpostError::UnsupportedKind {
                name: self.name.clone(),
                operation: "kill boosts".to_string(),
            }),
        }
    }

    /// Run one tick; `None` while stopped
    ///
    /// Never fails: collaborator errors are logged and the tick completes.
    pub fn tick(
        &mut self,
        sightings: &[Sighting],
        kills: &[KillEvent],
        hooks: &Hooks,
        now: Timestamp,
    ) -> Option<TickReport> {
        if !self.running {
            return None;
        }

        let outcome = match &mut self.objective {
            Objective::Simple(obj) => match obj.tick(&self.name, sightings, hooks, now) {
                HoldStep::Completed { winner } => Some(OvertimeOutcome::Winner(Party::Solo(winner))),
                HoldStep::Holding { .. } => None,
            },
            Objective::Contested(obj) => obj.tick(&self.name, sightings, kills, hooks, now).outcome(),
        };

        if outcome.is_none() {
            self.refill_if_due(now, hooks);
        }

        let mut report = TickReport {
            charge: self.current_charge_percent(),
            controller: self.controlling_party(),
            overtime_active: self.is_overtime_active(),
            resolution: None,
        };

        if let Some(outcome) = outcome {
            let resolution = Resolution {
                outpost: self.name.clone(),
                kind: self.kind(),
                outcome,
                resolved_at: now,
            };
            self.resolve(&resolution, hooks);
            report.resolution = Some(resolution);
        }

        Some(report)
    }

    fn refill_if_due(&mut self, now: Timestamp, hooks: &Hooks) {
        let interval = match &self.objective {
            Objective::Contested(obj) => obj.config().loot_refill_interval_secs,
            Objective::Simple(_) => return,
        };
        let due = self
            .last_refill
            .map_or(true, |last| now.secs_since(last) >= interval);
        if due {
            tracing::debug!(outpost = %self.name, "periodic loot refill");
            if let Err(e) = self.refill_loot(now, hooks) {
                tracing::warn!(outpost = %self.name, error = %e, "loot refill skipped");
            }
        }
    }

    fn resolve(&mut self, resolution: &Resolution, hooks: &Hooks) {
        tracing::info!(
            outpost = %self.name,
            outcome = ?resolution.outcome,
            "objective resolved"
        );
        for callback in self.callbacks.iter_mut() {
            callback(resolution);
        }
        if let Err(e) = hooks.rewards.grant(resolution) {
            tracing::warn!(outpost = %self.name, error = %e, "reward grant failed");
        }
        self.running = false;
        self.reset(hooks);
    }

    pub fn status(&self, now: Timestamp) -> OutpostStatus {
        let occupants = match &self.objective {
            Objective::Simple(obj) => obj.occupants(),
            Objective::Contested(obj) => obj.occupants(),
        };
        let (remaining, resets) = match &self.objective {
            Objective::Contested(obj) => (
                obj.overtime_remaining_secs(now),
                obj.overtime_state().reset_count,
            ),
            Objective::Simple(_) => (0.0, 0),
        };

        OutpostStatus {
            name: self.name.clone(),
            kind: self.kind(),
            running: self.running,
            charge: self.current_charge_percent(),
            controller: self.controlling_party(),
            overtime_active: self.is_overtime_active(),
            overtime_remaining_secs: remaining,
            overtime_resets: resets,
            teams_in_radius: occupants.sorted_teams(),
            solo_in_radius: occupants.solo_players_in_radius.len(),
        }
    }
}

impl std::fmt::Debug for Outpost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outpost")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("objective", &self.objective)
            .field("running", &self.running)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

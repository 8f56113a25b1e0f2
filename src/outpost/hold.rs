//! Hold-to-win outposts
//!
//! Every player inside the radius builds personal progress; stepping out loses
//! it. The first to reach 100 wins. Teams play no part here.

use ahash::AHashMap;

use crate::core::config::HoldConfig;
use crate::core::types::{PlayerId, Position, Timestamp};
use crate::hooks::Hooks;
use crate::outpost::charge::MAX_CHARGE;
use crate::outpost::occupancy::{OccupancyTracker, OccupantSet, Sighting};

/// Result of one hold tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldStep {
    /// Best progress on the point, if anyone is holding it
    Holding { leader: Option<(PlayerId, f64)> },
    Completed { winner: PlayerId },
}

#[derive(Debug, Clone)]
pub struct HoldObjective {
    config: HoldConfig,
    tracker: OccupancyTracker,
    progress: AHashMap<PlayerId, f64>,
    last_tick: Option<Timestamp>,
}

impl HoldObjective {
    pub fn new(center: Position, config: HoldConfig) -> Self {
        Self {
            tracker: OccupancyTracker::new(center, config.radius),
            config,
            progress: AHashMap::new(),
            last_tick: None,
        }
    }

    pub fn occupants(&self) -> &OccupantSet {
        self.tracker.occupants()
    }

    pub fn progress_of(&self, player: PlayerId) -> f64 {
        self.progress.get(&player).copied().unwrap_or(0.0)
    }

    /// Highest personal progress, shown as the outpost's charge
    pub fn best_progress(&self) -> f64 {
        self.progress.values().copied().fold(0.0, f64::max)
    }

    pub fn leader(&self) -> Option<(PlayerId, f64)> {
        self.progress
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(p, v)| (*p, *v))
    }

    pub fn start(&mut self, now: Timestamp) {
        self.last_tick = Some(now);
    }

    pub fn tick(
        &mut self,
        outpost: &str,
        sightings: &[Sighting],
        hooks: &Hooks,
        now: Timestamp,
    ) -> HoldStep {
        let elapsed = self
            .last_tick
            .map(|last| now.secs_since(last))
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        self.tracker.refresh(outpost, sightings, hooks);

        let mut next = AHashMap::with_capacity(self.progress.len());
        let mut winner = None;
        for sighting in sightings.iter().filter(|s| self.tracker.contains(s.position)) {
            let held = self.progress_of(sighting.player) + self.config.progress_rate * elapsed;
            let held = held.min(MAX_CHARGE);
            next.insert(sighting.player, held);
            if held >= MAX_CHARGE && winner.is_none() {
                winner = Some(sighting.player);
            }
        }
        self.progress = next;

        match winner {
            Some(winner) => {
                tracing::info!(outpost, %winner, "outpost held to completion");
                HoldStep::Completed { winner }
            }
            None => {
                let leader = self.leader();
                if let Some((player, progress)) = leader {
                    tracing::debug!(outpost, %player, progress, "outpost hold progress");
                }
                HoldStep::Holding { leader }
            }
        }
    }

    pub fn reset(&mut self, outpost: &str, hooks: &Hooks) {
        self.tracker.clear(outpost, hooks);
        self.progress.clear();
        self.last_tick = None;
    }
}

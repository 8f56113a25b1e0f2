//! External collaborators the outpost core calls into
//!
//! The core never blocks on these and never lets their failures touch charge or
//! overtime state: a failed call is logged and the tick carries on.

use ahash::AHashMap;
use std::sync::{Arc, Mutex};

use crate::core::error::Result;
use crate::core::types::TeamId;
use crate::outpost::occupancy::Occupant;
use crate::outpost::Resolution;

/// Team membership lookups
pub trait TeamRoster: Send + Sync {
    /// Current member count, `None` if the team is unknown
    fn member_count(&self, team: TeamId) -> Option<usize>;

    /// Whether occupancy should treat members of `team` as a team at all
    ///
    /// Members of unrecognised teams are tracked as solo players.
    fn recognizes(&self, team: TeamId) -> bool {
        self.member_count(team).is_some()
    }
}

/// Durable registry of who is inside an outpost's radius
pub trait OccupancyObserver: Send + Sync {
    fn entered(&self, outpost: &str, occupant: Occupant) -> Result<()>;
    fn exited(&self, outpost: &str, occupant: Occupant) -> Result<()>;
}

/// Receives finished objectives so winners can be rewarded
pub trait RewardSink: Send + Sync {
    fn grant(&self, resolution: &Resolution) -> Result<()>;
}

/// Loot container refills around an outpost
pub trait LootHook: Send + Sync {
    fn refill_loot(&self, outpost: &str) -> Result<()>;
}

/// Roster that accepts every team id but knows no sizes
///
/// Useful when the host has no team service; every team then counts as size 0
/// for boost purposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRoster;

impl TeamRoster for OpenRoster {
    fn member_count(&self, _team: TeamId) -> Option<usize> {
        None
    }

    fn recognizes(&self, _team: TeamId) -> bool {
        true
    }
}

/// Fixed team sizes held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    sizes: AHashMap<TeamId, usize>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team: TeamId, members: usize) -> Self {
        self.sizes.insert(team, members);
        self
    }

    pub fn set_team(&mut self, team: TeamId, members: usize) {
        self.sizes.insert(team, members);
    }
}

impl TeamRoster for StaticRoster {
    fn member_count(&self, team: TeamId) -> Option<usize> {
        self.sizes.get(&team).copied()
    }
}

/// Collaborator that accepts everything and does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl OccupancyObserver for NoopHooks {
    fn entered(&self, _outpost: &str, _occupant: Occupant) -> Result<()> {
        Ok(())
    }

    fn exited(&self, _outpost: &str, _occupant: Occupant) -> Result<()> {
        Ok(())
    }
}

impl LootHook for NoopHooks {
    fn refill_loot(&self, _outpost: &str) -> Result<()> {
        Ok(())
    }
}

impl RewardSink for NoopHooks {
    fn grant(&self, _resolution: &Resolution) -> Result<()> {
        Ok(())
    }
}

/// Something a recording collaborator saw
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    Entered { outpost: String, occupant: Occupant },
    Exited { outpost: String, occupant: Occupant },
    Refilled { outpost: String },
    Rewarded(Resolution),
}

/// In-memory collaborator that remembers every call
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn refill_count(&self, outpost: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, HookEvent::Refilled { outpost: o } if o == outpost))
            .count()
    }

    /// Every resolution handed to the reward sink, oldest first
    pub fn resolutions(&self) -> Vec<Resolution> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HookEvent::Rewarded(resolution) => Some(resolution),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: HookEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl OccupancyObserver for RecordingHooks {
    fn entered(&self, outpost: &str, occupant: Occupant) -> Result<()> {
        self.push(HookEvent::Entered {
            outpost: outpost.to_string(),
            occupant,
        });
        Ok(())
    }

    fn exited(&self, outpost: &str, occupant: Occupant) -> Result<()> {
        self.push(HookEvent::Exited {
            outpost: outpost.to_string(),
            occupant,
        });
        Ok(())
    }
}

impl LootHook for RecordingHooks {
    fn refill_loot(&self, outpost: &str) -> Result<()> {
        self.push(HookEvent::Refilled {
            outpost: outpost.to_string(),
        });
        Ok(())
    }
}

impl RewardSink for RecordingHooks {
    fn grant(&self, resolution: &Resolution) -> Result<()> {
        self.push(HookEvent::Rewarded(resolution.clone()));
        Ok(())
    }
}

/// The set of collaborators handed to every tick
#[derive(Clone)]
pub struct Hooks {
    pub roster: Arc<dyn TeamRoster>,
    pub observer: Arc<dyn OccupancyObserver>,
    pub loot: Arc<dyn LootHook>,
    pub rewards: Arc<dyn RewardSink>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            roster: Arc::new(OpenRoster),
            observer: Arc::new(NoopHooks),
            loot: Arc::new(NoopHooks),
            rewards: Arc::new(NoopHooks),
        }
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(mut self, roster: impl TeamRoster + 'static) -> Self {
        self.roster = Arc::new(roster);
        self
    }

    pub fn with_observer(mut self, observer: impl OccupancyObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_loot(mut self, loot: impl LootHook + 'static) -> Self {
        self.loot = Arc::new(loot);
        self
    }

    pub fn with_rewards(mut self, rewards: impl RewardSink + 'static) -> Self {
        self.rewards = Arc::new(rewards);
        self
    }

    /// Hooks that record occupancy, loot and reward calls into `recorder`
    pub fn recording(recorder: &RecordingHooks) -> Self {
        Self::default()
            .with_observer(recorder.clone())
            .with_loot(recorder.clone())
            .with_rewards(recorder.clone())
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// World coordinate of an outpost or an individual
pub type Position = glam::Vec3;

/// Unique identifier for individual players
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "player {}", _0)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for teams
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display(fmt = "team {}", _0)]
pub struct TeamId(pub u32);

impl TeamId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Monotonic time in milliseconds since the driving clock's epoch
#[derive(
    Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "{}ms", _0)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub fn millis(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, zero if `earlier` is in the future
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1000.0
    }

    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn advanced(&self, by: Duration) -> Self {
        Self(self.0.saturating_add(by.as_millis() as u64))
    }
}

/// The party credited with an outpost's charge
///
/// Every solo player counts as the same side: a lone unaffiliated player keeps
/// charging whatever an earlier lone player started.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    #[display(fmt = "{}", _0)]
    Team(TeamId),
    #[display(fmt = "solo {}", _0)]
    Solo(PlayerId),
}

impl Party {
    pub fn team(&self) -> Option<TeamId> {
        match self {
            Party::Team(id) => Some(*id),
            Party::Solo(_) => None,
        }
    }

    pub fn is_solo(&self) -> bool {
        matches!(self, Party::Solo(_))
    }

    /// Returns true if both parties are the same team, or both are solo players
    pub fn same_side(&self, other: &Party) -> bool {
        match (self, other) {
            (Party::Team(a), Party::Team(b)) => a == b,
            (Party::Solo(_), Party::Solo(_)) => true,
            _ => false,
        }
    }
}

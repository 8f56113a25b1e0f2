//! Outposts - capture points and the state machines that decide who takes them
//!
//! A contested outpost runs every tick through occupancy, boosts, charge and
//! overtime in that order. A simple outpost only tracks personal hold progress.

pub mod boost;
pub mod charge;
pub mod contested;
pub mod hold;
pub mod lifecycle;
pub mod occupancy;
pub mod overtime;

pub use boost::{BoostLedger, KillCredit, FULL_BOOST_UNIT, HALF_BOOST_UNIT};
pub use charge::{ChargeEngine, ChargePhase, ChargeResult, ChargeState, MAX_CHARGE};
pub use contested::{ContestedObjective, ContestedStep, KillEvent};
pub use hold::{HoldObjective, HoldStep};
pub use lifecycle::{Outpost, OutpostKind, OutpostStatus, Resolution, TickReport};
pub use occupancy::{OccupancyChange, OccupancyTracker, Occupant, OccupantSet, Sighting};
pub use overtime::{OvertimeOutcome, OvertimeResolver, OvertimeState, OvertimeStep};

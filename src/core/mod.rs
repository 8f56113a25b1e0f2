pub mod config;
pub mod error;
pub mod types;

pub use config::{HoldConfig, OutpostConfig, SchedulerConfig, Settings};
pub use error::{OutpostError, Result};
pub use types::{Party, PlayerId, Position, TeamId, Timestamp};

//! Objective management - owning outposts, scheduling cycles and driving ticks

pub mod driver;
pub mod registry;
pub mod scheduler;

pub use driver::{OutpostDriver, SharedWorld, WorldView};
pub use registry::OutpostRegistry;
pub use scheduler::{ObjectiveScheduler, ScheduleAction};

//! Contested Outposts - capture-point objectives with charge, contest decay and overtime

pub mod core;
pub mod hooks;
pub mod objective;
pub mod outpost;

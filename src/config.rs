//! Configuration helpers shared by the CLI and the scheduler.

pub mod duration;

pub use duration::parse_duration;

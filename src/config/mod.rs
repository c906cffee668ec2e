//! Command-line argument helpers.

pub mod duration;

pub use duration::parse_duration;

//! Configuration helpers for the sign-sync CLI

pub mod duration;

pub use duration::parse_duration;

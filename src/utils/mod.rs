//! Shared utilities
//!
//! - Bus address formatting and parsing
//! - Wall-clock helpers

pub mod address;
pub mod time;

pub use address::BusAddress;
pub use time::now_ms;

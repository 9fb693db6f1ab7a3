//! Onewire Ports: typed port model for devices on a shared 1-Wire style bus
//!
//! This crate models each readable or switchable quantity of a bus device as
//! a port: a thermometer reading, a discrete input line, or a relay output.
//! All kinds share one lifecycle so a scan loop can poll, refresh, check
//! staleness and apply staged relay writes without knowing device details.
//!
//! Bus transport, scan scheduling and event delivery are supplied by the
//! host. Ports receive their notification sink at construction; see
//! [`api::PortEventSink`] and the channel-backed [`api::FlumeEventSink`].
//!
//! The public modules re-export the main APIs through [`api`]. The internal
//! layers are kept in hidden modules to keep implementation details out of
//! the generated documentation.

pub mod api;
#[doc(hidden)]
pub mod core;
#[doc(hidden)]
pub mod protocol;
#[doc(hidden)]
pub mod utils;

pub use api::*;

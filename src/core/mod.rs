/// Collaborators that own and observe ports
///
/// This module contains the pieces around the port model that a host
/// application wires together:
/// - Channel-backed event delivery
/// - The registry holding one shared instance per port
/// - Timing and construction configuration
///
/// Bus transport and scan scheduling stay with the host.
pub mod bus;
pub mod config;
pub mod registry;

// Re-export commonly used types
pub use bus::{FlumeEventSink, FlumeSinkControl};
pub use config::{PortDescriptor, PortSetConfig, PortTiming};
pub use registry::{PortRegistry, SharedPort};

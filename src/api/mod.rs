pub mod events;

pub use events::{no_op_sink, LoggingSink, NoOpSink, PortEvent, PortEventSink};

// Re-export the port model and its collaborators as the public surface
pub use crate::core::{
    FlumeEventSink, FlumeSinkControl, PortDescriptor, PortRegistry, PortSetConfig, PortTiming,
    SharedPort,
};
pub use crate::protocol::port::{
    AddressedPort, BinaryInput, BinaryInputPort, DevicePort, DeviceValue, Port, PortCapabilities,
    PortError, PortId, PortValue, Relay, RelayPort, Temperature, TemperaturePort, ValueKind,
};
pub use crate::utils::{now_ms, BusAddress};

//! Port entity model
//!
//! A port is one typed, addressable quantity on a bus device. The layering is
//! by composition: [`Port`] holds identity, capabilities, staleness and the
//! pending write slot; [`AddressedPort`] adds the bus address and the
//! last-update clock; [`DevicePort`] tags the concrete device kinds.

pub mod addressed;
pub mod capabilities;
pub mod device;
pub mod error;
pub mod generic;
pub mod value;

pub use addressed::AddressedPort;
pub use capabilities::PortCapabilities;
pub use device::{BinaryInputPort, DevicePort, RelayPort, TemperaturePort};
pub use error::PortError;
pub use generic::{Port, PortId};
pub use value::{BinaryInput, DeviceValue, PortValue, Relay, Temperature, ValueKind};

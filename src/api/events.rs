/// Change notification for ports
///
/// Ports do not know how notifications travel. Each port receives an
/// `Arc<dyn PortEventSink>` at construction and hands every applied change to
/// it. Delivery, fan-out and ordering belong to the sink implementation.
///
/// The channel-backed default implementation lives in `core::bus`.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::protocol::port::{DeviceValue, PortId};

/// Emitted after `update` or an applying `commit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortEvent {
    pub port: PortId,
    pub value: DeviceValue,
}

impl PortEvent {
    pub fn new(port: PortId, value: DeviceValue) -> Self {
        Self { port, value }
    }

    /// Compact binary form for forwarding over IPC.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).context("Failed to encode port event")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).context("Failed to decode port event")
    }
}

/// Receiver of port change notifications.
///
/// An error returned here is logged by the port and otherwise ignored; the
/// state change that produced the event is never rolled back.
pub trait PortEventSink: Send + Sync {
    fn port_updated(&self, event: &PortEvent) -> Result<()>;
}

/// Sink that drops every event (useful for testing)
pub struct NoOpSink;

impl PortEventSink for NoOpSink {
    fn port_updated(&self, _event: &PortEvent) -> Result<()> {
        Ok(())
    }
}

/// Sink that logs every event
pub struct LoggingSink;

impl PortEventSink for LoggingSink {
    fn port_updated(&self, event: &PortEvent) -> Result<()> {
        log::info!("Port update: port={}, value={}", event.port, event.value);
        Ok(())
    }
}

pub fn no_op_sink() -> Arc<dyn PortEventSink> {
    Arc::new(NoOpSink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::port::{PortValue, Temperature};

    #[test]
    fn test_event_bytes_roundtrip() -> Result<()> {
        let event = PortEvent::new(
            PortId::new("onewire", "adapter-0", "28-0001"),
            Temperature::from_celsius(21.5).into_device_value(),
        );

        let bytes = event.to_bytes()?;
        assert!(!bytes.is_empty());
        assert_eq!(PortEvent::from_bytes(&bytes)?, event);
        Ok(())
    }

    #[test]
    fn test_event_json_shape() -> Result<()> {
        let event = PortEvent::new(
            PortId::new("onewire", "adapter-0", "3A-0001:1"),
            crate::protocol::port::Relay::ON.into_device_value(),
        );

        let json = serde_json::to_value(&event)?;
        assert_eq!(json["port"]["port_id"], "3A-0001:1");
        assert_eq!(json["value"]["relay"], true);
        Ok(())
    }

    #[test]
    fn test_logging_and_no_op_sinks_accept_events() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let event = PortEvent::new(
            PortId::new("onewire", "adapter-0", "28-0002"),
            Temperature::from_celsius(-4.0).into_device_value(),
        );

        LoggingSink.port_updated(&event)?;
        no_op_sink().port_updated(&event)?;
        Ok(())
    }
}

use std::sync::Arc;

use super::{
    capabilities::PortCapabilities,
    error::PortError,
    generic::{Port, PortId},
    value::PortValue,
};
use crate::{api::events::PortEventSink, core::config::PortTiming, utils::BusAddress};

/// A port bound to a physical device address on the bus.
///
/// Keeps two clocks: `last_seen_ms` on the inner [`Port`] tracks bus-level
/// reachability, `last_update_ms` tracks when a reading last entered the port.
#[derive(Debug)]
pub struct AddressedPort<V: PortValue> {
    port: Port<V>,
    address: BusAddress,
    last_update_ms: i64,
}

impl<V: PortValue> AddressedPort<V> {
    pub fn new(
        id: PortId,
        capabilities: PortCapabilities,
        timing: &PortTiming,
        address: BusAddress,
        value: V,
        last_seen_ms: i64,
        sink: Arc<dyn PortEventSink>,
    ) -> Self {
        Self {
            port: Port::new(
                id,
                capabilities,
                timing.stale_timeout_ms(),
                value,
                last_seen_ms,
                sink,
            ),
            address,
            last_update_ms: crate::utils::now_ms(),
        }
    }

    pub fn address(&self) -> &BusAddress {
        &self.address
    }

    pub fn last_update_ms(&self) -> i64 {
        self.last_update_ms
    }

    /// Read-only view of the shared base record.
    pub fn port(&self) -> &Port<V> {
        &self.port
    }

    pub fn id(&self) -> &PortId {
        self.port.id()
    }

    pub fn read(&self) -> V {
        self.port.read()
    }

    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        self.port.touch_last_seen(timestamp_ms);
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.port.is_stale(now_ms)
    }

    /// Stores the reading and stamps `last_update_ms` with `now_ms`.
    pub fn update(&mut self, now_ms: i64, value: V) {
        self.last_update_ms = now_ms;
        self.port.update(now_ms, value);
    }

    pub fn request_write(&mut self, value: V) -> Result<(), PortError> {
        self.port.request_write(value)
    }

    pub fn requested(&self) -> Option<&V> {
        self.port.requested()
    }

    pub fn reset(&mut self) -> Result<Option<V>, PortError> {
        self.port.reset()
    }

    pub fn commit(&mut self) -> Result<bool, PortError> {
        self.port.commit()
    }
}

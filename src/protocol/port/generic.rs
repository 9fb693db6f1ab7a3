use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use super::{
    capabilities::PortCapabilities,
    error::PortError,
    value::{PortValue, ValueKind},
};
use crate::api::events::{PortEvent, PortEventSink};

/// Identity of a port, unique within the owning system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId {
    pub factory_id: String,
    pub adapter_id: String,
    pub port_id: String,
}

impl PortId {
    pub fn new(
        factory_id: impl Into<String>,
        adapter_id: impl Into<String>,
        port_id: impl Into<String>,
    ) -> Self {
        Self {
            factory_id: factory_id.into(),
            adapter_id: adapter_id.into(),
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.factory_id, self.adapter_id, self.port_id)
    }
}

/// Base record shared by every port kind.
///
/// `value` changes only through [`Port::update`] and [`Port::commit`]. A
/// staged write sits in the pending slot until `commit` moves it into `value`
/// in the same `&mut self` call, so no caller holding the port can observe a
/// half-applied commit.
pub struct Port<V: PortValue> {
    id: PortId,
    capabilities: PortCapabilities,
    stale_timeout_ms: i64,
    last_seen_ms: i64,
    value: V,
    requested: Option<V>,
    sink: Arc<dyn PortEventSink>,
}

impl<V: PortValue> fmt::Debug for Port<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("stale_timeout_ms", &self.stale_timeout_ms)
            .field("last_seen_ms", &self.last_seen_ms)
            .field("value", &self.value)
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

impl<V: PortValue> Port<V> {
    pub fn new(
        id: PortId,
        capabilities: PortCapabilities,
        stale_timeout_ms: i64,
        value: V,
        last_seen_ms: i64,
        sink: Arc<dyn PortEventSink>,
    ) -> Self {
        Self {
            id,
            capabilities,
            stale_timeout_ms,
            last_seen_ms,
            value,
            requested: None,
            sink,
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn capabilities(&self) -> PortCapabilities {
        self.capabilities
    }

    pub fn kind(&self) -> ValueKind {
        V::KIND
    }

    pub fn stale_timeout_ms(&self) -> i64 {
        self.stale_timeout_ms
    }

    pub fn last_seen_ms(&self) -> i64 {
        self.last_seen_ms
    }

    /// Current value. Staleness is not consulted.
    pub fn read(&self) -> V {
        self.value.clone()
    }

    /// Records that the device answered on the bus at `timestamp_ms`.
    ///
    /// Out-of-order timestamps are stored as given; ordering is the scan
    /// loop's responsibility.
    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        self.last_seen_ms = timestamp_ms;
    }

    /// `true` once more than the staleness timeout has passed since the device
    /// was last seen. Exactly at the boundary the port is still fresh.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_seen_ms) > self.stale_timeout_ms
    }

    /// Stores a value observed on the bus and notifies the sink.
    ///
    /// Reachability is a separate signal, so `last_seen_ms` is left alone.
    pub fn update(&mut self, _now_ms: i64, value: V) {
        log::debug!("port {} updated: {} -> {}", self.id, self.value, value);
        self.value = value;
        self.notify();
    }

    /// Stages `value` for the next [`Port::commit`]. A value already staged is
    /// replaced.
    pub fn request_write(&mut self, value: V) -> Result<(), PortError> {
        self.ensure_writable("request a write")?;
        if let Some(previous) = &self.requested {
            log::debug!(
                "port {} replaces staged write {} with {}",
                self.id,
                previous,
                value
            );
        } else {
            log::debug!("port {} staged write {}", self.id, value);
        }
        self.requested = Some(value);
        Ok(())
    }

    pub fn requested(&self) -> Option<&V> {
        self.requested.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.requested.is_some()
    }

    /// Drops the staged write without applying it and returns it.
    pub fn reset(&mut self) -> Result<Option<V>, PortError> {
        self.ensure_writable("reset a staged write")?;
        Ok(self.requested.take())
    }

    /// Moves the staged write into `value` and clears the pending slot.
    ///
    /// Returns `Ok(false)` without touching `value` or notifying when nothing
    /// is staged.
    pub fn commit(&mut self) -> Result<bool, PortError> {
        self.ensure_writable("commit")?;
        let Some(value) = self.requested.take() else {
            return Ok(false);
        };

        log::debug!("port {} committed: {} -> {}", self.id, self.value, value);
        self.value = value;
        self.notify();
        Ok(true)
    }

    pub(crate) fn ensure_writable(&self, operation: &'static str) -> Result<(), PortError> {
        if self.capabilities.can_write {
            return Ok(());
        }
        log::warn!("port {} is read-only, refusing to {}", self.id, operation);
        Err(PortError::CapabilityViolation {
            port_id: self.id.clone(),
            operation,
        })
    }

    fn notify(&self) {
        let event = PortEvent::new(self.id.clone(), self.value.clone().into_device_value());
        if let Err(err) = self.sink.port_updated(&event) {
            log::warn!("port {}: failed to deliver update event: {err:#}", self.id);
        }
    }
}

//! Port registry
//!
//! Holds the single authoritative instance of every port. The scan loop and
//! the command path share a port through its `Arc<RwLock<DevicePort>>`; the
//! per-port write lock is what serialises `update`, `request_write` and
//! `commit` on the same instance.
//!
//! Lock order is registry first, then port. Never call back into the registry
//! while holding a port guard.

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

use super::config::PortSetConfig;
use crate::{
    api::events::PortEventSink,
    protocol::port::{DevicePort, PortError, PortId},
};

pub type SharedPort = Arc<RwLock<DevicePort>>;

#[derive(Default)]
struct Ports {
    order: Vec<PortId>,
    map: HashMap<PortId, SharedPort>,
}

#[derive(Default)]
pub struct PortRegistry {
    ports: RwLock<Ports>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every port listed in `config`, all reporting to `sink`.
    pub fn from_config(
        config: &PortSetConfig,
        sink: Arc<dyn PortEventSink>,
    ) -> Result<Self, PortError> {
        let registry = Self::new();
        for descriptor in &config.ports {
            let port = DevicePort::from_descriptor(descriptor, &config.timing, Arc::clone(&sink))?;
            registry.insert(port)?;
        }
        Ok(registry)
    }

    /// Takes ownership of a freshly constructed port.
    ///
    /// Rejects a second port with the same id, and a port that repeats the
    /// bus address and channel of another port on the same adapter.
    pub fn insert(&self, port: DevicePort) -> Result<SharedPort, PortError> {
        let mut ports = self.ports.write();
        let id = port.id().clone();

        if ports.map.contains_key(&id) {
            return Err(PortError::DuplicatePort { port_id: id });
        }

        let conflict = ports.map.iter().find_map(|(existing_id, existing)| {
            let existing = existing.read();
            let same_channel = existing_id.factory_id == id.factory_id
                && existing_id.adapter_id == id.adapter_id
                && existing.address() == port.address()
                && existing.channel() == port.channel();
            same_channel.then(|| existing_id.clone())
        });
        if let Some(existing) = conflict {
            log::warn!("port {id} conflicts with {existing} on address {}", port.address());
            return Err(PortError::AddressConflict {
                port_id: id,
                existing,
            });
        }

        log::info!("registered {} port {id} at {}", port.kind(), port.address());
        let shared = Arc::new(RwLock::new(port));
        ports.order.push(id.clone());
        ports.map.insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, id: &PortId) -> Option<SharedPort> {
        self.ports.read().map.get(id).cloned()
    }

    pub fn require(&self, id: &PortId) -> Result<SharedPort, PortError> {
        self.get(id).ok_or_else(|| PortError::UnknownPort {
            port_id: id.clone(),
        })
    }

    /// Drops a port whose device is no longer discoverable.
    pub fn remove(&self, id: &PortId) -> Result<SharedPort, PortError> {
        let mut ports = self.ports.write();
        let removed = ports.map.remove(id).ok_or_else(|| PortError::UnknownPort {
            port_id: id.clone(),
        })?;
        ports.order.retain(|existing| existing != id);
        log::info!("removed port {id}");
        Ok(removed)
    }

    /// Port ids in registration order.
    pub fn ids(&self) -> Vec<PortId> {
        self.ports.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.ports.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.read().map.is_empty()
    }

    pub fn stale_ports(&self, now_ms: i64) -> Vec<PortId> {
        self.each(|id, port| port.read().is_stale(now_ms).then(|| id.clone()))
    }

    /// Commits the staged write of every writable port and returns the ids
    /// that applied one. Meant to be called once per scan cycle, inside the
    /// scan loop's bus write window.
    pub fn commit_all(&self) -> Vec<PortId> {
        self.each(|id, port| {
            let mut port = port.write();
            if !port.is_writable() {
                return None;
            }
            match port.commit() {
                Ok(applied) => applied.then(|| id.clone()),
                Err(err) => {
                    log::warn!("commit failed on {id}: {err}");
                    None
                }
            }
        })
    }

    fn each<F>(&self, mut f: F) -> Vec<PortId>
    where
        F: FnMut(&PortId, &SharedPort) -> Option<PortId>,
    {
        let ports = self.ports.read();
        ports
            .order
            .iter()
            .filter_map(|id| ports.map.get(id).and_then(|port| f(id, port)))
            .collect()
    }
}

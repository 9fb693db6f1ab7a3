/// Channel-backed event sink
///
/// The default [`PortEventSink`] implementation: every event is pushed into
/// a flume channel and consumers (UI, automation rules, persistence) read
/// from the receiving side on their own schedule.
use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::api::events::{PortEvent, PortEventSink};

/// Flume-based sink that forwards port events through a channel
pub struct FlumeEventSink {
    sender: flume::Sender<PortEvent>,
    running: Arc<AtomicBool>,
}

impl FlumeEventSink {
    /// Create a new flume sink with an unbounded channel
    pub fn new() -> (Self, flume::Receiver<PortEvent>) {
        let (sender, receiver) = flume::unbounded();
        (Self::with_sender(sender), receiver)
    }

    /// Create a new flume sink with a bounded channel
    ///
    /// A full channel is reported as a delivery failure instead of blocking
    /// the caller.
    pub fn with_capacity(cap: usize) -> (Self, flume::Receiver<PortEvent>) {
        let (sender, receiver) = flume::bounded(cap);
        (Self::with_sender(sender), receiver)
    }

    fn with_sender(sender: flume::Sender<PortEvent>) -> Self {
        Self {
            sender,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stop forwarding; later events are dropped
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get a handle to control this sink
    pub fn get_control_handle(&self) -> FlumeSinkControl {
        FlumeSinkControl {
            running: Arc::clone(&self.running),
        }
    }
}

impl PortEventSink for FlumeEventSink {
    fn port_updated(&self, event: &PortEvent) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.sender.try_send(event.clone()).map_err(|err| match err {
            flume::TrySendError::Full(_) => anyhow::anyhow!("Failed to send port event: channel full"),
            flume::TrySendError::Disconnected(_) => {
                anyhow::anyhow!("Failed to send port event: receiver dropped")
            }
        })
    }
}

/// Control handle for [`FlumeEventSink`]
///
/// Allows external code to mute the sink once it has been handed to ports
pub struct FlumeSinkControl {
    running: Arc<AtomicBool>,
}

impl FlumeSinkControl {
    /// Request the sink to stop forwarding
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the sink is still forwarding
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Concrete device ports and the tagged enum the scan loop works with
///
/// Each variant wraps an [`AddressedPort`] of its own value type and adds
/// the fields its device needs (a PIO channel for multi-channel devices).
/// Code that does not care about the device kind matches on [`DevicePort`]
/// and passes values as [`DeviceValue`].
use derive_more::From;
use std::sync::Arc;

use super::{
    addressed::AddressedPort,
    capabilities::PortCapabilities,
    error::PortError,
    generic::PortId,
    value::{BinaryInput, DeviceValue, PortValue, Relay, Temperature, ValueKind},
};
use crate::{
    api::events::PortEventSink,
    core::config::{PortDescriptor, PortTiming},
    utils::BusAddress,
};

fn decode_error(id: &PortId, reason: String) -> PortError {
    PortError::Decode {
        port_id: id.clone(),
        reason,
    }
}

/// Read-only thermometer port.
#[derive(Debug)]
pub struct TemperaturePort {
    inner: AddressedPort<Temperature>,
}

impl TemperaturePort {
    pub fn new(
        id: PortId,
        timing: &PortTiming,
        address: BusAddress,
        value: Temperature,
        last_seen_ms: i64,
        sink: Arc<dyn PortEventSink>,
    ) -> Self {
        Self {
            inner: AddressedPort::new(
                id,
                PortCapabilities::READ_ONLY,
                timing,
                address,
                value,
                last_seen_ms,
                sink,
            ),
        }
    }

    pub fn port(&self) -> &AddressedPort<Temperature> {
        &self.inner
    }

    pub fn read(&self) -> Temperature {
        self.inner.read()
    }

    pub fn update(&mut self, now_ms: i64, value: Temperature) {
        self.inner.update(now_ms, value);
    }

    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        self.inner.touch_last_seen(timestamp_ms);
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.inner.is_stale(now_ms)
    }

    pub fn decode(&self, raw: &[u8]) -> Result<Temperature, PortError> {
        Temperature::decode(raw).map_err(|reason| decode_error(self.inner.id(), reason))
    }
}

/// Read-only discrete input on one channel of a multi-channel device.
#[derive(Debug)]
pub struct BinaryInputPort {
    inner: AddressedPort<BinaryInput>,
    channel: u8,
}

impl BinaryInputPort {
    pub fn new(
        id: PortId,
        timing: &PortTiming,
        channel: u8,
        address: BusAddress,
        value: BinaryInput,
        last_seen_ms: i64,
        sink: Arc<dyn PortEventSink>,
    ) -> Self {
        Self {
            inner: AddressedPort::new(
                id,
                PortCapabilities::READ_ONLY,
                timing,
                address,
                value,
                last_seen_ms,
                sink,
            ),
            channel,
        }
    }

    pub fn port(&self) -> &AddressedPort<BinaryInput> {
        &self.inner
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn read(&self) -> BinaryInput {
        self.inner.read()
    }

    pub fn update(&mut self, now_ms: i64, value: BinaryInput) {
        self.inner.update(now_ms, value);
    }

    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        self.inner.touch_last_seen(timestamp_ms);
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.inner.is_stale(now_ms)
    }

    pub fn decode(&self, raw: &[u8]) -> Result<BinaryInput, PortError> {
        BinaryInput::decode(raw, self.channel)
            .map_err(|reason| decode_error(self.inner.id(), reason))
    }
}

/// Relay output on one channel. Writes go through the staged-write/commit
/// protocol: [`RelayPort::request_write`] stages, [`RelayPort::commit`] applies.
#[derive(Debug)]
pub struct RelayPort {
    inner: AddressedPort<Relay>,
    channel: u8,
}

impl RelayPort {
    pub fn new(
        id: PortId,
        timing: &PortTiming,
        channel: u8,
        address: BusAddress,
        value: Relay,
        last_seen_ms: i64,
        sink: Arc<dyn PortEventSink>,
    ) -> Self {
        Self {
            inner: AddressedPort::new(
                id,
                PortCapabilities::READ_WRITE,
                timing,
                address,
                value,
                last_seen_ms,
                sink,
            ),
            channel,
        }
    }

    pub fn port(&self) -> &AddressedPort<Relay> {
        &self.inner
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn read(&self) -> Relay {
        self.inner.read()
    }

    pub fn update(&mut self, now_ms: i64, value: Relay) {
        self.inner.update(now_ms, value);
    }

    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        self.inner.touch_last_seen(timestamp_ms);
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        self.inner.is_stale(now_ms)
    }

    pub fn decode(&self, raw: &[u8]) -> Result<Relay, PortError> {
        Relay::decode(raw, self.channel).map_err(|reason| decode_error(self.inner.id(), reason))
    }

    pub fn request_write(&mut self, value: Relay) -> Result<(), PortError> {
        self.inner.request_write(value)
    }

    pub fn requested(&self) -> Option<Relay> {
        self.inner.requested().copied()
    }

    pub fn reset(&mut self) -> Result<Option<Relay>, PortError> {
        self.inner.reset()
    }

    /// Applies the staged state, if any. `Ok(false)` means nothing was staged.
    pub fn commit(&mut self) -> Result<bool, PortError> {
        self.inner.commit()
    }
}

/// Any device port.
#[derive(Debug, From)]
pub enum DevicePort {
    Temperature(TemperaturePort),
    BinaryInput(BinaryInputPort),
    Relay(RelayPort),
}

macro_rules! each_port {
    ($port:expr, $p:ident => $body:expr) => {
        match $port {
            DevicePort::Temperature($p) => $body,
            DevicePort::BinaryInput($p) => $body,
            DevicePort::Relay($p) => $body,
        }
    };
}

/// Unwraps a kind-erased value for a port expecting `V`.
fn typed<V: PortValue>(id: &PortId, value: DeviceValue) -> Result<V, PortError> {
    V::from_device_value(value).map_err(|other| PortError::ValueKindMismatch {
        port_id: id.clone(),
        expected: V::KIND,
        actual: other.kind(),
    })
}

impl DevicePort {
    /// Builds the port named by `descriptor.kind`, seeded with `descriptor.initial`.
    pub fn from_descriptor(
        descriptor: &PortDescriptor,
        timing: &PortTiming,
        sink: Arc<dyn PortEventSink>,
    ) -> Result<Self, PortError> {
        let id = descriptor.id();
        if descriptor.kind != descriptor.initial.kind() {
            return Err(PortError::ValueKindMismatch {
                port_id: id,
                expected: descriptor.kind,
                actual: descriptor.initial.kind(),
            });
        }
        let address = descriptor.address.clone();
        let last_seen_ms = descriptor.last_seen_ms;
        let channel = descriptor.channel;

        let port = match descriptor.initial {
            DeviceValue::Temperature(value) => {
                TemperaturePort::new(id, timing, address, value, last_seen_ms, sink).into()
            }
            DeviceValue::BinaryInput(value) => {
                BinaryInputPort::new(id, timing, channel, address, value, last_seen_ms, sink)
                    .into()
            }
            DeviceValue::Relay(value) => {
                RelayPort::new(id, timing, channel, address, value, last_seen_ms, sink).into()
            }
        };
        Ok(port)
    }

    pub fn id(&self) -> &PortId {
        each_port!(self, p => p.inner.id())
    }

    pub fn kind(&self) -> ValueKind {
        each_port!(self, p => p.inner.port().kind())
    }

    pub fn capabilities(&self) -> PortCapabilities {
        each_port!(self, p => p.inner.port().capabilities())
    }

    pub fn is_writable(&self) -> bool {
        self.capabilities().can_write
    }

    pub fn address(&self) -> &BusAddress {
        each_port!(self, p => p.inner.address())
    }

    /// PIO channel, for the device kinds that have one.
    pub fn channel(&self) -> Option<u8> {
        match self {
            DevicePort::Temperature(_) => None,
            DevicePort::BinaryInput(p) => Some(p.channel),
            DevicePort::Relay(p) => Some(p.channel),
        }
    }

    pub fn stale_timeout_ms(&self) -> i64 {
        each_port!(self, p => p.inner.port().stale_timeout_ms())
    }

    pub fn last_seen_ms(&self) -> i64 {
        each_port!(self, p => p.inner.port().last_seen_ms())
    }

    pub fn last_update_ms(&self) -> i64 {
        each_port!(self, p => p.inner.last_update_ms())
    }

    pub fn read(&self) -> DeviceValue {
        each_port!(self, p => p.inner.read().into_device_value())
    }

    pub fn touch_last_seen(&mut self, timestamp_ms: i64) {
        each_port!(self, p => p.inner.touch_last_seen(timestamp_ms))
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        each_port!(self, p => p.inner.is_stale(now_ms))
    }

    /// Applies a reading. Fails without mutation when `value` is of another kind.
    pub fn update(&mut self, now_ms: i64, value: DeviceValue) -> Result<(), PortError> {
        each_port!(self, p => {
            let value = typed(p.inner.id(), value)?;
            p.inner.update(now_ms, value);
            Ok(())
        })
    }

    /// Decodes raw bus bytes with the variant's decoder and applies the result.
    pub fn decode_and_update(&mut self, now_ms: i64, raw: &[u8]) -> Result<DeviceValue, PortError> {
        each_port!(self, p => {
            let value = p.decode(raw)?;
            p.inner.update(now_ms, value);
            Ok(value.into_device_value())
        })
    }

    /// Stages a write. Read-only ports fail with a capability violation before
    /// the value kind is looked at.
    pub fn request_write(&mut self, value: DeviceValue) -> Result<(), PortError> {
        each_port!(self, p => {
            p.inner.port().ensure_writable("request a write")?;
            let value = typed(p.inner.id(), value)?;
            p.inner.request_write(value)
        })
    }

    pub fn requested(&self) -> Option<DeviceValue> {
        each_port!(self, p => p.inner.requested().map(|v| v.into_device_value()))
    }

    pub fn reset(&mut self) -> Result<Option<DeviceValue>, PortError> {
        each_port!(self, p => Ok(p.inner.reset()?.map(PortValue::into_device_value)))
    }

    pub fn commit(&mut self) -> Result<bool, PortError> {
        each_port!(self, p => p.inner.commit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::events::no_op_sink, core::bus::FlumeEventSink};

    fn relay(sink: Arc<dyn PortEventSink>) -> DevicePort {
        RelayPort::new(
            PortId::new("onewire", "adapter-0", "29-0001:1"),
            &PortTiming::default(),
            1,
            BusAddress::new([0x29, 0x00, 0x01]),
            Relay::OFF,
            1000,
            sink,
        )
        .into()
    }

    fn thermometer() -> DevicePort {
        TemperaturePort::new(
            PortId::new("onewire", "adapter-0", "28-0001"),
            &PortTiming::default(),
            BusAddress::new([0x28, 0x00, 0x01]),
            Temperature::from_celsius(21.5),
            1000,
            no_op_sink(),
        )
        .into()
    }

    #[test]
    fn test_update_rejects_wrong_kind() {
        let mut port = relay(no_op_sink());
        port.update(2000, Relay::ON.into_device_value()).unwrap();
        let before = port.last_update_ms();

        let err = port
            .update(3000, BinaryInput::HIGH.into_device_value())
            .unwrap_err();
        assert_eq!(
            err,
            PortError::ValueKindMismatch {
                port_id: port.id().clone(),
                expected: ValueKind::Relay,
                actual: ValueKind::BinaryInput,
            }
        );
        assert_eq!(port.read(), DeviceValue::Relay(Relay::ON));
        assert_eq!(port.last_update_ms(), before);
    }

    #[test]
    fn test_read_only_capability_checked_before_kind() {
        let mut port = thermometer();
        let err = port
            .request_write(Relay::ON.into_device_value())
            .unwrap_err();
        assert!(err.is_capability_violation());
        assert!(port.commit().unwrap_err().is_capability_violation());
        assert_eq!(port.channel(), None);
        assert!(!port.is_writable());
    }

    #[test]
    fn test_decode_and_update() {
        let (sink, receiver) = FlumeEventSink::new();
        let mut port = relay(Arc::new(sink));

        let value = port.decode_and_update(5000, &[0b0000_0010]).unwrap();
        assert_eq!(value, DeviceValue::Relay(Relay::ON));
        assert_eq!(port.last_update_ms(), 5000);
        assert_eq!(receiver.try_recv().unwrap().value, value);

        let err = port.decode_and_update(6000, &[]).unwrap_err();
        assert!(matches!(err, PortError::Decode { .. }));
        assert_eq!(port.read(), value);
        assert_eq!(port.last_update_ms(), 5000);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_decode_temperature() {
        let mut port = thermometer();
        let value = port.decode_and_update(1500, &[0x50, 0x01]).unwrap();
        assert_eq!(value, DeviceValue::Temperature(Temperature::from_celsius(21.0)));
    }

    #[test]
    fn test_from_descriptor_picks_variant() {
        let descriptor = PortDescriptor {
            factory_id: "onewire".to_string(),
            adapter_id: "adapter-0".to_string(),
            port_id: "12-0001:4".to_string(),
            kind: ValueKind::BinaryInput,
            address: BusAddress::new([0x12, 0x00, 0x01]),
            channel: 4,
            initial: BinaryInput::LOW.into_device_value(),
            last_seen_ms: 1234,
        };

        let port =
            DevicePort::from_descriptor(&descriptor, &PortTiming::default(), no_op_sink())
                .unwrap();
        assert!(matches!(port, DevicePort::BinaryInput(_)));
        assert_eq!(port.channel(), Some(4));
        assert_eq!(port.last_seen_ms(), 1234);
        assert_eq!(port.stale_timeout_ms(), 1010);
        assert_eq!(port.id(), &descriptor.id());
    }

    #[test]
    fn test_from_descriptor_rejects_kind_mismatch() {
        let descriptor = PortDescriptor {
            factory_id: "onewire".to_string(),
            adapter_id: "adapter-0".to_string(),
            port_id: "29-0001:0".to_string(),
            kind: ValueKind::Relay,
            address: BusAddress::new([0x29, 0x00, 0x01]),
            channel: 0,
            initial: Temperature::from_celsius(21.0).into_device_value(),
            last_seen_ms: 1234,
        };

        let err = DevicePort::from_descriptor(&descriptor, &PortTiming::default(), no_op_sink())
            .unwrap_err();
        assert_eq!(
            err,
            PortError::ValueKindMismatch {
                port_id: descriptor.id(),
                expected: ValueKind::Relay,
                actual: ValueKind::Temperature,
            }
        );
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;

/// Tag naming the value type a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Temperature,
    BinaryInput,
    Relay,
}

/// A typed value held by a port.
pub trait PortValue:
    Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const KIND: ValueKind;

    /// Numeric view used by consumers that only deal with decimals (charts, rules).
    fn as_decimal(&self) -> f64;

    fn into_device_value(self) -> DeviceValue;

    /// Returns the value back unchanged when it is of another kind.
    fn from_device_value(value: DeviceValue) -> Result<Self, DeviceValue>;
}

/// Temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    /// Resolution of a 12-bit bus thermometer reading.
    const STEP_CELSIUS: f64 = 1.0 / 16.0;

    pub const fn from_celsius(celsius: f64) -> Self {
        Self(celsius)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Decodes the first two bytes of a thermometer scratchpad: a little-endian
    /// signed count of 1/16 °C steps.
    pub fn decode(raw: &[u8]) -> Result<Self, String> {
        match raw {
            [lsb, msb, ..] => {
                let count = i16::from_le_bytes([*lsb, *msb]);
                Ok(Self(f64::from(count) * Self::STEP_CELSIUS))
            }
            _ => Err(format!("need 2 bytes, got {}", raw.len())),
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.0)
    }
}

impl PortValue for Temperature {
    const KIND: ValueKind = ValueKind::Temperature;

    fn as_decimal(&self) -> f64 {
        self.0
    }

    fn into_device_value(self) -> DeviceValue {
        DeviceValue::Temperature(self)
    }

    fn from_device_value(value: DeviceValue) -> Result<Self, DeviceValue> {
        match value {
            DeviceValue::Temperature(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Reads bit `channel` of a PIO state byte.
fn pio_bit(raw: &[u8], channel: u8) -> Result<bool, String> {
    if channel >= 8 {
        return Err(format!("channel {channel} is outside the 8-bit PIO register"));
    }
    let state = raw
        .first()
        .ok_or_else(|| "PIO state byte missing".to_string())?;
    Ok(state & (1 << channel) != 0)
}

/// Level of a discrete input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryInput(bool);

impl BinaryInput {
    pub const HIGH: Self = Self(true);
    pub const LOW: Self = Self(false);

    pub const fn new(high: bool) -> Self {
        Self(high)
    }

    pub fn is_high(&self) -> bool {
        self.0
    }

    pub fn decode(raw: &[u8], channel: u8) -> Result<Self, String> {
        pio_bit(raw, channel).map(Self)
    }
}

impl fmt::Display for BinaryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "HIGH" } else { "LOW" })
    }
}

impl PortValue for BinaryInput {
    const KIND: ValueKind = ValueKind::BinaryInput;

    fn as_decimal(&self) -> f64 {
        if self.0 {
            1.0
        } else {
            0.0
        }
    }

    fn into_device_value(self) -> DeviceValue {
        DeviceValue::BinaryInput(self)
    }

    fn from_device_value(value: DeviceValue) -> Result<Self, DeviceValue> {
        match value {
            DeviceValue::BinaryInput(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Switching state of a relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relay(bool);

impl Relay {
    pub const ON: Self = Self(true);
    pub const OFF: Self = Self(false);

    pub const fn new(on: bool) -> Self {
        Self(on)
    }

    pub fn is_on(&self) -> bool {
        self.0
    }

    pub fn decode(raw: &[u8], channel: u8) -> Result<Self, String> {
        pio_bit(raw, channel).map(Self)
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "ON" } else { "OFF" })
    }
}

impl PortValue for Relay {
    const KIND: ValueKind = ValueKind::Relay;

    fn as_decimal(&self) -> f64 {
        if self.0 {
            1.0
        } else {
            0.0
        }
    }

    fn into_device_value(self) -> DeviceValue {
        DeviceValue::Relay(self)
    }

    fn from_device_value(value: DeviceValue) -> Result<Self, DeviceValue> {
        match value {
            DeviceValue::Relay(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Kind-erased value, used where ports of every kind are handled together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceValue {
    Temperature(Temperature),
    BinaryInput(BinaryInput),
    Relay(Relay),
}

impl DeviceValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DeviceValue::Temperature(_) => ValueKind::Temperature,
            DeviceValue::BinaryInput(_) => ValueKind::BinaryInput,
            DeviceValue::Relay(_) => ValueKind::Relay,
        }
    }

    pub fn as_decimal(&self) -> f64 {
        match self {
            DeviceValue::Temperature(v) => v.as_decimal(),
            DeviceValue::BinaryInput(v) => v.as_decimal(),
            DeviceValue::Relay(v) => v.as_decimal(),
        }
    }
}

impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceValue::Temperature(v) => fmt::Display::fmt(v, f),
            DeviceValue::BinaryInput(v) => fmt::Display::fmt(v, f),
            DeviceValue::Relay(v) => fmt::Display::fmt(v, f),
        }
    }
}

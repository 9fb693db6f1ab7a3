//! Bus address helpers

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Raw byte sequence identifying a device on the bus (family code first).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusAddress(Vec<u8>);

impl BusAddress {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// First byte of the address, naming the device family on 1-Wire buses.
    pub fn family_code(&self) -> Option<u8> {
        self.0.first().copied()
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(anyhow!("Bus address is empty"));
        }
        if hex.len() % 2 != 0 {
            return Err(anyhow!("Bus address '{}' has an odd number of digits", hex));
        }

        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| anyhow!("Bus address '{}' is not valid hex", hex))
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BusAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for BusAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BusAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_format_and_parse() -> Result<()> {
        let address = BusAddress::new([0x28, 0x01, 0xAB, 0x00]);
        assert_eq!(address.to_string(), "2801AB00");
        assert_eq!(address.family_code(), Some(0x28));
        assert_eq!("2801ab00".parse::<BusAddress>()?, address);
        Ok(())
    }

    #[test]
    fn test_rejects_malformed_hex() {
        assert!(BusAddress::from_hex("").is_err());
        assert!(BusAddress::from_hex("280").is_err());
        assert!(BusAddress::from_hex("28ZZ").is_err());
        assert!(BusAddress::from_hex("28é").is_err());
    }

    #[test]
    fn test_serde_as_hex_string() -> Result<()> {
        let address = BusAddress::new([0x3A, 0x10]);
        let json = serde_json::to_string(&address)?;
        assert_eq!(json, "\"3A10\"");
        assert_eq!(serde_json::from_str::<BusAddress>(&json)?, address);
        Ok(())
    }
}

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    protocol::port::{DeviceValue, PortId, ValueKind},
    utils::BusAddress,
};

/// Staleness timing applied to ports at construction.
///
/// The timeout is `base_ms + margin_ms`: a short base for the bus round trip
/// plus a margin on the scale of one scan interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortTiming {
    pub base_ms: i64,
    pub margin_ms: i64,
}

impl Default for PortTiming {
    fn default() -> Self {
        Self {
            base_ms: 10,
            margin_ms: 1000,
        }
    }
}

impl PortTiming {
    /// Saturates instead of overflowing; [`PortTiming::validate`] rejects
    /// timings that would need it.
    pub fn stale_timeout_ms(&self) -> i64 {
        self.base_ms.saturating_add(self.margin_ms)
    }

    /// Rejects negative parts and a sum that does not fit in `i64`.
    pub fn validate(&self) -> Result<()> {
        if self.base_ms < 0 || self.margin_ms < 0 {
            return Err(anyhow!(
                "Port timing must not be negative (base_ms={}, margin_ms={})",
                self.base_ms,
                self.margin_ms
            ));
        }
        self.base_ms.checked_add(self.margin_ms).ok_or_else(|| {
            anyhow!(
                "Port timing overflows (base_ms={}, margin_ms={})",
                self.base_ms,
                self.margin_ms
            )
        })?;
        Ok(())
    }
}

/// Construction inputs for one port, as supplied by discovery or restore.
///
/// `kind` names the port to build; `initial` must carry a value of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub factory_id: String,
    pub adapter_id: String,
    pub port_id: String,
    pub kind: ValueKind,
    pub address: BusAddress,
    /// Ignored by temperature ports
    #[serde(default)]
    pub channel: u8,
    pub initial: DeviceValue,
    pub last_seen_ms: i64,
}

impl PortDescriptor {
    pub fn id(&self) -> PortId {
        PortId::new(&self.factory_id, &self.adapter_id, &self.port_id)
    }
}

/// Root configuration: timing plus the ports to construct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortSetConfig {
    #[serde(default)]
    pub timing: PortTiming,
    #[serde(default)]
    pub ports: Vec<PortDescriptor>,
}

impl PortSetConfig {
    /// Parse configuration from a JSON string
    ///
    /// The timing is validated before the configuration is returned.
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json_str).context("Failed to parse port configuration")?;
        config.timing.validate()?;
        Ok(config)
    }

    /// Read configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize port configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::port::{PortValue, Relay, Temperature};

    #[test]
    fn test_default_timing() {
        assert_eq!(PortTiming::default().stale_timeout_ms(), 1010);
    }

    #[test]
    fn test_config_serialization() -> Result<()> {
        let config = PortSetConfig {
            timing: PortTiming {
                base_ms: 10,
                margin_ms: 5000,
            },
            ports: vec![
                PortDescriptor {
                    factory_id: "onewire".to_string(),
                    adapter_id: "adapter-0".to_string(),
                    port_id: "28-0001".to_string(),
                    kind: ValueKind::Temperature,
                    address: BusAddress::new([0x28, 0x00, 0x01]),
                    channel: 0,
                    initial: Temperature::from_celsius(21.5).into_device_value(),
                    last_seen_ms: 1000,
                },
                PortDescriptor {
                    factory_id: "onewire".to_string(),
                    adapter_id: "adapter-0".to_string(),
                    port_id: "29-0002:3".to_string(),
                    kind: ValueKind::Relay,
                    address: BusAddress::new([0x29, 0x00, 0x02]),
                    channel: 3,
                    initial: Relay::OFF.into_device_value(),
                    last_seen_ms: 1000,
                },
            ],
        };

        let json = config.to_json()?;
        let parsed = PortSetConfig::from_json(&json)?;
        assert_eq!(parsed, config);
        assert_eq!(parsed.timing.stale_timeout_ms(), 5010);
        assert_eq!(parsed.ports[1].id().port_id, "29-0002:3");
        Ok(())
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() -> Result<()> {
        let parsed = PortSetConfig::from_json(r#"{ "timing": { "margin_ms": 2000 } }"#)?;
        assert_eq!(parsed.timing.base_ms, 10);
        assert_eq!(parsed.timing.stale_timeout_ms(), 2010);
        assert!(parsed.ports.is_empty());

        let parsed = PortSetConfig::from_json(
            r#"{ "ports": [ {
                "factory_id": "onewire", "adapter_id": "a", "port_id": "12-01",
                "kind": "binary_input", "address": "1201", "initial": { "binary_input": true }, "last_seen_ms": 7
            } ] }"#,
        )?;
        assert_eq!(parsed.ports[0].channel, 0);
        assert_eq!(parsed.ports[0].address.as_bytes(), &[0x12, 0x01]);
        Ok(())
    }

    #[test]
    fn test_timing_validation() {
        assert!(PortTiming::default().validate().is_ok());

        let overflowing = PortTiming {
            base_ms: i64::MAX,
            margin_ms: 1000,
        };
        assert!(overflowing.validate().is_err());
        assert_eq!(overflowing.stale_timeout_ms(), i64::MAX);

        let negative = PortTiming {
            base_ms: 10,
            margin_ms: -1,
        };
        assert!(negative.validate().is_err());

        let err = PortSetConfig::from_json(&format!(
            r#"{{ "timing": {{ "base_ms": {}, "margin_ms": 1000 }} }}"#,
            i64::MAX
        ))
        .unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert!(PortSetConfig::from_json(r#"{ "timing": { "base_ms": -5 } }"#).is_err());
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!(
            "onewire_ports_config_{}.json",
            std::process::id()
        ));
        let config = PortSetConfig {
            timing: PortTiming {
                base_ms: 10,
                margin_ms: 3000,
            },
            ports: Vec::new(),
        };
        std::fs::write(&path, config.to_json()?)?;
        let loaded = PortSetConfig::from_file(&path);
        std::fs::remove_file(&path)?;
        assert_eq!(loaded?, config);

        let err = PortSetConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
        Ok(())
    }
}

use derive_more::{Display, Error};

use super::{generic::PortId, value::ValueKind};

/// Errors raised synchronously by port operations and the registry.
///
/// A failing call never leaves a port partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum PortError {
    /// Write request, commit or reset on a port declared read-only.
    #[display("port {port_id} cannot {operation}: write capability missing")]
    CapabilityViolation {
        port_id: PortId,
        operation: &'static str,
    },
    #[display("port {port_id} expects a {expected} value, got {actual}")]
    ValueKindMismatch {
        port_id: PortId,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[display("port {port_id}: cannot decode bus data ({reason})")]
    Decode { port_id: PortId, reason: String },
    #[display("port {port_id} is already registered")]
    DuplicatePort { port_id: PortId },
    #[display("port {port_id} shares its bus address and channel with {existing}")]
    AddressConflict { port_id: PortId, existing: PortId },
    #[display("port {port_id} is not registered")]
    UnknownPort { port_id: PortId },
}

impl PortError {
    pub fn port_id(&self) -> &PortId {
        match self {
            PortError::CapabilityViolation { port_id, .. }
            | PortError::ValueKindMismatch { port_id, .. }
            | PortError::Decode { port_id, .. }
            | PortError::DuplicatePort { port_id }
            | PortError::AddressConflict { port_id, .. }
            | PortError::UnknownPort { port_id } => port_id,
        }
    }

    pub fn is_capability_violation(&self) -> bool {
        matches!(self, PortError::CapabilityViolation { .. })
    }
}

use serde::{Deserialize, Serialize};

/// Declares which directions a port supports. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortCapabilities {
    pub can_read: bool,
    pub can_write: bool,
}

impl PortCapabilities {
    pub const READ_ONLY: Self = Self::new(true, false);
    pub const READ_WRITE: Self = Self::new(true, true);

    pub const fn new(can_read: bool, can_write: bool) -> Self {
        Self {
            can_read,
            can_write,
        }
    }
}

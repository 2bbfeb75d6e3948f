//! # Presence
//!
//! Presence entries advertise which devices of a wallet are reachable and
//! in which role. Only the lookup side is modelled here.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// Role a device announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Master,
    Full,
    Relay,
    Client,
    Worker,
}

impl NodeType {
    /// Single-character wire code.
    pub fn code(self) -> char {
        match self {
            Self::Master => 'M',
            Self::Full => 'H',
            Self::Relay => 'R',
            Self::Client => 'C',
            Self::Worker => 'W',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(Self::Master),
            'H' => Some(Self::Full),
            'R' => Some(Self::Relay),
            'C' => Some(Self::Client),
            'W' => Some(Self::Worker),
            _ => None,
        }
    }

    /// Roles that validate blocks and relay consensus traffic.
    pub fn is_validator(self) -> bool {
        matches!(self, Self::Master | Self::Full)
    }
}

/// A single device entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceAddress {
    pub device_id: Vec<u8>,
    pub node_type: NodeType,
    pub last_seen: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub wallet: Address,
    pub pub_key: Vec<u8>,
    pub addresses: Vec<PresenceAddress>,
}

impl Presence {
    pub fn device(&self, device_id: &[u8]) -> Option<&PresenceAddress> {
        self.addresses.iter().find(|a| a.device_id == device_id)
    }

    pub fn has_validator_device(&self) -> bool {
        self.addresses.iter().any(|a| a.node_type.is_validator())
    }
}

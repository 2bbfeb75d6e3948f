//! # Protocol Message Codes
//!
//! Codes of the peer messages the consensus core sends and consumes. The
//! transport that frames and delivers them is out of scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Peer message codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ProtocolMessageCode {
    NewTransaction = 1,
    TransactionData = 2,
    GetTransaction = 3,
    GetTransactions = 4,
    TransactionsChunk = 5,
    BlockData = 10,
    GetBlock = 11,
    BlockSignature = 12,
    BlockSignatures = 13,
    GetBlockSignatures = 14,
    SignaturesChunk = 15,
    GetKeepAlives = 20,
    KeepAlivesChunk = 21,
    GetPresence = 22,
    Inventory = 30,
}

impl ProtocolMessageCode {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::NewTransaction,
            2 => Self::TransactionData,
            3 => Self::GetTransaction,
            4 => Self::GetTransactions,
            5 => Self::TransactionsChunk,
            10 => Self::BlockData,
            11 => Self::GetBlock,
            12 => Self::BlockSignature,
            13 => Self::BlockSignatures,
            14 => Self::GetBlockSignatures,
            15 => Self::SignaturesChunk,
            20 => Self::GetKeepAlives,
            21 => Self::KeepAlivesChunk,
            22 => Self::GetPresence,
            30 => Self::Inventory,
            _ => return None,
        })
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ProtocolMessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Opaque identifier of a connected peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointId(pub String);

impl EndpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

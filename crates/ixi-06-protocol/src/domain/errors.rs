//! Error types for the protocol handlers.

use ixi_04_inventory::InventoryError;
use ixi_05_signature_freeze::FreezeError;
use shared_types::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown message code {0}")]
    UnknownCode(u16),

    #[error("Message of {size} bytes exceeds limit {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Request carries {count} items, limit {max}")]
    TooManyItems { count: usize, max: usize },

    #[error("Malformed payload: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Freeze(#[from] FreezeError),
}

impl ProtocolError {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownCode(_) => "unknown_code",
            Self::MessageTooLarge { .. } => "too_large",
            Self::TooManyItems { .. } => "too_many_items",
            Self::Codec(_) => "malformed",
            Self::Inventory(_) => "inventory",
            Self::Freeze(e) => e.reason(),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

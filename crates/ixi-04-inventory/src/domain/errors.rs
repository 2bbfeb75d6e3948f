//! Error types for the inventory subsystem.

use shared_types::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Malformed inventory: {0}")]
    Codec(#[from] CodecError),

    #[error("Inventory carries {count} items, limit {max}")]
    TooManyItems { count: usize, max: usize },
}

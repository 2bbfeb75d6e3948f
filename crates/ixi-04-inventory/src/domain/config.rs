//! Inventory configuration.

/// Inventory cache and dispatch limits.
#[derive(Clone, Debug)]
pub struct InventoryConfig {
    pub block_capacity: usize,
    pub signature_capacity: usize,
    pub transaction_capacity: usize,
    pub keepalive_capacity: usize,
    /// Minimum interval between two requests for the same item.
    pub throttle_ms: u64,
    /// Attempts before an unprocessed item is dropped.
    pub max_retries: u32,
    /// Upper bound of an encoded `Inventory` chunk in bytes.
    pub max_message_size: usize,
    /// Items per `Inventory` chunk and per batched request.
    pub max_items_per_chunk: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            block_capacity: 100,
            signature_capacity: 200_000,
            transaction_capacity: 600_000,
            keepalive_capacity: 600_000,
            throttle_ms: 10_000,
            max_retries: 5,
            max_message_size: 3 * 1024 * 1024, // 3 MB
            max_items_per_chunk: 500,
        }
    }
}

impl InventoryConfig {
    /// Small capacities for tests.
    pub fn for_testing() -> Self {
        Self {
            block_capacity: 4,
            signature_capacity: 8,
            transaction_capacity: 8,
            keepalive_capacity: 8,
            throttle_ms: 1_000,
            max_retries: 3,
            max_message_size: 4 * 1024,
            max_items_per_chunk: 16,
        }
    }
}

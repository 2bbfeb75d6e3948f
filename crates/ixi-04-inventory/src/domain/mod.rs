//! # Domain Layer - Inventory
//!
//! - `config`: capacities, throttle and chunk limits
//! - `cache`: per-type LRU of announced items
//! - `chunking`: `Inventory` message framing
//! - `errors`: `InventoryError`

pub mod cache;
pub mod chunking;
pub mod config;
pub mod errors;

pub use cache::{Announcement, DueItems, InventoryCache, InventoryEntry};
pub use chunking::{decode_inventory, encode_inventory_chunks};
pub use config::InventoryConfig;
pub use errors::InventoryError;

/// Result of handling one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Nothing left to fetch; the item is marked processed.
    Done,
    /// A request for the content was sent or batched.
    Requested,
    /// Not actionable yet; retried by `process_cache`.
    Waiting,
}

/// Summary of one `Inventory` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryReport {
    pub received: usize,
    pub new: usize,
    pub duplicates: usize,
    pub done: usize,
    pub requested: usize,
    pub waiting: usize,
}

/// Summary of one `process_cache` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheReport {
    pub retried: usize,
    pub completed: usize,
    pub dropped: usize,
}

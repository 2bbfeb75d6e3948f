//! # Inbound Port - InventoryApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `process_inventory` | `Inventory` message handler |
//! | `mark_processed` | Handlers that received the content itself |
//! | `broadcast_inventory` | Components announcing content they accepted |
//! | `process_cache` | Runtime maintenance loop |

use crate::domain::{CacheReport, InventoryReport};
use shared_types::{EndpointId, InventoryItem, NodeType};

pub trait InventoryApi: Send + Sync {
    /// Classifies announced items and requests the ones not held locally.
    fn process_inventory(
        &self,
        endpoint: &EndpointId,
        items: Vec<InventoryItem>,
    ) -> InventoryReport;

    /// Records that the content behind `item` is now held.
    fn mark_processed(&self, item: &InventoryItem) -> bool;

    /// Announces held content to peers of `node_types`. Returns the number
    /// of `Inventory` messages sent.
    fn broadcast_inventory(
        &self,
        items: &[InventoryItem],
        node_types: &[NodeType],
        skip: Option<&EndpointId>,
    ) -> usize;

    /// Retries unprocessed items whose throttle interval elapsed.
    fn process_cache(&self) -> CacheReport;
}

//! # Inventory Cache
//!
//! One bounded LRU per item type, keyed by the item's content hash.
//! Lookups use `peek`, so an entry's position only reflects when it was
//! first announced: a full bucket drops its oldest announcement.
//!
//! ```text
//! announce ──→ New ──handle──→ Requested / Waiting ──retry──→ ... ──→ dropped
//!               │                      │
//!               └──────Done────────────┴──content arrives──→ processed
//! ```

use super::config::InventoryConfig;
use lru::LruCache;
use shared_types::{EndpointId, InventoryItem, InventoryItemType, Timestamp};
use std::num::NonZeroUsize;

/// Cached state of one announced item.
#[derive(Clone, Debug)]
pub struct InventoryEntry {
    pub item: InventoryItem,
    pub processed: bool,
    pub last_requested: Option<Timestamp>,
    /// Peers that announced the item, in announcement order.
    pub endpoints: Vec<EndpointId>,
    pub retries: u32,
}

impl InventoryEntry {
    fn announced(item: InventoryItem, endpoint: EndpointId) -> Self {
        Self {
            item,
            processed: false,
            last_requested: None,
            endpoints: vec![endpoint],
            retries: 0,
        }
    }

    fn processed(item: InventoryItem) -> Self {
        Self {
            item,
            processed: true,
            last_requested: None,
            endpoints: Vec::new(),
            retries: 0,
        }
    }
}

/// What an announcement meant to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    /// First time seen; the caller should handle it now.
    New,
    /// Already pending; the announcer was added as a fallback source.
    Known,
    /// Content already held.
    Processed,
}

/// Items whose retry interval elapsed.
#[derive(Debug, Default)]
pub struct DueItems {
    /// Item and the endpoint to ask this time.
    pub items: Vec<(InventoryItem, EndpointId)>,
    /// Items that ran out of retries and were evicted.
    pub dropped: usize,
}

type Bucket = LruCache<Vec<u8>, InventoryEntry>;

fn bucket(capacity: usize) -> Bucket {
    LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
}

pub struct InventoryCache {
    keepalives: Bucket,
    transactions: Bucket,
    signatures: Bucket,
    blocks: Bucket,
}

impl InventoryCache {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            keepalives: bucket(config.keepalive_capacity),
            transactions: bucket(config.transaction_capacity),
            signatures: bucket(config.signature_capacity),
            blocks: bucket(config.block_capacity),
        }
    }

    fn bucket(&self, item_type: InventoryItemType) -> &Bucket {
        match item_type {
            InventoryItemType::KeepAlive => &self.keepalives,
            InventoryItemType::Transaction => &self.transactions,
            InventoryItemType::BlockSignature => &self.signatures,
            InventoryItemType::Block => &self.blocks,
        }
    }

    fn bucket_mut(&mut self, item_type: InventoryItemType) -> &mut Bucket {
        match item_type {
            InventoryItemType::KeepAlive => &mut self.keepalives,
            InventoryItemType::Transaction => &mut self.transactions,
            InventoryItemType::BlockSignature => &mut self.signatures,
            InventoryItemType::Block => &mut self.blocks,
        }
    }

    /// Records that `endpoint` announced `item`.
    pub fn announce(&mut self, item: InventoryItem, endpoint: &EndpointId) -> Announcement {
        let key = item.hash();
        let bucket = self.bucket_mut(item.item_type());
        if let Some(entry) = bucket.peek_mut(&key) {
            if entry.processed {
                return Announcement::Processed;
            }
            if !entry.endpoints.contains(endpoint) {
                entry.endpoints.push(endpoint.clone());
            }
            return Announcement::Known;
        }
        bucket.push(key, InventoryEntry::announced(item, endpoint.clone()));
        Announcement::New
    }

    /// Marks the item's content as held. Returns false if it already was.
    pub fn mark_processed(&mut self, item: &InventoryItem) -> bool {
        let key = item.hash();
        let bucket = self.bucket_mut(item.item_type());
        match bucket.peek_mut(&key) {
            Some(entry) if entry.processed => false,
            Some(entry) => {
                entry.processed = true;
                true
            }
            None => {
                bucket.push(key, InventoryEntry::processed(item.clone()));
                true
            }
        }
    }

    /// Counts one request attempt for the item.
    pub fn record_attempt(&mut self, item: &InventoryItem, now: Timestamp) {
        if let Some(entry) = self.bucket_mut(item.item_type()).peek_mut(&item.hash()) {
            entry.last_requested = Some(now);
            entry.retries += 1;
        }
    }

    pub fn get(&self, item: &InventoryItem) -> Option<&InventoryEntry> {
        self.bucket(item.item_type()).peek(&item.hash())
    }

    pub fn is_processed(&self, item: &InventoryItem) -> bool {
        self.get(item).is_some_and(|entry| entry.processed)
    }

    /// Collects unprocessed items not requested within `throttle_ms`.
    ///
    /// Each returned item counts as an attempt and names the next announcer
    /// in rotation. Items that already used `max_retries` attempts are evicted.
    pub fn collect_due(&mut self, now: Timestamp, throttle_ms: u64, max_retries: u32) -> DueItems {
        let mut due = DueItems::default();
        for item_type in InventoryItemType::ALL {
            let bucket = self.bucket_mut(item_type);
            let mut expired = Vec::new();
            for (key, entry) in bucket.iter_mut() {
                if entry.processed {
                    continue;
                }
                if entry
                    .last_requested
                    .is_some_and(|last| now.saturating_sub(last) < throttle_ms)
                {
                    continue;
                }
                if entry.retries >= max_retries || entry.endpoints.is_empty() {
                    expired.push(key.clone());
                    continue;
                }
                let slot = entry.retries as usize % entry.endpoints.len();
                let endpoint = entry.endpoints[slot].clone();
                entry.last_requested = Some(now);
                entry.retries += 1;
                due.items.push((entry.item.clone(), endpoint));
            }
            due.dropped += expired.len();
            for key in expired {
                bucket.pop(&key);
            }
        }
        due
    }

    pub fn len(&self, item_type: InventoryItemType) -> usize {
        self.bucket(item_type).len()
    }

    pub fn total_len(&self) -> usize {
        InventoryItemType::ALL.iter().map(|t| self.len(*t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn clear(&mut self) {
        for item_type in InventoryItemType::ALL {
            self.bucket_mut(item_type).clear();
        }
    }
}

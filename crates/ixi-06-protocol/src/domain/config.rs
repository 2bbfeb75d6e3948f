//! Protocol handler configuration.

#[derive(Clone, Debug)]
pub struct ProtocolConfig {
    /// Inbound payloads above this size are dropped undecoded.
    pub max_message_size: usize,
    /// Ids, keepalives or inventory items a single request may carry.
    pub max_request_items: usize,
    /// Transactions per `TransactionsChunk` reply.
    pub max_items_per_chunk: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_message_size: 10 * 1024 * 1024, // 10 MB
            max_request_items: 500,
            max_items_per_chunk: 500,
        }
    }
}

impl ProtocolConfig {
    pub fn for_testing() -> Self {
        Self {
            max_message_size: 64 * 1024,
            max_request_items: 8,
            max_items_per_chunk: 2,
        }
    }
}

//! Signature-freeze configuration.

use shared_types::NodeType;

#[derive(Clone, Debug)]
pub struct FreezeConfig {
    /// Floor of the signature count a block needs to be accepted.
    pub min_block_signatures: usize,
    /// Share of the previous block's effective signatures a block needs.
    pub required_signature_percent: u64,
    /// Candidate lock wait before a request is dropped.
    pub lock_timeout_ms: u64,
    /// Role of this node; masters re-broadcast accepted signatures.
    pub node_type: NodeType,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            min_block_signatures: 3,
            required_signature_percent: 75,
            lock_timeout_ms: 1_000,
            node_type: NodeType::Full,
        }
    }
}

impl FreezeConfig {
    pub fn for_testing() -> Self {
        Self {
            min_block_signatures: 2,
            lock_timeout_ms: 50,
            node_type: NodeType::Master,
            ..Default::default()
        }
    }
}

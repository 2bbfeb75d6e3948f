//! # Adapters
//!
//! Runtime implementations of collaborator ports that have no in-memory
//! counterpart in `shared_types::in_memory`.

pub mod network;

pub use network::{ChannelNetwork, OutboundMessage, OutboundTarget};

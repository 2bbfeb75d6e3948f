//! # Ports Layer
//!
//! - `inbound`: [`InventoryApi`] driven by the protocol handlers
//! - `outbound`: lookups the handlers consult before requesting content

pub mod inbound;
pub mod outbound;

pub use inbound::InventoryApi;
pub use outbound::{SignatureLookup, TransactionLookup};

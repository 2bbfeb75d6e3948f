//! # Ports Layer
//!
//! The handler is driven by the transport through [`ProtocolApi`] and
//! drives the pool, inventory and signature-freeze inbound ports.

pub mod inbound;

pub use inbound::ProtocolApi;

//! # Ports Layer
//!
//! The coordinator drives the transaction pool through its
//! `TransactionPoolApi` and the chain, wallet, presence and network ports
//! of `shared_types`. Its own inbound port is [`SignatureFreezeApi`].

pub mod inbound;

pub use inbound::SignatureFreezeApi;

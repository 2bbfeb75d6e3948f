//! # Ixian Node Test Suite
//!
//! Cross-subsystem scenarios driven through the protocol handler of fully
//! wired nodes, the same way a peer would drive them.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # TestNode: container + in-memory collaborators
//! └── integration/      # Scenarios spanning pool, freeze, inventory, protocol
//!     ├── transfers.rs
//!     ├── multisig.rs
//!     ├── rewards.rs
//!     └── sync.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ixi-tests
//! cargo test -p ixi-tests integration::sync::
//! ```

#![allow(dead_code)]

#[cfg(test)]
pub mod harness;
pub mod integration;

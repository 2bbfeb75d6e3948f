//! # Runtime Wiring
//!
//! Long-running tasks that drive the subsystems:
//!
//! | Task | Drives |
//! |------|--------|
//! | [`MaintenanceLoop`] | pool cleanup, pending re-broadcast, inventory retries, candidate acceptance |
//! | [`InboundDispatcher`] | decoded transport frames into the protocol handlers |
//!
//! Both stop when the shared `watch` shutdown flag flips to `true`.

pub mod inbound;
pub mod maintenance;

pub use inbound::{InboundDispatcher, InboundMessage};
pub use maintenance::{MaintenanceLoop, MaintenanceReport};

//! # Adapters Layer
//!
//! In-process implementations of the pool-owned outbound ports.

pub mod activity;
pub mod events;

pub use activity::InMemoryActivityLog;
pub use events::{NoOpEvents, RecordedEvent, RecordingEvents, TracingEvents};
pub use shared_types::in_memory::ManualTimeSource;

//! # Node Container
//!
//! Central container holding the subsystem instances with their
//! collaborator adapters wired in.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, RuntimeConfig};
pub use subsystems::{NodeContainer, NodeCollaborators};

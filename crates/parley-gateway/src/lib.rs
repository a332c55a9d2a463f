//! Local staging endpoint for profile payloads.
//!
//! The dialogue agent's webhook posts its tool invocation here; the
//! extraction pipeline reads the last one back. Storage is a single slot
//! that lives as long as the process.

pub mod config;
pub mod server;
pub mod store;

pub use config::ServerConfig;
pub use server::{staged_record, AppState, Forwarder, StagingServer};
pub use store::StagingStore;

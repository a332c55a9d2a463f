//! Clients for the remote collaborators: the local staging endpoint and the
//! workflow backend's session registry.
//!
//! Every lookup goes through [`RemoteClient`], which validates the HTTP
//! response and unwraps the `{success, message?, data?}` envelope.

pub mod client;
pub mod config;
pub mod registry;
pub mod staging;

pub use client::RemoteClient;
pub use config::RemoteConfig;
pub use registry::{HttpSessionRegistry, SessionRegistration, SessionRegistry};
pub use staging::{HttpStagingClient, NoStaging, StagingSource};

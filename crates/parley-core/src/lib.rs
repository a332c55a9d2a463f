//! Core types and error definitions for Parley.
//!
//! This crate provides the foundational types shared across all Parley crates:
//! the error taxonomy, the profile record recovered from a conversation, the
//! transcript turn, the session identifier and the `{success, message, data}`
//! envelope every remote collaborator speaks.
//!
//! # Main types
//!
//! - [`ParleyError`]: Unified error enum for all Parley subsystems.
//! - [`ParleyResult`]: Convenience alias for `Result<T, ParleyError>`.
//! - [`ProfileRecord`]: The structured profile the dialogue agent produces.
//! - [`TranscriptTurn`]: One spoken (or typed) turn of the conversation.
//! - [`SessionId`]: Opaque identifier allocated on every session start.
//! - [`Envelope`]: The wrapper used by every remote JSON response.

/// Fixed strings shared with the dialogue agent's configuration.
pub mod contract;
/// Remote response envelope.
pub mod envelope;
/// Error taxonomy.
pub mod error;
/// Profile record and its lenient decoding.
pub mod profile;
/// Session identifiers.
pub mod session_id;
/// Transcript turn types.
pub mod transcript;

pub use contract::{PROFILE_TOOL_NAME, SUMMARY_END, SUMMARY_START};
pub use envelope::Envelope;
pub use error::{MalformedKind, ParleyError, ParleyResult};
pub use profile::{ProfileRecord, SENTINEL};
pub use session_id::SessionId;
pub use transcript::{Speaker, TranscriptTurn};

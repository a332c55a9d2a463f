//! Session lifecycle for voice conversations with the profile-collecting
//! agent.
//!
//! # Main types
//!
//! - [`SessionController`]: Start, end, mute and typed turns over one live
//!   channel, plus post-session extraction.
//! - [`classify`]: Pure mapping from an inbound event to its effects.
//! - [`ProfileSlot`]: The current session's resolved record, first write
//!   wins.
//! - [`TranscriptRecorder`]: Ordered turns of the current session.

pub mod classifier;
pub mod controller;
pub mod session;
pub mod slot;
pub mod transcript;

pub use classifier::{classify, Effect, ResolutionSource};
pub use controller::{ControllerEvent, MicrophoneAccess, SessionController, SessionOutcome};
pub use session::{Session, SessionState};
pub use slot::{CommitOutcome, ProfileSlot};
pub use transcript::TranscriptRecorder;

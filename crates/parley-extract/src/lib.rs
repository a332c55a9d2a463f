//! Profile recovery after a session ends without a tool invocation.
//!
//! [`ExtractionPipeline`] runs five strategies in a fixed order: the
//! session's own cache, the local staging endpoint, transcript heuristics,
//! the session-keyed remote fetch and the latest-record remote fetch. The
//! first found record wins. When all of them miss the run ends in
//! [`ExtractionOutcome::NotFound`], which is an outcome rather than an error.

pub mod config;
pub mod heuristics;
pub mod pipeline;
pub mod strategy;

pub use config::ExtractionConfig;
pub use pipeline::{
    AttemptOutcome, ExtractionAttempt, ExtractionOutcome, ExtractionPipeline, ExtractionReport,
    RetryAffordance, NOT_FOUND_MESSAGE,
};
pub use strategy::{ExtractionContext, ExtractionStrategy, RecordCache, StrategyKind};

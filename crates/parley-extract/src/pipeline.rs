use crate::config::ExtractionConfig;
use crate::strategy::{
    CacheCheck, ExtractionContext, ExtractionStrategy, LatestFetch, LocalStaging, SessionFetch,
    StrategyKind, TranscriptHeuristics,
};
use parley_core::{ParleyError, ProfileRecord, SessionId};
use parley_remote::{SessionRegistry, StagingSource};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when every strategy missed.
pub const NOT_FOUND_MESSAGE: &str = "No user data found in conversation. \
The agent may not have completed the data collection process.";

/// What one strategy produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { record: Box<ProfileRecord> },
    Miss,
    Error { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionAttempt {
    pub strategy: StrategyKind,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// What the user can do after a terminal miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "session_id", rename_all = "snake_case")]
pub enum RetryAffordance {
    /// Re-run the session-keyed remote fetch for this id.
    SessionFetch(SessionId),
    Disabled,
}

/// Terminal result of a pipeline run. A miss is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Found {
        strategy: StrategyKind,
        record: Box<ProfileRecord>,
    },
    NotFound {
        message: String,
        retry: RetryAffordance,
    },
}

impl ExtractionOutcome {
    pub fn record(&self) -> Option<&ProfileRecord> {
        match self {
            ExtractionOutcome::Found { record, .. } => Some(record),
            ExtractionOutcome::NotFound { .. } => None,
        }
    }
}

/// Ordered attempt log plus the outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub session_id: Option<SessionId>,
    pub attempts: Vec<ExtractionAttempt>,
    pub outcome: ExtractionOutcome,
}

/// Cascade of recovery strategies run after a session ends without a
/// resolved record.
///
/// Strategies run strictly in order, each fully awaited. The first one to
/// produce a found record wins. An envelope reporting failure is a miss;
/// other errors are logged as such and the cascade moves on.
pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    /// The standard five-step cascade.
    pub fn new(
        staging: Arc<dyn StagingSource>,
        registry: Arc<dyn SessionRegistry>,
        config: ExtractionConfig,
    ) -> Self {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(CacheCheck),
            Box::new(LocalStaging::new(staging)),
            Box::new(TranscriptHeuristics::new(config.transcript_window)),
            Box::new(SessionFetch::new(registry.clone())),
            Box::new(LatestFetch::new(registry)),
        ];
        Self { strategies, config }
    }

    /// A pipeline over an arbitrary strategy list.
    pub fn with_strategies(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        config: ExtractionConfig,
    ) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub async fn run(&self, ctx: &ExtractionContext) -> ExtractionReport {
        let session = ctx
            .session_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        info!(session_id = %session, turns = ctx.transcript.len(), "Extraction started");

        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let outcome = match strategy.attempt(ctx).await {
                Ok(Some(record)) if record.is_found() => {
                    AttemptOutcome::Success { record: Box::new(record) }
                }
                Ok(_) => AttemptOutcome::Miss,
                Err(ParleyError::Envelope { message }) => {
                    debug!(strategy = %kind, message = ?message, "Remote reported no record");
                    AttemptOutcome::Miss
                }
                Err(e) => AttemptOutcome::Error { reason: e.to_string() },
            };

            match &outcome {
                AttemptOutcome::Success { record } => {
                    info!(session_id = %session, strategy = %kind, record_id = %record.id, "Extraction succeeded");
                }
                AttemptOutcome::Miss => {
                    debug!(session_id = %session, strategy = %kind, "Strategy missed");
                }
                AttemptOutcome::Error { reason } => {
                    warn!(session_id = %session, strategy = %kind, error = %reason, "Strategy failed, moving on");
                }
            }

            let found = match &outcome {
                AttemptOutcome::Success { record } => Some(record.clone()),
                _ => None,
            };
            attempts.push(ExtractionAttempt { strategy: kind, outcome });

            if let Some(record) = found {
                return ExtractionReport {
                    session_id: ctx.session_id.clone(),
                    attempts,
                    outcome: ExtractionOutcome::Found { strategy: kind, record },
                };
            }
        }

        let retry = match &ctx.session_id {
            Some(id) => RetryAffordance::SessionFetch(id.clone()),
            None => RetryAffordance::Disabled,
        };
        info!(session_id = %session, attempts = attempts.len(), "Extraction found nothing");

        ExtractionReport {
            session_id: ctx.session_id.clone(),
            attempts,
            outcome: ExtractionOutcome::NotFound {
                message: NOT_FOUND_MESSAGE.to_string(),
                retry,
            },
        }
    }
}

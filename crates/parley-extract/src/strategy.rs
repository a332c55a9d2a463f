use crate::heuristics;
use async_trait::async_trait;
use parley_core::{Envelope, ParleyResult, ProfileRecord, SessionId, TranscriptTurn};
use parley_remote::{SessionRegistry, StagingSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The recovery strategies, in the order the pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CacheCheck,
    LocalStaging,
    TranscriptHeuristics,
    SessionFetch,
    LatestFetch,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            StrategyKind::CacheCheck => "cache_check",
            StrategyKind::LocalStaging => "local_staging",
            StrategyKind::TranscriptHeuristics => "transcript_heuristics",
            StrategyKind::SessionFetch => "session_fetch",
            StrategyKind::LatestFetch => "latest_fetch",
        };
        f.write_str(tag)
    }
}

/// Read access to the record a session has already resolved, if any.
pub trait RecordCache: Send + Sync {
    fn cached(&self, session_id: &SessionId) -> Option<ProfileRecord>;
}

/// Everything a strategy may look at for one pipeline run.
pub struct ExtractionContext {
    pub session_id: Option<SessionId>,
    pub transcript: Vec<TranscriptTurn>,
    pub cache: Arc<dyn RecordCache>,
}

/// One way of recovering the profile record.
///
/// `Ok(None)` is a miss. Errors are also treated as misses by the pipeline;
/// they are only kept for the attempt log.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    async fn attempt(&self, ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>>;
}

/// Decode the envelope's payload into a found record.
pub fn record_from_envelope(envelope: &Envelope) -> Option<ProfileRecord> {
    envelope
        .data
        .as_ref()
        .and_then(ProfileRecord::from_json)
        .filter(ProfileRecord::is_found)
}

pub struct CacheCheck;

#[async_trait]
impl ExtractionStrategy for CacheCheck {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CacheCheck
    }

    async fn attempt(&self, ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>> {
        Ok(ctx
            .session_id
            .as_ref()
            .and_then(|id| ctx.cache.cached(id)))
    }
}

pub struct LocalStaging {
    source: Arc<dyn StagingSource>,
}

impl LocalStaging {
    pub fn new(source: Arc<dyn StagingSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ExtractionStrategy for LocalStaging {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LocalStaging
    }

    async fn attempt(&self, _ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>> {
        let envelope = self.source.fetch_latest().await?;
        Ok(record_from_envelope(&envelope))
    }
}

pub struct TranscriptHeuristics {
    window: usize,
}

impl TranscriptHeuristics {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

#[async_trait]
impl ExtractionStrategy for TranscriptHeuristics {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TranscriptHeuristics
    }

    async fn attempt(&self, ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>> {
        Ok(heuristics::extract_from_transcript(&ctx.transcript, self.window))
    }
}

pub struct SessionFetch {
    registry: Arc<dyn SessionRegistry>,
}

impl SessionFetch {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ExtractionStrategy for SessionFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SessionFetch
    }

    async fn attempt(&self, ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>> {
        let Some(session_id) = &ctx.session_id else {
            return Ok(None);
        };
        let envelope = self.registry.fetch_by_session(session_id).await?;
        Ok(record_from_envelope(&envelope))
    }
}

pub struct LatestFetch {
    registry: Arc<dyn SessionRegistry>,
}

impl LatestFetch {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ExtractionStrategy for LatestFetch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LatestFetch
    }

    async fn attempt(&self, _ctx: &ExtractionContext) -> ParleyResult<Option<ProfileRecord>> {
        let envelope = self.registry.fetch_latest().await?;
        Ok(record_from_envelope(&envelope))
    }
}

//! Request coordination for the external generation engine
//!
//! The engine runs outside this crate. Text changes are debounced, only the
//! most recent request is ever released, and responses carrying an older
//! version are dropped so a slow response can never overwrite newer state.

use std::time::{Duration, Instant};

use keylayout_engine::{Layout, LayoutError, Result, codec};
use serde::{Deserialize, Serialize};

use crate::EditorOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub version: u64,
    pub document: String,
    pub debug: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResponse {
    pub version: u64,
    pub outcome: std::result::Result<serde_json::Value, String>,
}

#[derive(Debug)]
pub struct GenerationCoordinator {
    debounce: Duration,
    latest: u64,
    pending: Option<(GenerationRequest, Instant)>,
}

impl GenerationCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            latest: 0,
            pending: None,
        }
    }

    pub fn from_options(options: &EditorOptions) -> Self {
        Self::new(Duration::from_millis(options.debounce_ms))
    }

    /// Queues a document, replacing any request that has not been released yet.
    /// Returns the version assigned to it.
    pub fn submit(&mut self, document: impl Into<String>, debug: bool, now: Instant) -> u64 {
        self.latest += 1;
        if let Some((old, _)) = self.pending.take() {
            log::debug!("generation request {} superseded by {}", old.version, self.latest);
        }
        self.pending = Some((
            GenerationRequest {
                version: self.latest,
                document: document.into(),
                debug,
            },
            now,
        ));
        self.latest
    }

    /// Serializes `layout` and queues it.
    pub fn submit_layout(&mut self, layout: &Layout, debug: bool, now: Instant) -> Result<u64> {
        let document = codec::serialize(layout)?;
        Ok(self.submit(document, debug, now))
    }

    /// Releases the pending request once it has been quiet for the debounce interval.
    pub fn take_ready(&mut self, now: Instant) -> Option<GenerationRequest> {
        let (_, submitted) = self.pending.as_ref()?;
        if now.saturating_duration_since(*submitted) < self.debounce {
            return None;
        }
        self.pending.take().map(|(request, _)| request)
    }

    /// Result of a response: `Ok(None)` for a stale response, the payload for
    /// the current one, or an `Engine` error if the engine reported a failure.
    pub fn accept(&self, response: GenerationResponse) -> Result<Option<serde_json::Value>> {
        if response.version != self.latest {
            log::warn!("discarding stale generation response {} (latest is {})", response.version, self.latest);
            return Ok(None);
        }
        response.outcome.map(Some).map_err(LayoutError::Engine)
    }

    pub fn latest_version(&self) -> u64 {
        self.latest
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending request becomes ready.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let (_, submitted) = self.pending.as_ref()?;
        Some(self.debounce.saturating_sub(now.saturating_duration_since(*submitted)))
    }
}

impl Default for GenerationCoordinator {
    fn default() -> Self {
        Self::from_options(&EditorOptions::default())
    }
}

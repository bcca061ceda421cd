//! Shared engine state and the per-request context.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditSink, LogAuditSink};
use crate::blob::{BlobStore, FsBlobStore};
use crate::error::LifecycleError;
use crate::import::cache::PreviewCache;
use crate::scope::{resolve_scope, Caller, RoleLookup, Scope};
use crate::types::Config;

/// Long-lived collaborators shared by every request.
pub struct AppState {
    pub config: Config,
    pub audit: Arc<dyn AuditSink>,
    pub blobs: Arc<dyn BlobStore>,
    pub previews: PreviewCache,
}

impl AppState {
    /// Default wiring: log-backed audit sink, filesystem blob store.
    pub fn new(config: Config) -> Self {
        let blobs = Arc::new(FsBlobStore::new(config.blob_root.clone()));
        Self::with_collaborators(config, Arc::new(LogAuditSink), blobs)
    }

    pub fn with_collaborators(
        config: Config,
        audit: Arc<dyn AuditSink>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let previews = PreviewCache::new(Duration::from_secs(config.preview_ttl_secs));
        Self {
            config,
            audit,
            blobs,
            previews,
        }
    }
}

/// Everything a single lifecycle request carries: who is asking, what they
/// may touch, the request clock and a cooperative cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub caller: Caller,
    pub scope: Scope,
    pub now: DateTime<Utc>,
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(caller: Caller, scope: Scope, now: DateTime<Utc>) -> Self {
        Self {
            caller,
            scope,
            now,
            cancel: CancellationToken::new(),
        }
    }

    /// Resolve the caller's scope and build a context stamped at `now`.
    pub fn resolve(
        roles: &dyn RoleLookup,
        config: &Config,
        caller: Caller,
        now: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        let scope = resolve_scope(roles, config.owner_role_level, &caller)?;
        Ok(Self::new(caller, scope, now))
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn actor(&self) -> &str {
        &self.caller.user
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Checked before a write phase begins; never inside a transaction.
    pub fn ensure_not_cancelled(&self) -> Result<(), LifecycleError> {
        if self.cancel.is_cancelled() {
            log::warn!("Request by {} cancelled before writing", self.caller.user);
            Err(LifecycleError::Cancelled)
        } else {
            Ok(())
        }
    }
}

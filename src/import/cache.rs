//! Token-addressed store for import previews awaiting confirmation.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::pipeline::ImportPreview;

struct CachedPreview {
    preview: ImportPreview,
    stored_at: Instant,
}

/// Previews expire `ttl` after they were stored; expiry is checked on read.
pub struct PreviewCache {
    ttl: Duration,
    entries: DashMap<String, CachedPreview>,
}

impl PreviewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store under the preview's own token, replacing any previous entry.
    pub fn insert(&self, preview: ImportPreview) {
        self.entries.insert(
            preview.token.clone(),
            CachedPreview {
                preview,
                stored_at: Instant::now(),
            },
        );
    }

    fn is_expired(&self, entry: &CachedPreview) -> bool {
        entry.stored_at.elapsed() >= self.ttl
    }

    pub fn get(&self, token: &str) -> Option<ImportPreview> {
        {
            // The read guard must be gone before removing from the same shard.
            let entry = self.entries.get(token)?;
            if !self.is_expired(&entry) {
                return Some(entry.preview.clone());
            }
        }
        self.entries.remove(token);
        log::debug!("Import preview {} expired", token);
        None
    }

    /// Remove and return a live preview. A token can be taken once.
    pub fn take(&self, token: &str) -> Option<ImportPreview> {
        let (_, entry) = self.entries.remove(token)?;
        if self.is_expired(&entry) {
            log::debug!("Import preview {} expired before confirmation", token);
            return None;
        }
        Some(entry.preview)
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

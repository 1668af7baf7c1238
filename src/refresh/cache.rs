//! Result cache keyed by refresh-token value.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::AuthResponse;

/// What the cache knows about one refresh token.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResult {
    /// Never requested, evicted, or the last attempt failed.
    Absent,
    /// A request for this key is queued or in flight.
    Pending,
    /// Most recent successful refresh response.
    Resolved(AuthResponse),
}

#[derive(Debug, Default)]
struct Entry {
    resolved: Option<(AuthResponse, Instant)>,
    pending: bool,
    /// Set when the key was invalidated while pending; the pending result
    /// must not be stored.
    discard: bool,
}

impl Entry {
    fn is_fresh(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match (&self.resolved, ttl) {
            (Some(_), None) => true,
            (Some((_, stored_at)), Some(ttl)) => now.saturating_duration_since(*stored_at) < ttl,
            (None, _) => false,
        }
    }
}

/// Refresh responses by refresh-token value.
///
/// A resolved entry takes precedence over a pending mark, so a forced
/// refresh in flight does not hide the previous response from regular
/// callers. Entries never expire unless a TTL is set.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, Entry>,
    ttl: Option<Duration>,
}

impl ResultCache {
    /// Cache whose entries are kept forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose resolved entries expire `ttl` after they were stored.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> CachedResult {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> CachedResult {
        let Some(entry) = self.entries.get(key) else {
            return CachedResult::Absent;
        };
        match &entry.resolved {
            Some((response, _)) if entry.is_fresh(self.ttl, now) => {
                CachedResult::Resolved(response.clone())
            }
            _ if entry.pending => CachedResult::Pending,
            _ => CachedResult::Absent,
        }
    }

    /// Drop expired responses and entries with nothing left to track.
    fn prune_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        if ttl.is_none() {
            return;
        }
        self.entries.retain(|_, entry| {
            if !entry.is_fresh(ttl, now) {
                entry.resolved = None;
            }
            entry.pending || entry.resolved.is_some()
        });
    }

    /// Store a successful response and clear the pending mark.
    ///
    /// Returns false, storing nothing, if the key was invalidated while the
    /// request was pending.
    pub fn put(&mut self, key: &str, response: AuthResponse) -> bool {
        self.put_at(key, response, Instant::now())
    }

    fn put_at(&mut self, key: &str, response: AuthResponse, now: Instant) -> bool {
        self.prune_at(now);
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.pending = false;
        if std::mem::take(&mut entry.discard) {
            if entry.resolved.is_none() {
                self.entries.remove(key);
            }
            return false;
        }
        entry.resolved = Some((response, now));
        true
    }

    pub fn mark_pending(&mut self, key: &str) {
        self.prune_at(Instant::now());
        self.entries.entry(key.to_string()).or_default().pending = true;
    }

    /// Drop the pending mark after a failed attempt. A previously resolved
    /// response, if any, is left untouched.
    pub fn clear_pending(&mut self, key: &str) {
        let remove = match self.entries.get_mut(key) {
            Some(entry) => {
                entry.pending = false;
                entry.discard = false;
                entry.resolved.is_none()
            }
            None => false,
        };
        if remove {
            self.entries.remove(key);
        }
    }

    /// Forget the resolved response for `key`. Returns true if one was cached.
    ///
    /// If a request for the key is pending it keeps running, but its
    /// response will not be stored.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let had_response = entry.resolved.take().is_some();
        if entry.pending {
            entry.discard = true;
        } else {
            self.entries.remove(key);
        }
        had_response
    }

    /// Number of live keys (fresh or pending).
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|entry| entry.pending || entry.is_fresh(self.ttl, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

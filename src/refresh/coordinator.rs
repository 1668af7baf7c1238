//! Single-flight refresh coordinator.
//!
//! Refresh requests are served from the [`ResultCache`] when possible. On a
//! miss the request joins a FIFO queue that one drain task works through,
//! issuing exactly one `/auth/refresh` call at a time. Callers asking for a
//! key that is already queued or in flight are attached to that request and
//! receive its outcome; nothing is enqueued twice.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::cache::{CachedResult, ResultCache};
use super::redact;
use crate::config::{REFRESH_PATH, RefreshConfig};
use crate::error::{Error, Result};
use crate::models::{AuthResponse, RefreshTokenInput, SdkContext};
use crate::net::AuthTransport;

/// Outcome shared by every caller waiting on one key.
type Outcome = std::result::Result<AuthResponse, Arc<Error>>;

#[derive(Debug)]
struct PendingRequest {
    key: String,
    input: RefreshTokenInput,
}

#[derive(Default)]
struct QueueState {
    cache: ResultCache,
    queue: VecDeque<PendingRequest>,
    /// Settlement channels per key, for queued and in-flight requests.
    waiters: HashMap<String, Vec<oneshot::Sender<Outcome>>>,
    /// True while a drain task exists.
    draining: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    transport: Arc<dyn AuthTransport>,
    context: Arc<SdkContext>,
    timeout: Option<Duration>,
}

impl Inner {
    async fn dispatch(&self, input: &RefreshTokenInput) -> Result<AuthResponse> {
        let body = self.context.apply(input)?;
        let call = self.transport.post(REFRESH_PATH, body);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout)?,
            None => call.await,
        }
    }
}

/// Coordinates token refreshes so that at most one refresh call is in
/// flight and every caller for a key shares one outcome.
///
/// Cheap to clone; clones share the cache and queue.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Create a coordinator that sends refreshes through `transport`.
    pub fn new(
        transport: Arc<dyn AuthTransport>,
        context: Arc<SdkContext>,
        config: &RefreshConfig,
    ) -> Self {
        Self::with_limits(transport, context, config.timeout(), config.cache_ttl())
    }

    /// Create a coordinator with an explicit per-call timeout and cache TTL.
    /// `None` disables either bound.
    pub fn with_limits(
        transport: Arc<dyn AuthTransport>,
        context: Arc<SdkContext>,
        timeout: Option<Duration>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        let state = QueueState {
            cache: ResultCache::with_ttl(cache_ttl),
            ..QueueState::default()
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                transport,
                context,
                timeout,
            }),
        }
    }

    /// Refresh `input.refresh_token`, reusing a cached or in-flight result.
    ///
    /// A cached response is returned without suspending. Must be polled
    /// inside a tokio runtime, since a miss may spawn the drain task.
    pub async fn refresh_token(&self, input: RefreshTokenInput) -> Result<AuthResponse> {
        self.submit(input, false).await
    }

    /// Like [`refresh_token`](Self::refresh_token) but skips the cache
    /// lookup. The call still goes through the queue, and a success replaces
    /// the cached response for the key.
    pub async fn force_refresh(&self, input: RefreshTokenInput) -> Result<AuthResponse> {
        self.submit(input, true).await
    }

    /// Current cache state for a refresh token.
    pub fn cached(&self, refresh_token: &str) -> CachedResult {
        self.inner.state.lock().cache.get(refresh_token)
    }

    /// Drop the cached response for a refresh token. Returns true if one
    /// was cached.
    ///
    /// A refresh for the token that is queued or in flight still settles
    /// its callers, but its response is not cached.
    pub fn invalidate(&self, refresh_token: &str) -> bool {
        let removed = self.inner.state.lock().cache.invalidate(refresh_token);
        if removed {
            debug!(token = %redact(refresh_token), "Cached refresh invalidated");
        }
        removed
    }

    /// Requests waiting in the queue, excluding the one in flight.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    async fn submit(&self, input: RefreshTokenInput, force: bool) -> Result<AuthResponse> {
        let key = input.refresh_token.clone();

        let receiver = {
            let mut state = self.inner.state.lock();

            if !force {
                if let CachedResult::Resolved(response) = state.cache.get(&key) {
                    debug!(token = %redact(&key), "Refresh served from cache");
                    return Ok(response);
                }
            }

            let (sender, receiver) = oneshot::channel();
            let waiting = {
                let waiters = state.waiters.entry(key.clone()).or_default();
                waiters.push(sender);
                waiters.len()
            };

            if waiting > 1 {
                debug!(token = %redact(&key), waiting, "Joining pending refresh");
            } else {
                debug!(token = %redact(&key), queued = state.queue.len(), "Queueing refresh");
                state.cache.mark_pending(&key);
                state.queue.push_back(PendingRequest { key, input });
                if !state.draining {
                    state.draining = true;
                    tokio::spawn(drain(Arc::clone(&self.inner)));
                }
            }
            receiver
        };

        match receiver.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(error)) => Err(Error::Refresh(error)),
            Err(_) => Err(Error::RefreshAborted),
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("transport", &self.inner.transport.name())
            .field("cached", &state.cache.len())
            .field("queued", &state.queue.len())
            .field("draining", &state.draining)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// Resets the queue if the drain task unwinds, so waiters see
/// `RefreshAborted` and later submissions start a fresh task.
struct DrainGuard {
    inner: Arc<Inner>,
    finished: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        error!("Refresh drain task aborted; rejecting pending refreshes");
        let mut state = self.inner.state.lock();
        let QueueState {
            cache,
            queue,
            waiters,
            draining,
        } = &mut *state;
        for (key, _) in waiters.drain() {
            cache.clear_pending(&key);
        }
        queue.clear();
        *draining = false;
    }
}

/// Works through the queue one request at a time, then exits.
async fn drain(inner: Arc<Inner>) {
    let mut guard = DrainGuard {
        inner: Arc::clone(&inner),
        finished: false,
    };

    loop {
        let request = {
            let mut state = inner.state.lock();
            match state.queue.pop_front() {
                Some(request) => request,
                None => {
                    state.draining = false;
                    break;
                }
            }
        };

        let token = redact(&request.key);
        debug!(token = %token, "Dispatching refresh");
        let outcome: Outcome = inner.dispatch(&request.input).await.map_err(Arc::new);

        let (waiters, cached) = {
            let mut state = inner.state.lock();
            let cached = match &outcome {
                Ok(response) => state.cache.put(&request.key, response.clone()),
                Err(_) => {
                    state.cache.clear_pending(&request.key);
                    false
                }
            };
            let waiters = state.waiters.remove(&request.key).unwrap_or_default();
            (waiters, cached)
        };

        match &outcome {
            Ok(_) => info!(token = %token, waiters = waiters.len(), cached, "Token refreshed"),
            Err(e) => warn!(token = %token, waiters = waiters.len(), error = %e, "Token refresh failed"),
        }

        for waiter in waiters {
            // The caller may have stopped waiting; the result stays cached.
            let _ = waiter.send(outcome.clone());
        }
    }

    guard.finished = true;
}

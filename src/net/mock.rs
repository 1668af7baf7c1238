//! Scriptable in-memory transport for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::AuthTransport;
use crate::error::Result;

type Handler = Box<dyn Fn(&str, &Value) -> Result<Value> + Send + Sync>;
type DelayFn = Box<dyn Fn(&str, &Value) -> Duration + Send + Sync>;

/// Records every request and answers through `handler` after a delay.
pub(crate) struct MockTransport {
    handler: Handler,
    delay: DelayFn,
    calls: Mutex<Vec<(String, Value)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_, _| Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_by(move |_, _| delay)
    }

    /// Pick the delay per request.
    pub(crate) fn with_delay_by<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str, &Value) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// `refresh_token` of every call made to `path`, in call order.
    pub(crate) fn tokens_sent_to(&self, path: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .filter_map(|(_, body)| body["refresh_token"].as_str().map(str::to_string))
            .collect()
    }

    /// Highest number of calls that were in progress at the same time.
    pub(crate) fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthTransport for MockTransport {
    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.calls.lock().push((path.to_string(), body.clone()));
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let delay = (self.delay)(path, &body);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = (self.handler)(path, &body);

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}

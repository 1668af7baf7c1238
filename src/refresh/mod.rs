//! Token refresh: the result cache and the single-flight coordinator.

pub mod cache;
pub mod coordinator;

pub use cache::{CachedResult, ResultCache};
pub use coordinator::RefreshCoordinator;

/// Short, log-safe stand-in for a refresh token.
pub(crate) fn redact(token: &str) -> String {
    const VISIBLE: usize = 4;
    if token.chars().count() <= VISIBLE * 2 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(VISIBLE).collect();
    format!("{prefix}...")
}

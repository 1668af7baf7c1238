//! Data models for the Access identity service.

pub mod context;
pub mod inputs;

pub use context::SdkContext;
pub use inputs::*;

/// Opaque JSON payload returned by the identity service.
///
/// The SDK never inspects response fields; callers decode what they need.
pub type AuthResponse = serde_json::Value;

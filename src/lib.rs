//! # access-sdk
//!
//! Client SDK for the Access identity service.
//!
//! The client performs a one-time `/sdk-init` handshake, then forwards sign-in,
//! sign-up, sign-out, profile and password requests with the stored client
//! credentials merged in. Token refresh goes through a [`RefreshCoordinator`]
//! that issues at most one `/auth/refresh` call per refresh token, shares the
//! result with every concurrent caller and serves repeats from a cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use access_sdk::{AccessClient, AccessConfig, LoginInput, RefreshTokenInput};
//!
//! #[tokio::main]
//! async fn main() -> access_sdk::Result<()> {
//!     let config = AccessConfig::load("access.toml".as_ref())?;
//!     let client = AccessClient::init(config).await?;
//!
//!     let session = client
//!         .login(&LoginInput {
//!             login_type: "login-username".into(),
//!             username: "alice".into(),
//!             password: "secret".into(),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     if let Some(token) = session["refresh_token"].as_str() {
//!         // Concurrent calls with the same token share one network request.
//!         let fresh = client.refresh_token(RefreshTokenInput::new(token)).await?;
//!         println!("{fresh}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod net;
pub mod refresh;

// Re-exports for convenience
pub use client::{AccessClient, AccessClientBuilder};
pub use config::AccessConfig;
pub use error::{Error, Result};
pub use models::inputs::*;
pub use models::{AuthResponse, SdkContext};
pub use net::{AuthTransport, HttpClient, HttpTransport};
pub use refresh::{CachedResult, RefreshCoordinator, ResultCache};

//! Networking: the HTTP client and the transport trait.

pub mod client;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::{AuthTransport, HttpTransport};

#[cfg(test)]
pub(crate) mod mock;

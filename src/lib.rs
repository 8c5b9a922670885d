//! # http-adapter
//!
//! A thin adapter over the reqwest HTTP client. It issues GET/POST/DELETE
//! requests, maps every failure onto one error type, supports cooperative
//! cancellation and timeouts, and keeps a shared `Authorization` header
//! applied to every request.
//!
//! Retries, rate limiting and connection pooling are left to the caller and
//! to reqwest.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http_adapter::{HttpAdapter, AdapterConfig, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let adapter = HttpAdapter::new(AdapterConfig::default())?;
//!     adapter.set_authorization_header("Bearer", "token")?;
//!
//!     let token = CancellationToken::new();
//!     let body = adapter.get("https://api.example.com/items", &token).await?;
//!     println!("{}", body.text().await?);
//!
//!     adapter.dispose();
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Mapping
//!
//! ```text
//! ┌──────────────────────────────┬─────────────────────────────────────────┐
//! │ Failure                      │ Error                                   │
//! ├──────────────────────────────┼─────────────────────────────────────────┤
//! │ Non-2xx status               │ Request { status_code: Some(code) }     │
//! │ DNS / refused / reset        │ Request { message: transport text }     │
//! │ Transport timeout            │ Request { timed_out: true }             │
//! │ Caller cancelled the token   │ Cancelled { url }                       │
//! └──────────────────────────────┴─────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the adapter
#[allow(missing_docs)]
pub mod error;

/// Adapter configuration
pub mod config;

/// HTTP adapter and response bodies
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use error::{Error, RequestError, Result};
pub use http::{HttpAdapter, ResponseBody};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

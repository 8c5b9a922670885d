//! HTTP adapter module
//!
//! Provides a thin adapter over reqwest with a unified failure type.
//!
//! # Features
//!
//! - **Unified Errors**: Transport failures, non-success statuses and timeouts all surface as `RequestError`
//! - **Cancellation**: Every request takes a `CancellationToken`, checked before sending and raced while in flight
//! - **Timeout Detection**: Transport timeouts are reported separately from caller cancellation
//! - **Shared Authorization**: One `Authorization` header applied to every subsequent request

mod adapter;
mod body;

pub use adapter::HttpAdapter;
pub use body::ResponseBody;

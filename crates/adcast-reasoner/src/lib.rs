//! Language-model reasoning for adcast.
//!
//! [`ReasoningClient`] asks an external chat-completions service for audience insights
//! and campaign strategy. The service is treated as unreliable:
//!
//! - transient failures (rate limits, server errors, timeouts) are retried under a
//!   [`RetryPolicy`] with capped exponential backoff and jitter;
//! - loosely formatted output is cleaned by [`salvage`] before parsing;
//! - every field of a parsed response is normalized on its own ([`insights`]);
//! - when no usable content can be obtained, [`fallback`] synthesizes a deterministic
//!   result from the campaign input.
//!
//! The public operations never fail. Callers always get insights and a strategy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod fallback;
pub mod insights;
pub mod prompts;
pub mod retry;
pub mod salvage;

pub use client::{ReasoningClient, ReasoningConfig};
pub use error::{ReasoningError, Result};
pub use retry::RetryPolicy;

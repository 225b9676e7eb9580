//! Adcast HTTP API Service.
//!
//! This crate provides the HTTP API for adcast, including:
//!
//! - Account management
//! - Credit balance, history, purchases, and bonuses
//! - Campaign generation through the reasoning service
//! - Campaign export to ad providers in preview or commit mode
//!
//! # Authentication
//!
//! The service supports three credentials:
//!
//! 1. **Session JWTs** (HS256) - For end-user requests
//! 2. **Admin API key** - For privileged credit operations
//! 3. **Export operator key** - Additionally required for commit-mode exports

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod workflow;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use gate::CommitGate;
pub use routes::create_router;
pub use state::AppState;
pub use workflow::{CampaignWorkflow, ExportOutcome};

//! Guild HTTP API Service.
//!
//! This crate provides the HTTP API for the guild forum, including:
//!
//! - Session issuance and user management
//! - Posts, votes, comments, and tags
//! - Abuse reports and their moderation view
//! - Friend requests and groups
//! - Payment intents and the gold badge
//!
//! # Authentication
//!
//! `POST /jwt` issues an HS256 token carrying the caller's email in an
//! HTTP-only, same-site cookie. Every protected route reads that cookie (or
//! an `Authorization: Bearer` header) through the [`auth::AuthUser`]
//! extractor; admin routes additionally load the caller's role through
//! [`auth::AdminUser`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for axum even when trivial

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod payments;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use payments::{PaymentProcessor, StripeClient, StripeError};
pub use routes::create_router;
pub use state::AppState;

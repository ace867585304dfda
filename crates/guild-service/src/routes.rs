//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    announcements, comments, friends, groups, health, payments, posts, reports, session, tags,
    users,
};
use crate::state::AppState;

/// Maximum concurrent requests across the API routes.
const API_MAX_CONCURRENT_REQUESTS: usize = 256;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /jwt`, `POST /logout` - Session cookie
/// - `POST /users` - Idempotent sign-up
///
/// ## Posts and votes
/// - `POST|GET /posts`, `GET|DELETE /posts/:id`, `PATCH /posts/:id/vote`
/// - `GET /posts-count` (estimated), `GET /post-count` (exact)
///
/// ## Moderation
/// - `POST|GET /comments`, `DELETE /comments/:id`
/// - `POST|GET /reports`, `DELETE /reports/:id`, `GET /report/:comment_id`
/// - `GET /users`, `DELETE /users/:email`, `PATCH /users/admin/:email`,
///   `PATCH /users/warn/:email`
///
/// ## Relationships
/// - `POST|GET /friend-requests`, `PATCH /friend-requests/:id`, `GET /my-friends/:email`
/// - `POST|GET /groups`, `GET|DELETE /groups/:id`, `POST|GET|PATCH /groups/:id/requests`,
///   `GET /groups/:id/members`, `PATCH /groups/:id/members/:email`
///
/// ## Content and payments
/// - `POST|GET /announcements`, `GET /announcements/count`, `POST|GET /tags`
/// - `POST /create-payment-intent`, `POST|GET /payments`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Session
        .route("/jwt", post(session::create_session))
        .route("/logout", post(session::logout))
        // Users
        .route("/users", post(users::create_user).get(users::get_users))
        .route("/users/:email", delete(users::delete_user))
        .route("/users/admin/:email", patch(users::make_admin))
        .route("/users/warn/:email", patch(users::warn_user))
        // Announcements and tags
        .route(
            "/announcements",
            post(announcements::create_announcement).get(announcements::list_announcements),
        )
        .route("/announcements/count", get(announcements::count_announcements))
        .route("/tags", post(tags::create_tag).get(tags::list_tags))
        // Posts
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route("/posts/:id", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/:id/vote", patch(posts::vote))
        .route("/posts-count", get(posts::estimated_post_count))
        .route("/post-count", get(posts::post_count))
        // Comments and reports
        .route(
            "/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route("/comments/:id", delete(comments::delete_comment))
        .route(
            "/reports",
            post(reports::create_report).get(reports::list_reports),
        )
        .route("/reports/:id", delete(reports::delete_report))
        .route("/report/:comment_id", get(reports::report_exists))
        // Payments
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route(
            "/payments",
            post(payments::record_payment).get(payments::list_payments),
        )
        // Friends
        .route(
            "/friend-requests",
            post(friends::send_request).get(friends::incoming_requests),
        )
        .route("/friend-requests/:id", patch(friends::respond_request))
        .route("/my-friends/:email", get(friends::my_friends))
        // Groups
        .route("/groups", post(groups::create_group).get(groups::list_groups))
        .route(
            "/groups/:id",
            get(groups::get_group).delete(groups::delete_group),
        )
        .route(
            "/groups/:id/requests",
            post(groups::submit_join_request)
                .get(groups::list_requests)
                .patch(groups::respond_to_join_request),
        )
        .route("/groups/:id/members", get(groups::list_members))
        .route("/groups/:id/members/:email", patch(groups::set_member_role))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no concurrency limit)
        .route("/health", get(health::health))
        .merge(api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// The session travels in a cookie, so explicit origins allow credentials;
/// a wildcard origin cannot, and is only meant for local tooling.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

//! services/api/src/web/middleware.rs
//!
//! Session middleware. Every request is bound to a studio session through the
//! `studio_session` cookie; requests without a known cookie get a new session.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "studio_session";

/// Reads the session id from a `Cookie` header value.
pub fn session_id_from_cookie(cookie_header: &str) -> Option<Uuid> {
    cookie_header.split(';').find_map(|c| {
        c.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .and_then(|id| Uuid::parse_str(id).ok())
    })
}

/// Middleware that resolves the caller's session and inserts it into the
/// request extensions for handlers to use.
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Parse the session id from the cookie, if any
    let requested = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookie);

    // 2. Look it up, or open a new session
    let (session_id, session, created) = state.sessions.resolve(requested).await;
    if created {
        info!("Opened studio session {}.", session_id);
    }

    // 3. Hand the session to the handler
    req.extensions_mut().insert(session);
    let mut response = next.run(req).await;

    // 4. Tell the browser about a new session
    if created {
        let cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, session_id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to build session cookie: {}", e),
        }
    }
    response
}

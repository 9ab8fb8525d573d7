//! Staff authentication middleware.
//!
//! Staff endpoints present the admin API key in the `X-Admin-Key` header.
//! Only a SHA-256 hash of the key is configured server-side and the
//! comparison is constant-time.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the staff API key.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Middleware that rejects requests without a valid admin API key.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let stored_hash = &state.config.security.admin_api_key_hash;

    // No key configured means staff access is disabled outright.
    if stored_hash.is_empty() {
        tracing::warn!("Admin request rejected: no admin API key configured");
        return ApiError::Unauthorized.into_response();
    }

    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if shared::crypto::verify_secret(key, stored_hash) => next.run(req).await,
        _ => ApiError::Unauthorized.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_name() {
        assert_eq!(ADMIN_KEY_HEADER, "X-Admin-Key");
    }

    #[test]
    fn test_verify_secret_accepts_matching_key() {
        let hash = shared::crypto::sha256_hex("staff-key-123");
        assert!(shared::crypto::verify_secret("staff-key-123", &hash));
        assert!(!shared::crypto::verify_secret("wrong-key", &hash));
    }
}

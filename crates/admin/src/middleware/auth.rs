//! Caller identity extraction for the admin API.
//!
//! The API trusts the dealership gateway in front of it: the gateway
//! authenticates staff and forwards the numeric user id in the
//! `x-user-id` header. Handlers never see a request without one.

use axum::{extract::FromRequestParts, http::request::Parts};
use dealerdesk_core::UserId;

use crate::error::{self, AppError};

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires a caller identity on the request.
///
/// Rejects with 401 Unauthorized when the header is missing, not a
/// number, or not a positive id.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("Hello, user {user_id}!")
/// }
/// ```
#[derive(Debug)]
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(UserId::new)
            .ok_or_else(|| {
                AppError::Unauthorized(format!("Missing or invalid {USER_ID_HEADER} header"))
            })?;

        // Tag Sentry events from the rest of this request with the caller.
        error::set_sentry_user(user_id);

        Ok(Self(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<RequireUser, AppError> {
        let mut builder = Request::builder().uri("/api/chat/send");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, ()) = request.into_parts();
        RequireUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_positive_user_id() {
        let RequireUser(user_id) = extract(Some("42")).await.unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[tokio::test]
    async fn test_trims_surrounding_whitespace() {
        let RequireUser(user_id) = extract(Some(" 7 ")).await.unwrap();
        assert_eq!(user_id, UserId::new(7));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_non_numeric_header_is_unauthorized() {
        let err = extract(Some("marta")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_zero_and_negative_ids_are_unauthorized() {
        assert!(extract(Some("0")).await.is_err());
        assert!(extract(Some("-3")).await.is_err());
    }
}

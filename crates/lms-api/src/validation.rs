//! Request validation shared by the handlers.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::PathRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// Default and maximum page size for listings
pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON and failed rules both become a 400 in the error envelope.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Path parameters parsed into `T`.
///
/// A segment that does not parse (a malformed uuid, say) becomes a 400 in the
/// error envelope instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;

        Ok(Self(value))
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    if rejection.status().is_client_error() {
        ApiError::Validation(rejection.body_text())
    } else {
        ApiError::Internal(anyhow::anyhow!(rejection.body_text()))
    }
}

/// Query string parsed into `T`, with failures reported in the error envelope.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// Reject blank text, which `length(min = 1)` lets through.
///
/// # Examples
/// ```
/// use lms_api::validation::require_text;
///
/// assert!(require_text("title", "Intro to Rust").is_ok());
/// assert!(require_text("title", "   ").is_err());
/// ```
pub fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} cannot be blank")));
    }
    Ok(())
}

/// Same as [`require_text`] for optional updates.
pub fn require_text_if_present(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    value.map_or(Ok(()), |value| require_text(field, value))
}

/// Turn 1-based `page` / `per_page` query values into `(limit, offset)`.
pub fn pagination(page: Option<i64>, per_page: Option<i64>) -> Result<(i64, i64), ApiError> {
    let page = page.unwrap_or(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

    if page < 1 {
        return Err(ApiError::Validation("page must be at least 1".to_string()));
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ApiError::Validation(format!(
            "per_page must be between 1 and {MAX_PER_PAGE}"
        )));
    }

    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| ApiError::Validation("page is too large".to_string()))?;

    Ok((per_page, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Rust").is_ok());
        assert!(require_text("title", "").is_err());
        assert!(require_text("title", " \t\n").is_err());
        assert!(require_text_if_present("title", None).is_ok());
        assert!(require_text_if_present("title", Some(" ")).is_err());
    }

    #[test]
    fn test_pagination() {
        assert_eq!(pagination(None, None).unwrap(), (DEFAULT_PER_PAGE, 0));
        assert_eq!(pagination(Some(3), Some(10)).unwrap(), (10, 20));
        assert!(pagination(Some(0), None).is_err());
        assert!(pagination(None, Some(0)).is_err());
        assert!(pagination(None, Some(MAX_PER_PAGE + 1)).is_err());
        assert!(pagination(Some(i64::MAX), Some(100)).is_err());
    }
}

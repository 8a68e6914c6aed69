//! Caller identity.
//!
//! Authentication happens upstream; the proxy in front of the daemon sets
//! [`CALLER_HEADER`] to the authenticated username. The daemon trusts it and
//! only decides what that caller may do.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const CALLER_HEADER: &str = "x-cwk-user";

/// The authenticated username of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

impl Caller {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Refuse unless the caller is `owner`.
    pub fn require(&self, owner: &str, what: &str) -> Result<(), ApiError> {
        if self.0 == owner {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} may not modify {what}",
                self.0
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Caller(v.to_string()))
            .ok_or(ApiError::Unauthenticated)
    }
}

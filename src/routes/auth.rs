//! Bearer-identity extraction for admin operations.
//!
//! Token verification against the external identity provider is out of
//! scope here; the bearer value itself is the admin identity and is compared
//! against the game's recorded creator by the service layer.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;

/// Admin identity carried in the `Authorization: Bearer` header.
pub struct AdminIdentity(pub String);

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header_value) = parts.headers.get(header::AUTHORIZATION) else {
            return Err(AppError::Unauthorized("No authorization header".into()));
        };
        let value = header_value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;

        let Some((auth_type, auth_value)) = value.split_once(' ') else {
            return Err(AppError::Unauthorized("Invalid authorization type".into()));
        };
        if auth_type != "Bearer" {
            return Err(AppError::Unauthorized("Invalid authorization type".into()));
        }

        let auth_value = auth_value.trim();
        if auth_value.is_empty() {
            return Err(AppError::Unauthorized("No authorization value".into()));
        }

        Ok(AdminIdentity(auth_value.to_string()))
    }
}

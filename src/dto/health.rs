use serde::Serialize;
use utoipa::ToSchema;

/// Payload returned by the healthcheck endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    /// Healthy service response.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

//! Health check DTO

use serde::Serialize;

/// Body of `GET /api/v1/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            service: "apolo-attributes",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

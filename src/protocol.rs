use serde::{Deserialize, Serialize};

use crate::assessment::Dimension;
use crate::scoring::Score;

// ── Insight endpoint ───────────────────────────────────────────────

/// Body of `POST /api/insight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub dimension: Dimension,
    pub all_dimensions: Vec<Dimension>,
    pub overall_score: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResponse {
    pub insight: String,
}

/// Error body returned by every endpoint.
///
/// `unavailable` is true when the failure came from insight generation and a
/// retry may succeed; validation failures set it to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub unavailable: bool,
}

impl ErrorResponse {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            unavailable: false,
        }
    }

    pub fn insight_unavailable() -> Self {
        Self {
            error: "Failed to generate insight".to_string(),
            unavailable: true,
        }
    }
}

// ── Health ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub insights_enabled: bool,
}

//! Feedback API handlers
//!
//! POST /api/feedback (submit one entry), GET /api/feedback (filtered and
//! sorted listing)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::aggregate::{self, SortKey};
use crate::error::{ApiError, ApiResult};
use crate::models::{FeedbackRecord, NewFeedback};
use crate::services::orchestrator::{SubmissionError, SubmissionReceipt};
use crate::AppState;

/// GET /api/feedback query parameters
#[derive(Debug, Deserialize)]
pub struct FeedbackListQuery {
    /// Comma-separated ratings to include, e.g. "4,5" (absent: all)
    pub ratings: Option<String>,
    /// Sort order token (absent: "newest")
    pub sort: Option<String>,
}

/// GET /api/feedback response
#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub count: usize,
    pub records: Vec<FeedbackRecord>,
}

/// POST /api/feedback
///
/// Submit one feedback entry. Returns 201 with the persisted record and
/// any derivation warnings; 400 with a corrective message on validation
/// failure; 503 when the append fails.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<NewFeedback>,
) -> ApiResult<(StatusCode, Json<SubmissionReceipt>)> {
    let receipt = match state.orchestrator.submit(request).await {
        Ok(receipt) => receipt,
        Err(e) => {
            if matches!(e, SubmissionError::Storage(_)) {
                *state.last_error.write().await = Some(e.to_string());
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/feedback
///
/// Filtered, sorted listing. A storage failure is 503, distinct from the
/// empty-store 200.
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackListQuery>,
) -> ApiResult<Json<FeedbackListResponse>> {
    let ratings = parse_ratings_filter(query.ratings.as_deref())?;
    let sort = parse_sort(query.sort.as_deref())?;

    let records = crate::db::feedback::load_all_feedback(&state.db).await?;
    let records = aggregate::filter_and_sort(records, &ratings, sort);

    Ok(Json(FeedbackListResponse {
        count: records.len(),
        records,
    }))
}

/// Parse a comma-separated rating filter
///
/// Absent or blank means all ratings; any entry outside 1..=5 or
/// non-numeric is a 400.
fn parse_ratings_filter(raw: Option<&str>) -> Result<BTreeSet<u8>, ApiError> {
    let raw = match raw {
        None => return Ok(aggregate::all_ratings()),
        Some(value) if value.trim().is_empty() => return Ok(aggregate::all_ratings()),
        Some(value) => value,
    };

    let mut included = BTreeSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        let rating: u8 = part
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Invalid rating filter entry: {:?}", part)))?;
        if !(1..=5).contains(&rating) {
            return Err(ApiError::BadRequest(format!(
                "Rating filter out of range: {}",
                rating
            )));
        }
        included.insert(rating);
    }
    Ok(included)
}

/// Parse a sort token via the SortKey wire names
fn parse_sort(raw: Option<&str>) -> Result<SortKey, ApiError> {
    match raw {
        None => Ok(SortKey::default()),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map_err(|_| ApiError::BadRequest(format!("Unknown sort key: {:?}", value))),
    }
}

/// Build feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new().route("/api/feedback", get(list_feedback).post(submit_feedback))
}

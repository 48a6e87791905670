//! Dashboard API handlers
//!
//! Aggregate summary, cross-record insights, and CSV export.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{self, AggregateView, SortKey};
use crate::error::{ApiError, ApiResult};
use crate::models::FeedbackRecord;
use crate::AppState;

/// Newest records included in the insights corpus
const INSIGHTS_CORPUS_CAP: usize = 50;

/// GET /api/dashboard/summary response
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub aggregates: AggregateView,
    pub category_breakdown: BTreeMap<String, u64>,
    /// Distinct submitter emails; anonymous submissions are not counted
    pub unique_users: usize,
}

/// POST /api/dashboard/insights response
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: String,
    pub record_count: usize,
}

/// GET /api/dashboard/summary
///
/// Aggregates recomputed from the full store on every call.
pub async fn dashboard_summary(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    let records = crate::db::feedback::load_all_feedback(&state.db).await?;

    Ok(Json(DashboardSummary {
        aggregates: aggregate::summarize(&records),
        category_breakdown: aggregate::category_breakdown(&records),
        unique_users: aggregate::unique_users(&records),
    }))
}

/// POST /api/dashboard/insights
///
/// One provider call over the newest entries. No fallback here: a
/// provider failure is reported as 502 so the operator can retry.
pub async fn dashboard_insights(State(state): State<AppState>) -> ApiResult<Json<InsightsResponse>> {
    let records = crate::db::feedback::load_all_feedback(&state.db).await?;
    if records.is_empty() {
        return Err(ApiError::BadRequest(
            "No feedback submitted yet; nothing to analyze".to_string(),
        ));
    }

    let (corpus, record_count) = build_corpus(records);
    let insights = state
        .enricher
        .derive_insights(&corpus)
        .await
        .map_err(|e| ApiError::Provider(e.to_string()))?;

    Ok(Json(InsightsResponse {
        insights,
        record_count,
    }))
}

/// GET /api/export/csv
///
/// Full store in submission order as an attachment.
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let records = crate::db::feedback::load_all_feedback(&state.db).await?;
    let records = aggregate::filter_and_sort(records, &aggregate::all_ratings(), SortKey::Oldest);
    let body = render_csv(&records);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"feedback.csv\"",
            ),
        ],
        body,
    ))
}

/// Assemble the insights corpus from the newest records
fn build_corpus(records: Vec<FeedbackRecord>) -> (String, usize) {
    let records = aggregate::filter_and_sort(records, &aggregate::all_ratings(), SortKey::Newest);
    let lines: Vec<String> = records
        .iter()
        .take(INSIGHTS_CORPUS_CAP)
        .map(|r| format!("[{}/5] {}", r.rating, r.review))
        .collect();
    let count = lines.len();
    (lines.join("\n"), count)
}

/// Render the full CSV document, header row included
fn render_csv(records: &[FeedbackRecord]) -> String {
    let mut out = String::from(
        "id,created_at,rating,review,ai_response,ai_summary,ai_actions,name,email,category\r\n",
    );
    for r in records {
        let row = [
            r.id.to_string(),
            r.created_at.to_rfc3339(),
            r.rating.to_string(),
            r.review.clone(),
            r.ai_response.clone(),
            r.ai_summary.clone(),
            r.ai_actions.clone(),
            r.name.clone().unwrap_or_default(),
            r.email.clone().unwrap_or_default(),
            r.category.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Quote a CSV field when it contains a delimiter, quote, or line break
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Build dashboard routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/summary", get(dashboard_summary))
        .route("/api/dashboard/insights", post(dashboard_insights))
        .route("/api/export/csv", get(export_csv))
}

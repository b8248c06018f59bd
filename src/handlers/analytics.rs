use axum::{extract::State, Extension, Json};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::response::ApiResponse;
use crate::services::aggregate::{
    self, CheckinRow, MonthlySummary, RangeSummary, TagCount, WeeklySummary,
    WeeklySummaryError,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub start_range_1: NaiveDate,
    pub end_range_1: NaiveDate,
    pub start_range_2: NaiveDate,
    pub end_range_2: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct Comparison {
    pub range_1: RangeSummary,
    pub range_2: RangeSummary,
}

async fn fetch_range(
    state: &AppState,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<CheckinRow>> {
    // Ascending date order pins the "first encountered" tie-breaks.
    let rows = sqlx::query_as::<_, CheckinRow>(
        r#"
        SELECT date, mood, focus_percent, tags
        FROM daily_checkins
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

/// Trailing-7-day summary (today inclusive).
pub async fn weekly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<WeeklySummary>>> {
    let today = Utc::now().date_naive();
    let week_ago = today - Duration::days(6);

    let rows = fetch_range(&state, auth_user.id, week_ago, today).await?;
    let summary = aggregate::weekly_summary(&rows).map_err(|e| match e {
        WeeklySummaryError::Empty => {
            AppError::NotFound("No check-in data found for the past 7 days.".into())
        }
        WeeklySummaryError::MissingFields => AppError::DataQuality(
            "Some records are missing required fields (mood or focus).".into(),
        ),
    })?;

    Ok(Json(ApiResponse::ok("Weekly summary retrieved", summary)))
}

/// Month-to-date summary bucketed by ISO week.
pub async fn monthly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<MonthlySummary>>> {
    let today = Utc::now().date_naive();
    let first_day = today.with_day(1).unwrap_or(today);

    let rows = fetch_range(&state, auth_user.id, first_day, today).await?;
    Ok(Json(ApiResponse::ok(
        "Monthly summary retrieved",
        aggregate::monthly_summary(&rows),
    )))
}

/// Every tag ranked by frequency, unbounded time range, no cap.
pub async fn tag_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let rows = sqlx::query_as::<_, CheckinRow>(
        r#"
        SELECT date, mood, focus_percent, tags
        FROM daily_checkins
        WHERE user_id = $1
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let top_tags: Vec<TagCount> = aggregate::tag_summary(&rows);
    Ok(Json(ApiResponse::ok(
        "Tag usage summary retrieved",
        serde_json::json!({ "top_tags": top_tags }),
    )))
}

/// Two caller-supplied ranges, aggregated independently, returned side by
/// side with no merge. Empty ranges come back as all-zero summaries.
pub async fn compare_periods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CompareRequest>,
) -> AppResult<Json<ApiResponse<Comparison>>> {
    let range_1 = fetch_range(&state, auth_user.id, body.start_range_1, body.end_range_1).await?;
    let range_2 = fetch_range(&state, auth_user.id, body.start_range_2, body.end_range_2).await?;

    Ok(Json(ApiResponse::ok(
        "Comparison retrieved successfully.",
        Comparison {
            range_1: aggregate::analyze_range(&range_1),
            range_2: aggregate::analyze_range(&range_2),
        },
    )))
}

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::checkin::{CheckIn, Mood};
use crate::models::journal::{
    CreateJournalEntryRequest, JournalEntry, UpdateJournalEntryRequest,
};
use crate::models::response::ApiResponse;
use crate::services::{aggregate, sentiment};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

#[derive(Debug, Serialize)]
pub struct SentimentPoint {
    pub date: String,
    pub sentiment_score: f64,
}

/// Calendar/search row shape shared by the check-in backed journal views.
#[derive(Debug, Serialize)]
pub struct CheckinView {
    pub id: Uuid,
    pub date: String,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalEntryRequest>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    if body.title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if let Some(focus) = body.focus_percent {
        if !(0..=100).contains(&focus) {
            return Err(AppError::Validation(
                "focus_percent must be between 0 and 100".into(),
            ));
        }
    }

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (id, user_id, title, content, mood, focus_percent, is_favorite, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(body.focus_percent)
    .bind(body.is_favorite)
    .bind(&body.tags)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn journal_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<aggregate::JournalStats>>> {
    let rows = sqlx::query_as::<_, aggregate::JournalRow>(
        r#"
        SELECT mood, focus_percent, tags
        FROM journal_entries
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok(
        "Journal stats retrieved",
        aggregate::journal_stats(&rows),
    )))
}

/// Per-day sentiment trend over check-in notes, ascending by date.
pub async fn sentiment_trend(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Vec<SentimentPoint>>>> {
    let checkins = sqlx::query_as::<_, CheckIn>(
        "SELECT * FROM daily_checkins WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let mut trend: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for checkin in &checkins {
        let note = checkin.note.as_deref().unwrap_or("");
        trend
            .entry(checkin.created_at.format("%Y-%m-%d").to_string())
            .or_default()
            .push(sentiment::score(note));
    }

    let data = trend
        .into_iter()
        .map(|(date, scores)| {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            SentimentPoint {
                date,
                sentiment_score: (mean * 100.0).round() / 100.0,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        "Sentiment analysis retrieved successfully.",
        data,
    )))
}

/// Trailing-week overview of check-ins for the journal dashboard. An empty
/// week is not an error; it returns an empty data object.
pub async fn weekly_overview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let today = Utc::now().date_naive();
    let start_date = today - Duration::days(6);

    let rows = sqlx::query_as::<_, aggregate::CheckinRow>(
        r#"
        SELECT date, mood, focus_percent, tags
        FROM daily_checkins
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start_date)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    match aggregate::weekly_overview(&rows, start_date, today) {
        Some(overview) => Ok(Json(ApiResponse::ok(
            "Weekly summary retrieved successfully.",
            serde_json::to_value(overview).map_err(anyhow::Error::from)?,
        ))),
        None => Ok(Json(ApiResponse::ok(
            "No entries found for this week.",
            serde_json::json!({}),
        ))),
    }
}

/// Groups all check-ins into a date-string → entries map. Normally each
/// list is a singleton because of the per-day uniqueness constraint, but
/// the shape tolerates multiples.
pub async fn calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<BTreeMap<String, Vec<CheckinView>>>>> {
    let checkins = sqlx::query_as::<_, CheckIn>(
        "SELECT * FROM daily_checkins WHERE user_id = $1 ORDER BY date DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let mut calendar: BTreeMap<String, Vec<CheckinView>> = BTreeMap::new();
    for checkin in checkins {
        calendar
            .entry(checkin.date.to_string())
            .or_default()
            .push(CheckinView {
                id: checkin.id,
                date: checkin.date.to_string(),
                note: checkin.note,
                tags: checkin.tags,
                mood: checkin.mood,
                focus_percent: checkin.focus_percent,
            });
    }

    Ok(Json(ApiResponse::ok(
        "Journal calendar data fetched successfully.",
        calendar,
    )))
}

/// Case-insensitive substring match on note text OR exact tag membership,
/// newest first.
pub async fn search(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<CheckinView>>>> {
    if query.keyword.is_empty() {
        return Err(AppError::Validation("keyword must not be empty".into()));
    }

    let checkins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT * FROM daily_checkins
        WHERE user_id = $1 AND (note ILIKE '%' || $2 || '%' OR $2 = ANY(tags))
        ORDER BY date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(&query.keyword)
    .fetch_all(&state.db)
    .await?;

    let results = checkins
        .into_iter()
        .map(|c| CheckinView {
            id: c.id,
            date: c.date.to_string(),
            note: c.note,
            tags: c.tags,
            mood: c.mood,
            focus_percent: c.focus_percent,
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        "Journal entries matching the keyword fetched successfully.",
        results,
    )))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<JournalEntry>> {
    let entry = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateJournalEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    if let Some(focus) = body.focus_percent {
        if !(0..=100).contains(&focus) {
            return Err(AppError::Validation(
                "focus_percent must be between 0 and 100".into(),
            ));
        }
    }

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        UPDATE journal_entries SET
            title = COALESCE($3, title),
            content = COALESCE($4, content),
            mood = COALESCE($5, mood),
            focus_percent = COALESCE($6, focus_percent),
            is_favorite = COALESCE($7, is_favorite),
            tags = COALESCE($8, tags)
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(body.focus_percent)
    .bind(body.is_favorite)
    .bind(&body.tags)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    Ok(Json(serde_json::json!({ "message": "Entry deleted successfully" })))
}

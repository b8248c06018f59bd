use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::checkin::{
    CheckIn, CheckInQuery, CreateCheckInRequest, StreakOut, UpdateCheckInRequest,
};
use crate::models::response::ApiResponse;
use crate::services::streaks;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub range: Option<i64>,
}

pub async fn list_checkins(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CheckInQuery>,
) -> AppResult<Json<ApiResponse<Vec<CheckIn>>>> {
    let checkins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT * FROM daily_checkins
        WHERE user_id = $1
          AND ($2::date IS NULL OR date >= $2)
          AND ($3::date IS NULL OR date <= $3)
        ORDER BY date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok(
        "Check-ins fetched successfully",
        checkins,
    )))
}

pub async fn create_checkin(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateCheckInRequest>,
) -> AppResult<(StatusCode, Json<CheckIn>)> {
    if !(0..=100).contains(&body.focus_percent) {
        return Err(AppError::Validation(
            "focus_percent must be between 0 and 100".into(),
        ));
    }

    // Insert and streak upsert share one transaction. The streak write is a
    // single conditional upsert so concurrent same-day check-ins cannot
    // interleave a read-modify-write; the unique (user_id, date) index
    // rejects the loser of the race with a conflict.
    let mut tx = state.db.begin().await?;

    let checkin = sqlx::query_as::<_, CheckIn>(
        r#"
        INSERT INTO daily_checkins (id, user_id, date, mood, focus_percent, tags, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.date)
    .bind(body.mood)
    .bind(body.focus_percent)
    .bind(&body.tags)
    .bind(&body.note)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Check-in for this date already exists."))?;

    // Incremental streak rules: yesterday → +1, same day → unchanged, gap → 1.
    sqlx::query(
        r#"
        INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_checkin_date)
        VALUES ($1, 1, 1, $2)
        ON CONFLICT (user_id) DO UPDATE SET
            current_streak = CASE
                WHEN user_streaks.last_checkin_date = $2 - 1 THEN user_streaks.current_streak + 1
                WHEN user_streaks.last_checkin_date = $2 THEN user_streaks.current_streak
                ELSE 1
            END,
            longest_streak = GREATEST(user_streaks.longest_streak, CASE
                WHEN user_streaks.last_checkin_date = $2 - 1 THEN user_streaks.current_streak + 1
                WHEN user_streaks.last_checkin_date = $2 THEN user_streaks.current_streak
                ELSE 1
            END),
            last_checkin_date = $2,
            updated_at = NOW()
        "#,
    )
    .bind(auth_user.id)
    .bind(body.date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(checkin)))
}

pub async fn checked_in_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let today = Utc::now().date_naive();
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM daily_checkins WHERE user_id = $1 AND date = $2",
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_one(&state.db)
    .await?
        > 0;

    let message = if exists {
        "Checked in today"
    } else {
        "Not checked in today"
    };
    Ok(Json(ApiResponse::ok(
        message,
        serde_json::json!({ "checked_in": exists }),
    )))
}

pub async fn checkin_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let (total, average_focus) = sqlx::query_as::<_, (i64, f64)>(
        r#"
        SELECT COUNT(*), COALESCE(AVG(focus_percent), 0)::float8
        FROM daily_checkins
        WHERE user_id = $1
        "#,
    )
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok(
        "Check-in stats retrieved",
        serde_json::json!({
            "total_checkins": total,
            "average_focus": average_focus,
        }),
    )))
}

pub async fn checkin_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<ApiResponse<Vec<CheckIn>>>> {
    let limit = query.range.unwrap_or(7);
    if !(1..=30).contains(&limit) {
        return Err(AppError::Validation("range must be between 1 and 30".into()));
    }

    let checkins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT * FROM daily_checkins
        WHERE user_id = $1
        ORDER BY date DESC
        LIMIT $2
        "#,
    )
    .bind(auth_user.id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok(
        format!("Last {limit} check-ins retrieved"),
        checkins,
    )))
}

/// Full recompute over the user's whole check-in history. The incremental
/// counters kept in `user_streaks` approximate this; this endpoint is the
/// authoritative batch form.
pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StreakOut>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT DISTINCT date FROM daily_checkins
        WHERE user_id = $1
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let summary = streaks::compute_streaks(&dates);
    Ok(Json(StreakOut {
        user_id: auth_user.id,
        current_streak: summary.current_streak,
        longest_streak: summary.longest_streak,
        last_checkin_date: summary.last_checkin_date,
    }))
}

pub async fn get_checkin(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(checkin_id): Path<Uuid>,
) -> AppResult<Json<CheckIn>> {
    let checkin = sqlx::query_as::<_, CheckIn>(
        "SELECT * FROM daily_checkins WHERE id = $1 AND user_id = $2",
    )
    .bind(checkin_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Check-in not found".into()))?;

    Ok(Json(checkin))
}

pub async fn update_checkin(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(checkin_id): Path<Uuid>,
    Json(body): Json<UpdateCheckInRequest>,
) -> AppResult<Json<CheckIn>> {
    if let Some(focus) = body.focus_percent {
        if !(0..=100).contains(&focus) {
            return Err(AppError::Validation(
                "focus_percent must be between 0 and 100".into(),
            ));
        }
    }

    let checkin = sqlx::query_as::<_, CheckIn>(
        r#"
        UPDATE daily_checkins SET
            mood = COALESCE($3, mood),
            focus_percent = COALESCE($4, focus_percent),
            tags = COALESCE($5, tags),
            note = COALESCE($6, note),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(checkin_id)
    .bind(auth_user.id)
    .bind(body.mood)
    .bind(body.focus_percent)
    .bind(&body.tags)
    .bind(&body.note)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Check-in not found".into()))?;

    Ok(Json(checkin))
}

pub async fn delete_checkin(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(checkin_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM daily_checkins WHERE id = $1 AND user_id = $2")
        .bind(checkin_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Check-in not found".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

use axum::{extract::State, Extension, Json};
use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::goal::{Goal, GoalOut, GoalRequest, GoalStatus};
use crate::models::response::ApiResponse;
use crate::AppState;

#[derive(Debug, FromRow)]
struct GoalUpsertRow {
    id: Uuid,
    user_id: Uuid,
    goal: String,
    target_days: i32,
    completed_days: i32,
    status: GoalStatus,
    created_at: NaiveDate,
    // xmax = 0 only for freshly inserted rows
    inserted: bool,
}

/// Upsert-by-day: a second write on the same day overwrites the goal text
/// and target and forces the status back to in_progress; completed_days is
/// left as-is, not recomputed.
pub async fn create_or_update_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<GoalRequest>,
) -> AppResult<Json<ApiResponse<GoalOut>>> {
    if body.goal.len() < 5 {
        return Err(AppError::Validation(
            "Goal must be at least 5 characters".into(),
        ));
    }
    if !(1..=7).contains(&body.target_days) {
        return Err(AppError::Validation(
            "target_days must be between 1 and 7".into(),
        ));
    }

    let today = Utc::now().date_naive();

    let row = sqlx::query_as::<_, GoalUpsertRow>(
        r#"
        INSERT INTO goals (id, user_id, goal, target_days, completed_days, status, created_at)
        VALUES ($1, $2, $3, $4, 0, 'in_progress', $5)
        ON CONFLICT (user_id, created_at) DO UPDATE SET
            goal = EXCLUDED.goal,
            target_days = EXCLUDED.target_days,
            status = 'in_progress'
        RETURNING *, (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.goal)
    .bind(body.target_days)
    .bind(today)
    .fetch_one(&state.db)
    .await?;

    let message = if row.inserted {
        "Goal set successfully."
    } else {
        "Goal updated successfully."
    };
    let goal = Goal {
        id: row.id,
        user_id: row.user_id,
        goal: row.goal,
        target_days: row.target_days,
        completed_days: row.completed_days,
        status: row.status,
        created_at: row.created_at,
    };
    Ok(Json(ApiResponse::ok(message, goal.into())))
}

/// The most recently created goal row, which is not necessarily today's.
pub async fn get_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Option<GoalOut>>>> {
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        SELECT * FROM goals
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?;

    match goal {
        Some(goal) => Ok(Json(ApiResponse::ok(
            "Goal fetched successfully.",
            Some(goal.into()),
        ))),
        None => Ok(Json(ApiResponse::ok("No goal set yet.", None))),
    }
}

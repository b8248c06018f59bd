use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{
    jwt::{create_access_token, Token},
    middleware::AuthUser,
    password::{hash_password, validate_password_strength, verify_password},
};
use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserProfile};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if body.email.is_empty() || !body.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    validate_password_strength(&body.password)?;
    if body.password != body.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_one(&state.db)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let pwd_hash = hash_password(&body.password)?;
    let user_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, full_name)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(&body.email)
    .bind(&pwd_hash)
    .bind(body.full_name.as_deref().unwrap_or(""))
    .execute(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Email already registered"))?;

    Ok(Json(serde_json::json!({
        "message": "User registered successfully",
        "user_id": user_id,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<Token>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // OAuth-only accounts have no local password
    let password_hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(&body.password, password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = create_access_token(user.id, &user.email, &state.config)?;
    Ok(Json(token))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::jwt::{create_access_token, Token};
use crate::config::OAuthProviderConfig;
use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Github,
    Linkedin,
}

impl Provider {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "google" => Some(Provider::Google),
            "github" => Some(Provider::Github),
            "linkedin" => Some(Provider::Linkedin),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::Linkedin => "linkedin",
        }
    }

    fn token_url(self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Github => "https://github.com/login/oauth/access_token",
            Provider::Linkedin => "https://www.linkedin.com/oauth/v2/accessToken",
        }
    }

    fn userinfo_url(self) -> &'static str {
        match self {
            Provider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
            Provider::Github => "https://api.github.com/user",
            Provider::Linkedin => "https://api.linkedin.com/v2/userinfo",
        }
    }

    fn config<'a>(self, state: &'a AppState) -> &'a OAuthProviderConfig {
        match self {
            Provider::Google => &state.config.google,
            Provider::Github => &state.config.github,
            Provider::Linkedin => &state.config.linkedin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Identity fields extracted from a provider's userinfo payload.
#[derive(Debug)]
struct ProviderIdentity {
    provider_user_id: String,
    email: String,
    full_name: String,
}

/// Authorization-code callback: exchanges the code for an access token,
/// fetches the provider identity, finds or creates the matching user and
/// issues the same bearer token local login does.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Json<Token>> {
    let provider = Provider::parse(&provider_name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown provider: {provider_name}")))?;
    if !provider.config(&state).is_configured() {
        return Err(AppError::Validation(format!(
            "{provider_name} login is not configured"
        )));
    }

    if let Some(err) = query.error {
        return Err(AppError::Upstream(format!("OAuth error: {err}")));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::Validation("Authorization code not provided".into()))?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent("focus-journal-api")
        .build()
        .map_err(anyhow::Error::from)?;

    let access_token = exchange_code(&client, provider, provider.config(&state), &code).await?;
    let identity = fetch_identity(&client, provider, &access_token).await?;

    let user = find_or_create_user(&state, provider, &identity).await?;
    let token = create_access_token(user.id, &user.email, &state.config)?;
    Ok(Json(token))
}

async fn exchange_code(
    client: &reqwest::Client,
    provider: Provider,
    config: &OAuthProviderConfig,
    code: &str,
) -> AppResult<String> {
    let response = client
        .post(provider.token_url())
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Token exchange failed: {e}")))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Token exchange failed: {}",
            response.status()
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed token response: {e}")))?;

    body["access_token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::Upstream("Provider returned no access token".into()))
}

async fn fetch_identity(
    client: &reqwest::Client,
    provider: Provider,
    access_token: &str,
) -> AppResult<ProviderIdentity> {
    let response = client
        .get(provider.userinfo_url())
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Userinfo fetch failed: {e}")))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Userinfo fetch failed: {}",
            response.status()
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed userinfo response: {e}")))?;

    let identity = match provider {
        Provider::Google => ProviderIdentity {
            provider_user_id: body["id"].as_str().unwrap_or_default().to_string(),
            email: body["email"].as_str().unwrap_or_default().to_string(),
            full_name: body["name"].as_str().unwrap_or_default().to_string(),
        },
        Provider::Github => {
            let login = body["login"].as_str().unwrap_or_default();
            // GitHub hides the email for some accounts; fall back to the
            // noreply address so the unique email column stays populated.
            let email = body["email"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{login}@users.noreply.github.com"));
            ProviderIdentity {
                provider_user_id: body["id"].as_i64().unwrap_or_default().to_string(),
                email,
                full_name: body["name"].as_str().unwrap_or(login).to_string(),
            }
        }
        Provider::Linkedin => ProviderIdentity {
            provider_user_id: body["sub"].as_str().unwrap_or_default().to_string(),
            email: body["email"].as_str().unwrap_or_default().to_string(),
            full_name: body["name"].as_str().unwrap_or_default().to_string(),
        },
    };

    if identity.provider_user_id.is_empty() || identity.email.is_empty() {
        return Err(AppError::Upstream(
            "Provider identity is missing an id or email".into(),
        ));
    }
    Ok(identity)
}

async fn find_or_create_user(
    state: &AppState,
    provider: Provider,
    identity: &ProviderIdentity,
) -> AppResult<User> {
    let existing = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE provider = $1 AND provider_user_id = $2",
    )
    .bind(provider.as_str())
    .bind(&identity.provider_user_id)
    .fetch_optional(&state.db)
    .await?;
    if let Some(user) = existing {
        return Ok(user);
    }

    // Link to an existing local account with the same email, if any.
    let by_email = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET provider = $2, provider_user_id = $3, updated_at = NOW()
        WHERE email = $1
        RETURNING *
        "#,
    )
    .bind(&identity.email)
    .bind(provider.as_str())
    .bind(&identity.provider_user_id)
    .fetch_optional(&state.db)
    .await?;
    if let Some(user) = by_email {
        return Ok(user);
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, full_name, provider, provider_user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&identity.email)
    .bind(&identity.full_name)
    .bind(provider.as_str())
    .bind(&identity.provider_user_id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, provider = provider.as_str(), "Created user from OAuth login");
    Ok(user)
}

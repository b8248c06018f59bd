use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::response::ApiResponse;
use crate::services::aggregate::{self, TagCount};
use crate::AppState;

/// Structured insight contract requested from the completion service.
/// Any reply that fails to parse degrades to the zero value instead of
/// erroring; only transport/status failures surface to the caller.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JournalInsights {
    #[serde(default)]
    pub mood_summary: String,
    #[serde(default)]
    pub focus_score: i32,
    #[serde(default)]
    pub top_keywords: Vec<String>,
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<JournalInsights>>> {
    let contents = sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT content FROM journal_entries
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let entries: Vec<String> = contents.into_iter().flatten().collect();
    if entries.is_empty() {
        return Err(AppError::NotFound("No journal entries found.".into()));
    }

    // Most recent entries first; keep the tail within the context budget.
    let combined = entries.join("\n");
    let mut tail_start = combined.len().saturating_sub(4000);
    while !combined.is_char_boundary(tail_start) {
        tail_start += 1;
    }
    let combined = &combined[tail_start..];

    let prompt = format!(
        r#"You are a journal analysis assistant. Analyze the following journal content and reply with ONLY a JSON object of this exact shape:
{{"mood_summary": "<one sentence describing the overall mood>", "focus_score": <integer 0-100 for how focused and productive the text sounds>, "top_keywords": ["<up to 5 frequent keywords>"]}}

Journal content:
{combined}"#
    );

    let insights = call_completion(&state, &prompt).await?;
    Ok(Json(ApiResponse::ok(
        "Insights generated successfully.",
        insights,
    )))
}

async fn call_completion(state: &AppState, prompt: &str) -> AppResult<JournalInsights> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(anyhow::Error::from)?;

    let response = client
        .post(format!(
            "{}/chat/completions",
            state.config.openai_base_url
        ))
        .bearer_auth(&state.config.openai_api_key)
        .json(&serde_json::json!({
            "model": state.config.openai_model,
            "temperature": 0.7,
            "messages": [{ "role": "user", "content": prompt }],
        }))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Completion service unreachable: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::warn!(%status, "Completion service returned an error");
        return Err(AppError::Upstream(format!(
            "Completion service error: {status}"
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed completion response: {e}")))?;

    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("");

    Ok(parse_insights(text))
}

/// Tolerant parse: the model is asked for bare JSON but replies are
/// sometimes wrapped in code fences or prose. Anything unusable becomes
/// the zero-valued insight, never an error.
fn parse_insights(text: &str) -> JournalInsights {
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    };
    serde_json::from_str(candidate).unwrap_or_default()
}

/// Top-20 journal tag leaderboard.
pub async fn journal_tags(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
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

    let all_tags: Vec<String> = rows
        .iter()
        .flat_map(|r| aggregate::normalize_tags(r.tags.iter().map(String::as_str)))
        .collect();
    let top_tags: Vec<TagCount> = aggregate::rank_tag_counts(all_tags)
        .into_iter()
        .take(20)
        .collect();

    Ok(Json(ApiResponse::ok(
        "Tags fetched successfully.",
        serde_json::json!({ "top_tags": top_tags }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let out = parse_insights(
            r#"{"mood_summary": "upbeat", "focus_score": 74, "top_keywords": ["work", "gym"]}"#,
        );
        assert_eq!(out.mood_summary, "upbeat");
        assert_eq!(out.focus_score, 74);
        assert_eq!(out.top_keywords, vec!["work", "gym"]);
    }

    #[test]
    fn parses_fenced_json() {
        let out = parse_insights(
            "Here you go:\n```json\n{\"mood_summary\": \"calm\", \"focus_score\": 60, \"top_keywords\": []}\n```",
        );
        assert_eq!(out.mood_summary, "calm");
        assert_eq!(out.focus_score, 60);
    }

    #[test]
    fn malformed_reply_degrades_to_zero_values() {
        let out = parse_insights("Sorry, I can't help with that.");
        assert_eq!(out.mood_summary, "");
        assert_eq!(out.focus_score, 0);
        assert!(out.top_keywords.is_empty());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let out = parse_insights(r#"{"mood_summary": "tense"}"#);
        assert_eq!(out.mood_summary, "tense");
        assert_eq!(out.focus_score, 0);
        assert!(out.top_keywords.is_empty());
    }
}

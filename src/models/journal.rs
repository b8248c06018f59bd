use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::checkin::Mood;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub is_favorite: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJournalEntryRequest {
    pub title: String,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJournalEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub is_favorite: Option<bool>,
    pub tags: Option<Vec<String>>,
}

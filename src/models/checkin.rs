use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Daily mood on a four-point scale. The ordinal mapping in [`Mood::score`]
/// is the single source of truth for every aggregate that averages moods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Bad,
    Okay,
    Good,
    Great,
}

impl Mood {
    /// Ordinal value used for averaging: bad=1, okay=2, good=3, great=4.
    pub fn score(self) -> i32 {
        match self {
            Mood::Bad => 1,
            Mood::Okay => 2,
            Mood::Good => 3,
            Mood::Great => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Bad => "bad",
            Mood::Okay => "okay",
            Mood::Good => "good",
            Mood::Great => "great",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub tags: Vec<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckInRequest {
    pub date: NaiveDate,
    pub mood: Mood,
    pub focus_percent: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCheckInRequest {
    pub mood: Option<Mood>,
    pub focus_percent: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckInQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Derived streak state. The backing `user_streaks` row is maintained by a
/// conditional upsert on every check-in insert; this is the read shape.
#[derive(Debug, Serialize, PartialEq)]
pub struct StreakOut {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_checkin_date: Option<NaiveDate>,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "goal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal: String,
    pub target_days: i32,
    pub completed_days: i32,
    pub status: GoalStatus,
    pub created_at: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub goal: String,
    pub target_days: i32,
}

#[derive(Debug, Serialize)]
pub struct GoalOut {
    pub goal: String,
    pub target_days: i32,
    pub completed_days: i32,
    pub status: GoalStatus,
    pub created_at: NaiveDate,
}

impl From<Goal> for GoalOut {
    fn from(g: Goal) -> Self {
        Self {
            goal: g.goal,
            target_days: g.target_days,
            completed_days: g.completed_days,
            status: g.status,
            created_at: g.created_at,
        }
    }
}

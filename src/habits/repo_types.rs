use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "habit_category", rename_all = "lowercase")]
pub enum HabitCategory {
    Health,
    Finance,
    Personal,
    Work,
    Hobby,
    Study,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub is_public: bool,
    pub track_time: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A recorded instance of doing a habit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct HabitCompletion {
    pub id: i64,
    pub habit_id: i64,
    pub user_id: i64, // denormalized from the habit
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    pub time_spent: Option<i32>, // minutes, only for track_time habits
    pub points_earned: i32,
}

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub is_public: bool,
    pub track_time: bool,
}

/// Partial update. `None` leaves the column untouched; `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct HabitChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<HabitCategory>,
    pub is_public: Option<bool>,
    pub track_time: Option<bool>,
}

impl HabitChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.is_public.is_none()
            && self.track_time.is_none()
    }
}

pub const POINTS_PER_COMPLETION: i32 = 1;

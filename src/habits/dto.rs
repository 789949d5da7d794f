use serde::{Deserialize, Deserializer};

use super::repo_types::{HabitCategory, HabitChanges, NewHabit};

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: HabitCategory,
    pub is_public: bool,
    pub track_time: bool,
}

impl From<CreateHabitRequest> for NewHabit {
    fn from(r: CreateHabitRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            category: r.category,
            is_public: r.is_public,
            track_time: r.track_time,
        }
    }
}

/// Absent fields stay untouched. `"description": null` clears the description.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHabitRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<HabitCategory>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub track_time: Option<bool>,
}

// Only called when the key exists, so `null` becomes `Some(None)`.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl From<UpdateHabitRequest> for HabitChanges {
    fn from(r: UpdateHabitRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            category: r.category,
            is_public: r.is_public,
            track_time: r.track_time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteHabitRequest {
    /// Minutes spent; only accepted for habits with `track_time`.
    #[serde(default)]
    pub time_spent: Option<i32>,
}

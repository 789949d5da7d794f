//! In-memory [`Store`] used by the test suite in place of PostgreSQL.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    habits::{
        repo::HabitStore,
        repo_types::{Habit, HabitChanges, HabitCompletion, NewHabit},
    },
    storage::{Store, StoreError, StoreResult, UniqueField},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    habits: Vec<Habit>,
    completions: Vec<HabitCompletion>,
    next_user_id: i64,
    next_habit_id: i64,
    next_completion_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn completion_count(&self) -> usize {
        self.tables.lock().await.completions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().any(|u| u.username == username))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        let row = User {
            id: next(&mut t.next_user_id),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl HabitStore for MemoryStore {
    async fn list_habits(&self, owner_id: i64) -> StoreResult<Vec<Habit>> {
        let t = self.tables.lock().await;
        Ok(t.habits
            .iter()
            .filter(|h| h.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>> {
        let t = self.tables.lock().await;
        Ok(t.habits
            .iter()
            .find(|h| h.id == habit_id && h.user_id == owner_id)
            .cloned())
    }

    async fn insert_habit(&self, owner_id: i64, habit: NewHabit) -> StoreResult<Habit> {
        let mut t = self.tables.lock().await;
        let now = OffsetDateTime::now_utc();
        let row = Habit {
            id: next(&mut t.next_habit_id),
            user_id: owner_id,
            title: habit.title,
            description: habit.description,
            category: habit.category,
            is_public: habit.is_public,
            track_time: habit.track_time,
            created_at: now,
            updated_at: now,
        };
        t.habits.push(row.clone());
        Ok(row)
    }

    async fn update_habit(
        &self,
        owner_id: i64,
        habit_id: i64,
        changes: HabitChanges,
    ) -> StoreResult<Option<Habit>> {
        let mut t = self.tables.lock().await;
        let Some(h) = t
            .habits
            .iter_mut()
            .find(|h| h.id == habit_id && h.user_id == owner_id)
        else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            h.title = title;
        }
        if let Some(description) = changes.description {
            h.description = description;
        }
        if let Some(category) = changes.category {
            h.category = category;
        }
        if let Some(is_public) = changes.is_public {
            h.is_public = is_public;
        }
        if let Some(track_time) = changes.track_time {
            h.track_time = track_time;
        }
        h.updated_at = OffsetDateTime::now_utc();
        Ok(Some(h.clone()))
    }

    async fn delete_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>> {
        let mut t = self.tables.lock().await;
        let Some(pos) = t
            .habits
            .iter()
            .position(|h| h.id == habit_id && h.user_id == owner_id)
        else {
            return Ok(None);
        };
        let removed = t.habits.remove(pos);
        t.completions.retain(|c| c.habit_id != habit_id);
        Ok(Some(removed))
    }

    async fn insert_completion(
        &self,
        owner_id: i64,
        habit_id: i64,
        time_spent: Option<i32>,
        points: i32,
    ) -> StoreResult<Option<HabitCompletion>> {
        let mut t = self.tables.lock().await;
        if !t.habits.iter().any(|h| {
            h.id == habit_id && h.user_id == owner_id && (time_spent.is_none() || h.track_time)
        }) {
            return Ok(None);
        }
        let row = HabitCompletion {
            id: next(&mut t.next_completion_id),
            habit_id,
            user_id: owner_id,
            completed_at: OffsetDateTime::now_utc(),
            time_spent,
            points_earned: points,
        };
        t.completions.push(row.clone());
        Ok(Some(row))
    }

    async fn list_completions(
        &self,
        owner_id: i64,
        habit_id: i64,
    ) -> StoreResult<Vec<HabitCompletion>> {
        let t = self.tables.lock().await;
        Ok(t.completions
            .iter()
            .rev()
            .filter(|c| c.habit_id == habit_id && c.user_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

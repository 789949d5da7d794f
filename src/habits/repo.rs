use async_trait::async_trait;

use crate::{
    db::PgStore,
    habits::repo_types::{Habit, HabitChanges, HabitCompletion, NewHabit},
    storage::StoreResult,
};

/// Habit persistence. Every query filters on the owner, so a habit belonging
/// to someone else is indistinguishable from one that does not exist.
#[async_trait]
pub trait HabitStore: Send + Sync {
    async fn list_habits(&self, owner_id: i64) -> StoreResult<Vec<Habit>>;
    async fn find_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>>;
    async fn insert_habit(&self, owner_id: i64, habit: NewHabit) -> StoreResult<Habit>;
    async fn update_habit(
        &self,
        owner_id: i64,
        habit_id: i64,
        changes: HabitChanges,
    ) -> StoreResult<Option<Habit>>;
    /// Removes the habit together with its completions.
    async fn delete_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>>;
    /// `None` when the habit is not the owner's, or when `time_spent` is set
    /// and the habit does not track time.
    async fn insert_completion(
        &self,
        owner_id: i64,
        habit_id: i64,
        time_spent: Option<i32>,
        points: i32,
    ) -> StoreResult<Option<HabitCompletion>>;
    /// Newest first.
    async fn list_completions(
        &self,
        owner_id: i64,
        habit_id: i64,
    ) -> StoreResult<Vec<HabitCompletion>>;
}

const HABIT_COLUMNS: &str =
    "id, user_id, title, description, category, is_public, track_time, created_at, updated_at";

const COMPLETION_COLUMNS: &str = "id, habit_id, user_id, completed_at, time_spent, points_earned";

#[async_trait]
impl HabitStore for PgStore {
    async fn list_habits(&self, owner_id: i64) -> StoreResult<Vec<Habit>> {
        let rows = sqlx::query_as::<_, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>> {
        let row = sqlx::query_as::<_, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1 AND user_id = $2"
        ))
        .bind(habit_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_habit(&self, owner_id: i64, habit: NewHabit) -> StoreResult<Habit> {
        let row = sqlx::query_as::<_, Habit>(&format!(
            r#"
            INSERT INTO habits (user_id, title, description, category, is_public, track_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {HABIT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&habit.title)
        .bind(&habit.description)
        .bind(habit.category)
        .bind(habit.is_public)
        .bind(habit.track_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_habit(
        &self,
        owner_id: i64,
        habit_id: i64,
        changes: HabitChanges,
    ) -> StoreResult<Option<Habit>> {
        let (set_description, description) = match changes.description {
            Some(d) => (true, d),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, Habit>(&format!(
            r#"
            UPDATE habits
               SET title       = COALESCE($3, title),
                   description = CASE WHEN $4 THEN $5 ELSE description END,
                   category    = COALESCE($6, category),
                   is_public   = COALESCE($7, is_public),
                   track_time  = COALESCE($8, track_time),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {HABIT_COLUMNS}
            "#
        ))
        .bind(habit_id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(set_description)
        .bind(description)
        .bind(changes.category)
        .bind(changes.is_public)
        .bind(changes.track_time)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_habit(&self, owner_id: i64, habit_id: i64) -> StoreResult<Option<Habit>> {
        // habit_completions rows go with it via ON DELETE CASCADE
        let row = sqlx::query_as::<_, Habit>(&format!(
            "DELETE FROM habits WHERE id = $1 AND user_id = $2 RETURNING {HABIT_COLUMNS}"
        ))
        .bind(habit_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_completion(
        &self,
        owner_id: i64,
        habit_id: i64,
        time_spent: Option<i32>,
        points: i32,
    ) -> StoreResult<Option<HabitCompletion>> {
        let row = sqlx::query_as::<_, HabitCompletion>(&format!(
            r#"
            INSERT INTO habit_completions (habit_id, user_id, time_spent, points_earned)
            SELECT id, user_id, $3, $4
              FROM habits
             WHERE id = $1 AND user_id = $2 AND ($3::int IS NULL OR track_time)
            RETURNING {COMPLETION_COLUMNS}
            "#
        ))
        .bind(habit_id)
        .bind(owner_id)
        .bind(time_spent)
        .bind(points)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_completions(
        &self,
        owner_id: i64,
        habit_id: i64,
    ) -> StoreResult<Vec<HabitCompletion>> {
        let rows = sqlx::query_as::<_, HabitCompletion>(&format!(
            r#"
            SELECT {COMPLETION_COLUMNS}
              FROM habit_completions
             WHERE habit_id = $1 AND user_id = $2
             ORDER BY completed_at DESC, id DESC
            "#
        ))
        .bind(habit_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

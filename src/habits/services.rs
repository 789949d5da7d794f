use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult, FieldError},
    habits::repo_types::{Habit, HabitChanges, HabitCompletion, NewHabit, POINTS_PER_COMPLETION},
    storage::Store,
};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 200;

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.is_empty() {
        errors.push(FieldError::body("title", "title is required"));
    } else if title.chars().count() > TITLE_MAX {
        errors.push(FieldError::body(
            "title",
            format!("title must be at most {TITLE_MAX} characters"),
        ));
    }
}

fn check_description(description: &str, errors: &mut Vec<FieldError>) {
    if description.chars().count() > DESCRIPTION_MAX {
        errors.push(FieldError::body(
            "description",
            format!("description must be at most {DESCRIPTION_MAX} characters"),
        ));
    }
}

/// Blank descriptions are stored as NULL.
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn finish(errors: Vec<FieldError>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list(store: &dyn Store, owner_id: i64) -> AppResult<Vec<Habit>> {
    Ok(store.list_habits(owner_id).await?)
}

pub async fn get(store: &dyn Store, owner_id: i64, habit_id: i64) -> AppResult<Option<Habit>> {
    Ok(store.find_habit(owner_id, habit_id).await?)
}

pub async fn create(store: &dyn Store, owner_id: i64, mut habit: NewHabit) -> AppResult<Habit> {
    habit.title = habit.title.trim().to_string();
    habit.description = clean_description(habit.description);

    let mut errors = Vec::new();
    check_title(&habit.title, &mut errors);
    if let Some(d) = &habit.description {
        check_description(d, &mut errors);
    }
    finish(errors)?;

    let habit = store.insert_habit(owner_id, habit).await?;
    info!(habit_id = habit.id, owner_id, "habit created");
    Ok(habit)
}

/// Applies only the fields present in `changes`.
pub async fn update(
    store: &dyn Store,
    owner_id: i64,
    habit_id: i64,
    mut changes: HabitChanges,
) -> AppResult<Option<Habit>> {
    changes.title = changes.title.map(|t| t.trim().to_string());
    changes.description = changes.description.map(clean_description);

    let mut errors = Vec::new();
    if let Some(t) = &changes.title {
        check_title(t, &mut errors);
    }
    if let Some(Some(d)) = &changes.description {
        check_description(d, &mut errors);
    }
    finish(errors)?;

    if changes.is_empty() {
        debug!(habit_id, "empty update");
        return get(store, owner_id, habit_id).await;
    }
    Ok(store.update_habit(owner_id, habit_id, changes).await?)
}

pub async fn delete(store: &dyn Store, owner_id: i64, habit_id: i64) -> AppResult<Option<Habit>> {
    let deleted = store.delete_habit(owner_id, habit_id).await?;
    if deleted.is_some() {
        info!(habit_id, owner_id, "habit deleted");
    }
    Ok(deleted)
}

fn untracked_time_spent() -> AppError {
    AppError::field(
        "time_spent",
        "time_spent is only accepted for habits with track_time enabled",
    )
}

/// Records one completion worth [`POINTS_PER_COMPLETION`].
///
/// The insert itself enforces ownership and the `track_time` rule; the reads
/// around it only pick which error to report.
pub async fn complete(
    store: &dyn Store,
    owner_id: i64,
    habit_id: i64,
    time_spent: Option<i32>,
) -> AppResult<Option<HabitCompletion>> {
    let Some(habit) = store.find_habit(owner_id, habit_id).await? else {
        return Ok(None);
    };
    if let Some(minutes) = time_spent {
        if !habit.track_time {
            return Err(untracked_time_spent());
        }
        if minutes <= 0 {
            return Err(AppError::field("time_spent", "time_spent must be positive"));
        }
    }

    match store
        .insert_completion(owner_id, habit_id, time_spent, POINTS_PER_COMPLETION)
        .await?
    {
        Some(c) => {
            info!(habit_id, owner_id, completion_id = c.id, "habit completed");
            Ok(Some(c))
        }
        // changed between the read and the insert: deleted, or track_time turned off
        None => match store.find_habit(owner_id, habit_id).await? {
            Some(_) => Err(untracked_time_spent()),
            None => Ok(None),
        },
    }
}

pub async fn list_completions(
    store: &dyn Store,
    owner_id: i64,
    habit_id: i64,
) -> AppResult<Option<Vec<HabitCompletion>>> {
    if store.find_habit(owner_id, habit_id).await?.is_none() {
        return Ok(None);
    }
    Ok(Some(store.list_completions(owner_id, habit_id).await?))
}

use async_trait::async_trait;

use crate::{auth::repo::UserStore, habits::repo::HabitStore};

/// Column guarded by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("23505") {
                match db.constraint() {
                    Some(c) if c.contains("username") => {
                        return Self::Duplicate(UniqueField::Username)
                    }
                    Some(c) if c.contains("email") => return Self::Duplicate(UniqueField::Email),
                    _ => {}
                }
            }
        }
        match e {
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed) => Self::Unavailable(format!("Database unreachable: {e}")),
            e => Self::Database(e),
        }
    }
}

/// Everything the services need from persistence.
#[async_trait]
pub trait Store: UserStore + HabitStore {
    /// Round-trips to the backing database.
    async fn ping(&self) -> StoreResult<()>;
}

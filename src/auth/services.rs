use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        password::{hash_password, verify_password, verify_password_against_dummy},
        repo_types::{NewUser, User},
    },
    error::{AppError, AppResult, FieldError},
    storage::Store,
};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(email: &str, username: &str, password: &str) -> AppResult<()> {
    let mut errors = Vec::new();
    if !is_valid_email(email) {
        errors.push(FieldError::body("email", "value is not a valid email address"));
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        errors.push(FieldError::body(
            "username",
            format!("username must be {USERNAME_MIN}-{USERNAME_MAX} characters"),
        ));
    }
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        errors.push(FieldError::body(
            "password",
            format!("password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn check_email_available(store: &dyn Store, email: &str) -> AppResult<bool> {
    Ok(store
        .find_user_by_email(&normalize_email(email))
        .await?
        .is_none())
}

pub async fn check_username_available(store: &dyn Store, username: &str) -> AppResult<bool> {
    Ok(!store.username_exists(username.trim()).await?)
}

pub async fn find_by_email(store: &dyn Store, email: &str) -> AppResult<Option<User>> {
    Ok(store.find_user_by_email(&normalize_email(email)).await?)
}

/// Creates a user. Uniqueness is checked email first, then username, and
/// both before the password is hashed.
pub async fn register(
    store: &dyn Store,
    email: &str,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let email = normalize_email(email);
    let username = username.trim();
    validate_registration(&email, username, password)?;

    if !check_email_available(store, &email).await? {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if !check_username_available(store, username).await? {
        warn!(%username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let password_hash = hash_password(password)?;
    let user = store
        .insert_user(NewUser {
            email,
            username: username.to_string(),
            password_hash,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// `None` for an unknown email and for a wrong password alike.
pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = find_by_email(store, email).await? else {
        warn!("login for unknown email");
        verify_password_against_dummy(password);
        return Ok(None);
    };
    if !verify_password(password, &user.password_hash) {
        warn!(user_id = user.id, "login with wrong password");
        return Ok(None);
    }
    Ok(Some(user))
}

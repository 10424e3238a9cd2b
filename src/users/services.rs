use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    repo::UserRepository,
    repo_types::{NewUser, User},
};
use crate::{
    auth::password::{hash_password, verify_password},
    error::AppError,
};

const MAX_FIELD_LEN: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_full_name(full_name: &str) -> Result<String, AppError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::validation("User must have full name"));
    }
    if full_name.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::validation("full_name is too long"));
    }
    Ok(full_name.to_string())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::validation("User must have a password"));
    }
    Ok(())
}

/// Validates, normalizes and persists a new user. The password is stored only
/// as an Argon2 hash.
pub async fn create_user(repo: &dyn UserRepository, new: NewUser) -> Result<User, AppError> {
    let full_name = validate_full_name(&new.full_name)?;
    let email = normalize_email(&new.email);
    if email.is_empty() {
        return Err(AppError::validation("User must have an email address"));
    }
    if email.chars().count() > MAX_FIELD_LEN || !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    validate_password(&new.password)?;

    let password_hash = hash_password(&new.password)?;
    let user = User {
        id: Uuid::new_v4(),
        email,
        full_name,
        password_hash,
        active: new.active,
        staff: new.staff,
        admin: new.admin,
        created_at: OffsetDateTime::now_utc(),
    };
    let user = repo.insert(&user).await?;
    info!(user_id = %user.id, email = %user.email, staff = user.staff, admin = user.admin, "user created");
    Ok(user)
}

pub async fn create_staff_user(
    repo: &dyn UserRepository,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let new = NewUser {
        staff: true,
        ..NewUser::new(full_name, email, password)
    };
    create_user(repo, new).await
}

pub async fn create_superuser(
    repo: &dyn UserRepository,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let new = NewUser {
        staff: true,
        admin: true,
        ..NewUser::new(full_name, email, password)
    };
    create_user(repo, new).await
}

/// Checks credentials. Unknown email, wrong password and inactive accounts all
/// fail the same way.
pub async fn authenticate(
    repo: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    let Some(user) = repo.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }
    if !user.active {
        warn!(user_id = %user.id, "login inactive user");
        return Err(AppError::unauthorized("Invalid credentials"));
    }
    Ok(user)
}

pub async fn update_profile(
    repo: &dyn UserRepository,
    id: Uuid,
    full_name: Option<&str>,
    password: Option<&str>,
) -> Result<User, AppError> {
    let full_name = full_name.map(validate_full_name).transpose()?;
    let password_hash = match password {
        Some(p) => {
            validate_password(p)?;
            Some(hash_password(p)?)
        }
        None => None,
    };
    repo.update_profile(id, full_name.as_deref(), password_hash.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

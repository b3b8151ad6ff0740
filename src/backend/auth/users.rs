/**
 * User Model and Database Operations
 *
 * This module handles user rows and the queries over them. Functions take
 * any `PgExecutor` so they run on the pool or inside a transaction.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, user_name, email, first_name, last_name, password_hash, \
     is_active, is_staff, is_superuser, created_at, updated_at";

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Login name (unique, 5-30 ASCII letters or digits)
    pub user_name: String,
    /// User email address (unique)
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Hashed password (bcrypt)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// False until the email address is verified
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub user_name: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

/// Create a new, inactive user
pub async fn create_user<'e, E: PgExecutor<'e>>(
    executor: E,
    new_user: NewUser<'_>,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, user_name, email, first_name, last_name, password_hash, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $7)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new_user.user_name)
    .bind(new_user.email)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(new_user.password_hash)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Get user by ID
pub async fn get_user_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Get user by user name
pub async fn get_user_by_user_name<'e, E: PgExecutor<'e>>(
    executor: E,
    user_name: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = $1"))
        .bind(user_name)
        .fetch_optional(executor)
        .await
}

/// Get user by email
pub async fn get_user_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// All users, oldest first
pub async fn list_users<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
        .fetch_all(executor)
        .await
}

/// Mark a user's email as verified
pub async fn activate_user<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET is_active = TRUE, updated_at = $2
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

/// Grant or revoke staff rights
///
/// There is no API for this; operators and tests call it directly.
pub async fn set_staff<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    is_staff: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_staff = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(is_staff)
        .execute(executor)
        .await?;
    Ok(())
}

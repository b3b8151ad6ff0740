/**
 * Database Operations for Conversations and Messages
 *
 * This module provides the queries behind conversations, their members
 * and their messages. Deleting a conversation cascades to both.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::backend::auth::users::User;

/// Row of `conversations`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of `messages`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create a conversation
///
/// # Arguments
/// * `executor` - Pool or transaction
/// * `title` - Conversation title (already validated)
/// * `owner_id` - Owning user
///
/// # Returns
/// The new conversation. The owner is not added as a member here.
pub async fn create_conversation<'e, E: PgExecutor<'e>>(
    executor: E,
    title: &str,
    owner_id: Uuid,
) -> Result<Conversation, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (id, title, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id, title, owner_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(owner_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Get conversation by ID
pub async fn get_conversation<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, title, owner_id, created_at, updated_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Conversations a user is a member of, newest first
pub async fn list_conversations_for_member<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT c.id, c.title, c.owner_id, c.created_at, c.updated_at
        FROM conversations c
        JOIN conversation_members m ON m.conversation_id = c.id
        WHERE m.user_id = $1
        ORDER BY c.created_at DESC, c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Number of conversations a user owns
pub async fn count_owned_conversations<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(executor)
        .await
}

/// Delete a conversation with its members and messages
///
/// # Returns
/// `true` if a row was deleted
pub async fn delete_conversation<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Add a member to a conversation
///
/// # Returns
/// `false` if the user already was a member
pub async fn add_member<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO conversation_members (conversation_id, user_id, joined_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (conversation_id, user_id) DO NOTHING
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Add every id in `user_ids` that names an existing user
///
/// # Returns
/// Number of members added
pub async fn add_existing_members<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    user_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO conversation_members (conversation_id, user_id, joined_at)
        SELECT $1, u.id, NOW()
        FROM users u
        WHERE u.id = ANY($2)
        ON CONFLICT (conversation_id, user_id) DO NOTHING
        "#,
    )
    .bind(conversation_id)
    .bind(user_ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Whether `user_id` is a member of the conversation
pub async fn is_member<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM conversation_members
            WHERE conversation_id = $1 AND user_id = $2
        )
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Members of a conversation, owner first, then in joining order
pub async fn list_members<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.user_name, u.email, u.first_name, u.last_name, u.password_hash,
               u.is_active, u.is_staff, u.is_superuser, u.created_at, u.updated_at
        FROM users u
        JOIN conversation_members m ON m.user_id = u.id
        JOIN conversations c ON c.id = m.conversation_id
        WHERE m.conversation_id = $1
        ORDER BY u.id = c.owner_id DESC, m.joined_at, u.user_name
        "#,
    )
    .bind(conversation_id)
    .fetch_all(executor)
    .await
}

/// Save a message
pub async fn create_message<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> Result<Message, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, text, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id, conversation_id, sender_id, text, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(sender_id)
    .bind(text)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Messages of a conversation, oldest first
pub async fn list_messages<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_id, text, created_at, updated_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(conversation_id)
    .fetch_all(executor)
    .await
}

/**
 * Conversation and Message Rules
 *
 * Membership and ownership checks plus subscription limits, in front of
 * the queries in `chat::db`. Ids arrive as strings from the API; an id
 * that is not a UUID is treated like an unknown one.
 *
 * # Checks
 *
 * - Reading a conversation or its messages requires membership
 * - Sending requires the plan's character limit first, then membership
 * - Deleting and adding members require ownership
 * - Creating counts against the plan's conversation limit
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::subscription::service as subscriptions;
use crate::shared::limits;
use crate::shared::validation::validate_title;

use super::db::{self, Conversation, Message};

pub const CONVERSATION_NOT_FOUND: &str = "Conversation not found";
pub const ACCESS_DENIED: &str = "Access denied";

/// Result of `create_conversation`
#[derive(Debug, Clone)]
pub struct CreatedConversation {
    pub conversation: Conversation,
    /// Warning when the plan's conversation limit is close
    pub alert: Option<&'static str>,
}

/// Result of `add_user_to_conversation`
#[derive(Debug, Clone)]
pub struct AddUserOutcome {
    pub success: bool,
    pub message: &'static str,
    pub conversation: Conversation,
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

async fn find_conversation(pool: &PgPool, conversation_id: &str) -> BackendResult<Conversation> {
    let Some(id) = parse_id(conversation_id) else {
        return Err(BackendError::not_found(CONVERSATION_NOT_FOUND));
    };
    db::get_conversation(pool, id)
        .await?
        .ok_or_else(|| BackendError::not_found(CONVERSATION_NOT_FOUND))
}

async fn find_owned_conversation(
    pool: &PgPool,
    user: &User,
    conversation_id: &str,
    denied: &'static str,
) -> BackendResult<Conversation> {
    let conversation = find_conversation(pool, conversation_id).await?;
    if conversation.owner_id != user.id {
        tracing::warn!("User {} is not the owner of conversation {}", user.id, conversation.id);
        return Err(BackendError::forbidden(denied));
    }
    Ok(conversation)
}

/// Conversations the user belongs to, newest first
pub async fn list_conversations(pool: &PgPool, user: &User) -> BackendResult<Vec<Conversation>> {
    Ok(db::list_conversations_for_member(pool, user.id).await?)
}

/// A conversation the user belongs to
pub async fn get_conversation(
    pool: &PgPool,
    user: &User,
    conversation_id: &str,
) -> BackendResult<Conversation> {
    let conversation = find_conversation(pool, conversation_id).await?;
    if !db::is_member(pool, conversation.id, user.id).await? {
        tracing::warn!("User {} denied access to conversation {}", user.id, conversation.id);
        return Err(BackendError::forbidden(ACCESS_DENIED));
    }
    Ok(conversation)
}

/// Messages of a conversation the user belongs to, oldest first
pub async fn list_messages(
    pool: &PgPool,
    user: &User,
    conversation_id: &str,
) -> BackendResult<Vec<Message>> {
    let conversation = get_conversation(pool, user, conversation_id).await?;
    Ok(db::list_messages(pool, conversation.id).await?)
}

/// Create a conversation owned by `user`
///
/// The owner is always a member. Entries of `member_ids` that are not
/// the id of an existing user are skipped.
pub async fn create_conversation(
    pool: &PgPool,
    user: &User,
    title: &str,
    member_ids: &[String],
) -> BackendResult<CreatedConversation> {
    let mut tx = pool.begin().await?;

    let (check, plan) = subscriptions::lock_conversation_quota(&mut tx, user.id).await?;
    if !check.allowed {
        tracing::warn!(
            "User {} hit the conversation limit of plan '{}'",
            user.id,
            plan.name
        );
        return Err(BackendError::limit(format!(
            "You have reached your maximum conversation limit. Your plan allows {} conversations.",
            plan.max_conversations
        )));
    }

    validate_title(title)?;

    let conversation = db::create_conversation(&mut *tx, title, user.id).await?;
    db::add_member(&mut *tx, conversation.id, user.id).await?;

    let extra: Vec<Uuid> = member_ids.iter().filter_map(|id| parse_id(id)).collect();
    if !extra.is_empty() {
        db::add_existing_members(&mut *tx, conversation.id, &extra).await?;
    }

    tx.commit().await?;

    tracing::info!("User {} created conversation {}", user.id, conversation.id);
    Ok(CreatedConversation {
        conversation,
        alert: limits::conversation_alert(check.remaining),
    })
}

/// Post a message to a conversation the user belongs to
pub async fn send_message(
    pool: &PgPool,
    user: &User,
    conversation_id: &str,
    text: &str,
) -> BackendResult<Message> {
    let mut conn = pool.acquire().await?;
    let (check, plan) =
        subscriptions::check_message_limits(&mut conn, user.id, limits::message_length(text)).await?;
    drop(conn);

    if !check.allowed {
        tracing::warn!("User {} exceeded the character limit of plan '{}'", user.id, plan.name);
        return Err(BackendError::limit(format!(
            "Your message exceeds your character limit. out of {}.",
            plan.max_characters
        )));
    }

    let conversation = get_conversation(pool, user, conversation_id).await?;
    let message = db::create_message(pool, conversation.id, user.id, text).await?;

    tracing::debug!("User {} sent message {} to {}", user.id, message.id, conversation.id);
    Ok(message)
}

/// Delete a conversation the user owns
pub async fn delete_conversation(
    pool: &PgPool,
    user: &User,
    conversation_id: &str,
) -> BackendResult<()> {
    let conversation = find_owned_conversation(
        pool,
        user,
        conversation_id,
        "Permission denied: Only the owner can delete this conversation",
    )
    .await?;

    db::delete_conversation(pool, conversation.id).await?;
    tracing::info!("User {} deleted conversation {}", user.id, conversation.id);
    Ok(())
}

/// Add another user to a conversation the caller owns
///
/// An unknown user or an existing member is reported through the outcome,
/// not as an error.
pub async fn add_user_to_conversation(
    pool: &PgPool,
    owner: &User,
    conversation_id: &str,
    user_id: &str,
) -> BackendResult<AddUserOutcome> {
    let conversation = find_owned_conversation(
        pool,
        owner,
        conversation_id,
        "Permission denied: Only the owner can add users to this conversation",
    )
    .await?;

    let outcome = |success, message| AddUserOutcome {
        success,
        message,
        conversation: conversation.clone(),
    };

    let user = match parse_id(user_id) {
        Some(id) => crate::backend::auth::users::get_user_by_id(pool, id).await?,
        None => None,
    };
    let Some(user) = user else {
        return Ok(outcome(false, "User not found"));
    };

    if !db::add_member(pool, conversation.id, user.id).await? {
        return Ok(outcome(false, "User is already a member of this conversation"));
    }

    tracing::info!("User {} added to conversation {}", user.id, conversation.id);
    Ok(outcome(true, "User has been added to the conversation"))
}

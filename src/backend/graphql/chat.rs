//! Conversation and message queries and mutations
//!
//! Every operation here requires an authenticated caller.

use async_graphql::{Context, FieldResult, Object, SimpleObject, ID};

use crate::backend::chat::service as chat;
use crate::backend::error::GraphQLResultExt;

use super::schema::{current_user, GraphQLContext};
use super::types::{ConversationType, MessageType};

#[derive(SimpleObject)]
pub struct CreateConversationPayload {
    pub conversation: ConversationType,
    /// Set when the caller is at or one below the plan's conversation limit
    pub alert: Option<String>,
}

#[derive(SimpleObject)]
pub struct SendMessagePayload {
    pub message: MessageType,
}

#[derive(SimpleObject)]
pub struct DeleteConversationPayload {
    pub success: bool,
    pub message: String,
}

#[derive(SimpleObject)]
pub struct AddUserToConversationPayload {
    pub success: bool,
    pub message: String,
    pub conversation: ConversationType,
}

#[derive(Default)]
pub struct ChatQuery;

#[Object]
impl ChatQuery {
    /// Conversations the caller is a member of, newest first
    async fn conversations(&self, ctx: &Context<'_>) -> FieldResult<Vec<ConversationType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let conversations = chat::list_conversations(&context.pool, &user).await.graphql()?;
        Ok(conversations.into_iter().map(ConversationType::from).collect())
    }

    async fn conversation(&self, ctx: &Context<'_>, id: ID) -> FieldResult<ConversationType> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let conversation = chat::get_conversation(&context.pool, &user, &id).await.graphql()?;
        Ok(conversation.into())
    }

    async fn messages(
        &self,
        ctx: &Context<'_>,
        conversation_id: ID,
    ) -> FieldResult<Vec<MessageType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let messages = chat::list_messages(&context.pool, &user, &conversation_id)
            .await
            .graphql()?;
        Ok(messages.into_iter().map(MessageType::from).collect())
    }
}

#[derive(Default)]
pub struct ChatMutation;

#[Object]
impl ChatMutation {
    async fn create_conversation(
        &self,
        ctx: &Context<'_>,
        title: String,
        member_ids: Option<Vec<ID>>,
    ) -> FieldResult<CreateConversationPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let member_ids: Vec<String> = member_ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.0)
            .collect();

        let created = chat::create_conversation(&context.pool, &user, &title, &member_ids)
            .await
            .graphql()?;

        Ok(CreateConversationPayload {
            conversation: created.conversation.into(),
            alert: created.alert.map(str::to_string),
        })
    }

    async fn send_message(
        &self,
        ctx: &Context<'_>,
        conversation_id: ID,
        text: String,
    ) -> FieldResult<SendMessagePayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let message = chat::send_message(&context.pool, &user, &conversation_id, &text)
            .await
            .graphql()?;
        Ok(SendMessagePayload { message: message.into() })
    }

    /// Delete a conversation with its members and messages (owner only)
    async fn delete_conversation(
        &self,
        ctx: &Context<'_>,
        conversation_id: ID,
    ) -> FieldResult<DeleteConversationPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        chat::delete_conversation(&context.pool, &user, &conversation_id)
            .await
            .graphql()?;

        Ok(DeleteConversationPayload {
            success: true,
            message: "Conversation deleted successfully".to_string(),
        })
    }

    async fn add_user_to_conversation(
        &self,
        ctx: &Context<'_>,
        conversation_id: ID,
        user_id: ID,
    ) -> FieldResult<AddUserToConversationPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let owner = current_user(ctx).await?;
        let outcome = chat::add_user_to_conversation(&context.pool, &owner, &conversation_id, &user_id)
            .await
            .graphql()?;

        Ok(AddUserToConversationPayload {
            success: outcome.success,
            message: outcome.message.to_string(),
            conversation: outcome.conversation.into(),
        })
    }
}

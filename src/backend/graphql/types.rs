//! GraphQL object types
//!
//! Thin wrappers over the database rows. Relations are resolved lazily, so
//! a query only pays for the fields it selects.

use async_graphql::{Context, FieldResult, Object, ID};
use chrono::{DateTime, Utc};

use crate::backend::auth::users::{self, User};
use crate::backend::chat::db::{self as chat_db, Conversation, Message};
use crate::backend::error::{BackendError, GraphQLResultExt};
use crate::backend::subscription::db::{SubscriptionPlan, UserSubscription};
use crate::backend::subscription::service as subscriptions;

use super::schema::GraphQLContext;

async fn user_by_id(ctx: &Context<'_>, id: uuid::Uuid) -> FieldResult<UserType> {
    let context = ctx.data::<GraphQLContext>()?;
    users::get_user_by_id(&context.pool, id)
        .await
        .graphql()?
        .map(UserType::from)
        .ok_or_else(|| BackendError::not_found("User not found").into_graphql())
}

#[derive(Clone)]
pub struct UserType {
    pub inner: User,
}

impl From<User> for UserType {
    fn from(user: User) -> Self {
        Self { inner: user }
    }
}

#[Object(name = "User")]
impl UserType {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn user_name(&self) -> &str {
        &self.inner.user_name
    }

    async fn email(&self) -> &str {
        &self.inner.email
    }

    async fn first_name(&self) -> &str {
        &self.inner.first_name
    }

    async fn last_name(&self) -> &str {
        &self.inner.last_name
    }

    /// False until the email address has been verified
    async fn is_active(&self) -> bool {
        self.inner.is_active
    }

    async fn is_staff(&self) -> bool {
        self.inner.is_staff
    }

    async fn is_superuser(&self) -> bool {
        self.inner.is_superuser
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[derive(Clone)]
pub struct ConversationType {
    pub inner: Conversation,
}

impl From<Conversation> for ConversationType {
    fn from(conversation: Conversation) -> Self {
        Self { inner: conversation }
    }
}

#[Object(name = "Conversation")]
impl ConversationType {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn owner(&self, ctx: &Context<'_>) -> FieldResult<UserType> {
        user_by_id(ctx, self.inner.owner_id).await
    }

    async fn members(&self, ctx: &Context<'_>) -> FieldResult<Vec<UserType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let members = chat_db::list_members(&context.pool, self.inner.id).await.graphql()?;
        Ok(members.into_iter().map(UserType::from).collect())
    }

    /// Messages in this conversation, oldest first
    async fn messages(&self, ctx: &Context<'_>) -> FieldResult<Vec<MessageType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let messages = chat_db::list_messages(&context.pool, self.inner.id).await.graphql()?;
        Ok(messages.into_iter().map(MessageType::from).collect())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[derive(Clone)]
pub struct MessageType {
    pub inner: Message,
}

impl From<Message> for MessageType {
    fn from(message: Message) -> Self {
        Self { inner: message }
    }
}

#[Object(name = "Message")]
impl MessageType {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn text(&self) -> &str {
        &self.inner.text
    }

    async fn sender(&self, ctx: &Context<'_>) -> FieldResult<UserType> {
        user_by_id(ctx, self.inner.sender_id).await
    }

    async fn conversation_id(&self) -> ID {
        ID(self.inner.conversation_id.to_string())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[derive(Clone)]
pub struct SubscriptionPlanType {
    pub inner: SubscriptionPlan,
}

impl From<SubscriptionPlan> for SubscriptionPlanType {
    fn from(plan: SubscriptionPlan) -> Self {
        Self { inner: plan }
    }
}

#[Object(name = "SubscriptionPlan")]
impl SubscriptionPlanType {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn description(&self) -> &str {
        &self.inner.description
    }

    /// Monthly price in currency units
    async fn price(&self) -> f64 {
        self.inner.price_cents as f64 / 100.0
    }

    async fn max_characters(&self) -> i32 {
        self.inner.max_characters
    }

    async fn max_conversations(&self) -> i32 {
        self.inner.max_conversations
    }

    async fn is_active(&self) -> bool {
        self.inner.is_active
    }

    async fn is_default(&self) -> bool {
        self.inner.is_default
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[derive(Clone)]
pub struct UserSubscriptionType {
    pub inner: UserSubscription,
}

impl From<UserSubscription> for UserSubscriptionType {
    fn from(subscription: UserSubscription) -> Self {
        Self { inner: subscription }
    }
}

#[Object(name = "UserSubscription")]
impl UserSubscriptionType {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn user(&self, ctx: &Context<'_>) -> FieldResult<UserType> {
        user_by_id(ctx, self.inner.user_id).await
    }

    async fn plan(&self, ctx: &Context<'_>) -> FieldResult<SubscriptionPlanType> {
        let context = ctx.data::<GraphQLContext>()?;
        let mut conn = context.pool.acquire().await.graphql()?;
        let plan = subscriptions::plan_for(&mut conn, &self.inner).await.graphql()?;
        Ok(plan.into())
    }

    /// Conversations the user could still create; negative when over the limit
    async fn conversations_remaining(&self, ctx: &Context<'_>) -> FieldResult<i64> {
        let context = ctx.data::<GraphQLContext>()?;
        let mut conn = context.pool.acquire().await.graphql()?;
        let (check, _) = subscriptions::check_conversation_limits(&mut conn, self.inner.user_id)
            .await
            .graphql()?;
        Ok(check.remaining)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

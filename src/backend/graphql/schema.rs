/**
 * GraphQL Schema
 *
 * Builds the executable schema and holds the data every resolver reads
 * from the context. The bearer token is attached per request by the HTTP
 * handler; `current_user` turns it into an active `User`.
 */

use async_graphql::{Context, EmptySubscription, MergedObject, Schema};
use chrono::Duration;
use sqlx::PgPool;

use crate::backend::auth::{service as auth_service, SessionKeys, User};
use crate::backend::error::GraphQLResultExt;
use crate::backend::mail::MailQueue;
use crate::backend::middleware::BearerToken;

use super::chat::{ChatMutation, ChatQuery};
use super::subscriptions::{SubscriptionMutation, SubscriptionQuery};
use super::users::{UserMutation, UserQuery};

/// Shared state available to every resolver
#[derive(Clone)]
pub struct GraphQLContext {
    pub pool: PgPool,
    pub sessions: SessionKeys,
    pub mail: MailQueue,
    pub verification_ttl: Duration,
}

#[derive(MergedObject, Default)]
pub struct Query(UserQuery, ChatQuery, SubscriptionQuery);

#[derive(MergedObject, Default)]
pub struct Mutation(UserMutation, ChatMutation, SubscriptionMutation);

pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(context: GraphQLContext) -> AppSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(context)
        .finish()
}

/// The authenticated caller
///
/// Fails with `UNAUTHENTICATED` when the request carries no valid access
/// token for an active user.
pub(crate) async fn current_user(ctx: &Context<'_>) -> async_graphql::Result<User> {
    let context = ctx.data::<GraphQLContext>()?;
    let token = ctx.data_opt::<BearerToken>().and_then(BearerToken::as_deref);
    auth_service::authenticate(&context.pool, &context.sessions, token)
        .await
        .graphql()
}

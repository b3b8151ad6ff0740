//! Subscription plan queries and mutations
//!
//! Named after the billing concept; this has nothing to do with GraphQL
//! subscriptions, which the schema does not use.

use async_graphql::{Context, FieldResult, Object, SimpleObject, ID};
use uuid::Uuid;

use crate::backend::error::{BackendError, GraphQLResultExt};
use crate::backend::subscription::{db as plans_db, service as subscriptions, PlanInput};

use super::schema::{current_user, GraphQLContext};
use super::types::{SubscriptionPlanType, UserSubscriptionType};

#[derive(SimpleObject)]
pub struct CreateSubscriptionPlanPayload {
    pub success: bool,
    pub plan: Option<SubscriptionPlanType>,
    pub message: String,
}

#[derive(SimpleObject)]
pub struct UpgradeSubscriptionPayload {
    pub success: bool,
    pub subscription: Option<UserSubscriptionType>,
    pub message: String,
}

#[derive(Default)]
pub struct SubscriptionQuery;

#[Object]
impl SubscriptionQuery {
    /// Plans users can subscribe to
    async fn subscription_plans(&self, ctx: &Context<'_>) -> FieldResult<Vec<SubscriptionPlanType>> {
        let context = ctx.data::<GraphQLContext>()?;
        let plans = plans_db::list_active_plans(&context.pool).await.graphql()?;
        Ok(plans.into_iter().map(SubscriptionPlanType::from).collect())
    }

    /// The caller's subscription, created on the default plan if missing
    async fn my_subscription(&self, ctx: &Context<'_>) -> FieldResult<UserSubscriptionType> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let mut conn = context.pool.acquire().await.graphql()?;
        let subscription = subscriptions::get_or_create_user_subscription(&mut conn, user.id)
            .await
            .graphql()?;
        Ok(subscription.into())
    }
}

#[derive(Default)]
pub struct SubscriptionMutation;

#[Object]
impl SubscriptionMutation {
    /// Create a plan (staff only)
    async fn create_subscription_plan(
        &self,
        ctx: &Context<'_>,
        name: String,
        #[graphql(default)] description: String,
        max_characters: i32,
        max_conversations: i32,
        #[graphql(default = 0.0)] price: f64,
        #[graphql(default = true)] is_active: bool,
        #[graphql(default = false)] is_default: bool,
    ) -> FieldResult<CreateSubscriptionPlanPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let input = PlanInput {
            name,
            description,
            max_characters,
            max_conversations,
            price,
            is_active,
            is_default,
        };

        let mut conn = context.pool.acquire().await.graphql()?;
        match subscriptions::create_subscription_plan(&mut conn, &user, &input).await {
            Ok(plan) => Ok(CreateSubscriptionPlanPayload {
                success: true,
                message: format!("Subscription plan '{}' created successfully", plan.name),
                plan: Some(plan.into()),
            }),
            Err(BackendError::SharedError(e)) => Ok(CreateSubscriptionPlanPayload {
                success: false,
                plan: None,
                message: e.to_string(),
            }),
            Err(e) => Err(e.into_graphql()),
        }
    }

    /// Move the caller to another active plan
    async fn upgrade_subscription(
        &self,
        ctx: &Context<'_>,
        plan_id: ID,
    ) -> FieldResult<UpgradeSubscriptionPayload> {
        let context = ctx.data::<GraphQLContext>()?;
        let user = current_user(ctx).await?;
        let mut conn = context.pool.acquire().await.graphql()?;

        let changed = match Uuid::parse_str(plan_id.trim()) {
            Ok(plan_id) => subscriptions::change_user_plan(&mut conn, user.id, plan_id)
                .await
                .graphql()?,
            Err(_) => false,
        };
        if !changed {
            return Ok(UpgradeSubscriptionPayload {
                success: false,
                subscription: None,
                message: "Invalid plan ID or plan is not active".to_string(),
            });
        }

        let subscription = subscriptions::get_or_create_user_subscription(&mut conn, user.id)
            .await
            .graphql()?;
        let plan = subscriptions::plan_for(&mut conn, &subscription).await.graphql()?;

        Ok(UpgradeSubscriptionPayload {
            success: true,
            subscription: Some(subscription.into()),
            message: format!("Successfully upgraded to {} plan", plan.name),
        })
    }
}

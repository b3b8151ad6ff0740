/**
 * Subscription Rules
 *
 * Loads a user's plan and usage and applies the limit arithmetic from
 * `shared::limits`. Every user has exactly one subscription; it is created
 * on first use on the default plan.
 *
 * # Concurrency
 *
 * `lock_conversation_quota` takes a row lock on the caller's subscription,
 * so two `createConversation` calls from the same user run their
 * check-then-insert one after the other.
 */

use sqlx::PgConnection;
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::chat::db as chat_db;
use crate::backend::error::{unique_violation, BackendError, BackendResult};
use crate::shared::limits::{self, LimitCheck};

use super::db::{self, NewPlan, SubscriptionPlan, UserSubscription};

/// Name of the plan created when no default plan exists
pub const FREE_PLAN_NAME: &str = "Free";

const PLAN_NAME_MAX_LEN: usize = 50;

fn free_plan() -> NewPlan {
    NewPlan {
        name: FREE_PLAN_NAME.to_string(),
        description: "Basic free plan with limited usage".to_string(),
        price_cents: 0,
        max_characters: 5,
        max_conversations: 3,
        is_active: true,
        is_default: true,
    }
}

/// The plan new users are subscribed to
///
/// Creates the Free plan if no plan is flagged as default.
pub async fn default_plan(conn: &mut PgConnection) -> BackendResult<SubscriptionPlan> {
    if let Some(plan) = db::get_default_plan(&mut *conn).await? {
        return Ok(plan);
    }

    tracing::info!("No default subscription plan, creating '{}'", FREE_PLAN_NAME);
    if let Some(plan) = db::create_plan_if_absent(&mut *conn, &free_plan()).await? {
        return Ok(plan);
    }

    // Another request created it first, or a non-default plan already uses the name
    if let Some(plan) = db::get_default_plan(&mut *conn).await? {
        return Ok(plan);
    }
    db::get_plan_by_name(&mut *conn, FREE_PLAN_NAME)
        .await?
        .ok_or_else(|| BackendError::internal("default subscription plan could not be created"))
}

/// The user's subscription, creating one on the default plan if needed
pub async fn get_or_create_user_subscription(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> BackendResult<UserSubscription> {
    if let Some(subscription) = db::get_user_subscription(&mut *conn, user_id).await? {
        return Ok(subscription);
    }

    let plan = default_plan(conn).await?;
    if let Some(subscription) = db::insert_user_subscription(&mut *conn, user_id, plan.id).await? {
        tracing::info!("Subscribed user {} to plan '{}'", user_id, plan.name);
        return Ok(subscription);
    }

    // Lost the insert race; the winner's row is visible now
    db::get_user_subscription(&mut *conn, user_id)
        .await?
        .ok_or_else(|| BackendError::internal("user subscription missing after insert"))
}

/// Plan a subscription points to
pub async fn plan_for(
    conn: &mut PgConnection,
    subscription: &UserSubscription,
) -> BackendResult<SubscriptionPlan> {
    db::get_plan_by_id(&mut *conn, subscription.plan_id)
        .await?
        .ok_or_else(|| BackendError::internal("subscription references a missing plan"))
}

/// The user's current plan
pub async fn current_plan(conn: &mut PgConnection, user_id: Uuid) -> BackendResult<SubscriptionPlan> {
    let subscription = get_or_create_user_subscription(conn, user_id).await?;
    plan_for(conn, &subscription).await
}

/// Check a message of `length` characters against the user's plan
pub async fn check_message_limits(
    conn: &mut PgConnection,
    user_id: Uuid,
    length: i64,
) -> BackendResult<(LimitCheck, SubscriptionPlan)> {
    let plan = current_plan(conn, user_id).await?;
    Ok((limits::check_message_length(plan.max_characters, length), plan))
}

/// Check whether the user may create one more conversation
pub async fn check_conversation_limits(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> BackendResult<(LimitCheck, SubscriptionPlan)> {
    let plan = current_plan(conn, user_id).await?;
    let owned = chat_db::count_owned_conversations(&mut *conn, user_id).await?;
    Ok((limits::check_conversation_quota(plan.max_conversations, owned), plan))
}

/// Same as `check_conversation_limits`, holding the subscription row lock
///
/// `conn` must be inside a transaction; the lock lasts until it ends.
pub async fn lock_conversation_quota(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> BackendResult<(LimitCheck, SubscriptionPlan)> {
    get_or_create_user_subscription(conn, user_id).await?;
    let subscription = db::lock_user_subscription(&mut *conn, user_id)
        .await?
        .ok_or_else(|| BackendError::internal("user subscription vanished while locking"))?;

    let plan = plan_for(conn, &subscription).await?;
    let owned = chat_db::count_owned_conversations(&mut *conn, user_id).await?;
    Ok((limits::check_conversation_quota(plan.max_conversations, owned), plan))
}

/// Move the user to another plan
///
/// Returns `false` if the plan does not exist or is inactive.
pub async fn change_user_plan(
    conn: &mut PgConnection,
    user_id: Uuid,
    plan_id: Uuid,
) -> BackendResult<bool> {
    let Some(plan) = db::get_active_plan(&mut *conn, plan_id).await? else {
        return Ok(false);
    };

    let subscription = get_or_create_user_subscription(conn, user_id).await?;
    db::update_subscription_plan(&mut *conn, subscription.id, plan.id).await?;
    tracing::info!("User {} moved to plan '{}'", user_id, plan.name);
    Ok(true)
}

/// Input for a new plan as received from the API
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub name: String,
    pub description: String,
    pub max_characters: i32,
    pub max_conversations: i32,
    /// Price in currency units, e.g. `9.99`
    pub price: f64,
    pub is_active: bool,
    pub is_default: bool,
}

impl PlanInput {
    fn validate(&self) -> BackendResult<NewPlan> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > PLAN_NAME_MAX_LEN {
            return Err(BackendError::validation(
                "name",
                format!("Plan name must be between 1 and {PLAN_NAME_MAX_LEN} characters"),
            ));
        }
        if self.max_characters < 0 {
            return Err(BackendError::validation(
                "max_characters",
                "Maximum characters must not be negative",
            ));
        }
        if self.max_conversations < 0 {
            return Err(BackendError::validation(
                "max_conversations",
                "Maximum conversations must not be negative",
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(BackendError::validation("price", "Price must not be negative"));
        }
        let price_cents = (self.price * 100.0).round();
        // i64::MAX as f64 is 2^63, the first value that does not fit
        if price_cents >= i64::MAX as f64 {
            return Err(BackendError::validation("price", "Price is too large"));
        }

        Ok(NewPlan {
            name: name.to_string(),
            description: self.description.clone(),
            price_cents: price_cents as i64,
            max_characters: self.max_characters,
            max_conversations: self.max_conversations,
            is_active: self.is_active,
            is_default: self.is_default,
        })
    }
}

fn duplicate_plan_name(name: &str) -> BackendError {
    BackendError::validation(
        "name",
        format!("A subscription plan with the name '{name}' already exists"),
    )
}

/// Create a plan (staff only)
pub async fn create_subscription_plan(
    conn: &mut PgConnection,
    caller: &User,
    input: &PlanInput,
) -> BackendResult<SubscriptionPlan> {
    if !caller.is_staff {
        tracing::warn!("User {} tried to create a subscription plan", caller.id);
        return Err(BackendError::forbidden(
            "Permission denied. Only administrators can create subscription plans.",
        ));
    }

    let new_plan = input.validate()?;
    if db::get_plan_by_name(&mut *conn, &new_plan.name).await?.is_some() {
        return Err(duplicate_plan_name(&new_plan.name));
    }

    let plan = db::create_plan(&mut *conn, &new_plan).await.map_err(|e| {
        if unique_violation(&e).is_some() {
            duplicate_plan_name(&new_plan.name)
        } else {
            e.into()
        }
    })?;

    tracing::info!("Subscription plan '{}' created by {}", plan.name, caller.user_name);
    Ok(plan)
}

/**
 * Database Operations for Subscription Plans
 *
 * Plans, the one-per-user subscription row, and the row lock that
 * serialises limit checks for a single user.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

const PLAN_COLUMNS: &str = "id, name, description, price_cents, max_characters, max_conversations, \
     is_active, is_default, created_at, updated_at";

/// Row of `subscription_plans`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Monthly price in cents
    pub price_cents: i64,
    /// Longest message a subscriber may send
    pub max_characters: i32,
    /// Most conversations a subscriber may own
    pub max_conversations: i32,
    pub is_active: bool,
    /// Plan given to new users
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of `user_subscriptions`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a plan
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub max_characters: i32,
    pub max_conversations: i32,
    pub is_active: bool,
    pub is_default: bool,
}

/// Insert a plan
pub async fn create_plan<'e, E: PgExecutor<'e>>(
    executor: E,
    plan: &NewPlan,
) -> Result<SubscriptionPlan, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        r#"
        INSERT INTO subscription_plans
            (id, name, description, price_cents, max_characters, max_conversations, is_active, is_default, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(plan.price_cents)
    .bind(plan.max_characters)
    .bind(plan.max_conversations)
    .bind(plan.is_active)
    .bind(plan.is_default)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Insert a plan unless one with the same name exists
///
/// Returns `None` when the name was taken.
pub async fn create_plan_if_absent<'e, E: PgExecutor<'e>>(
    executor: E,
    plan: &NewPlan,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        r#"
        INSERT INTO subscription_plans
            (id, name, description, price_cents, max_characters, max_conversations, is_active, is_default, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        ON CONFLICT (name) DO NOTHING
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(plan.price_cents)
    .bind(plan.max_characters)
    .bind(plan.max_conversations)
    .bind(plan.is_active)
    .bind(plan.is_default)
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// Get plan by ID
pub async fn get_plan_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Get an active plan by ID
pub async fn get_active_plan<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1 AND is_active"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Get plan by name
pub async fn get_plan_by_name<'e, E: PgExecutor<'e>>(
    executor: E,
    name: &str,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE name = $1"
    ))
    .bind(name)
    .fetch_optional(executor)
    .await
}

/// The oldest plan flagged as default
pub async fn get_default_plan<'e, E: PgExecutor<'e>>(
    executor: E,
) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM subscription_plans
        WHERE is_default
        ORDER BY created_at, id
        LIMIT 1
        "#
    ))
    .fetch_optional(executor)
    .await
}

/// All active plans, cheapest first
pub async fn list_active_plans<'e, E: PgExecutor<'e>>(
    executor: E,
) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
        FROM subscription_plans
        WHERE is_active
        ORDER BY price_cents, name
        "#
    ))
    .fetch_all(executor)
    .await
}

/// Get a user's subscription
pub async fn get_user_subscription<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<UserSubscription>, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(
        r#"
        SELECT id, user_id, plan_id, created_at, updated_at
        FROM user_subscriptions
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Get a user's subscription and lock the row until the transaction ends
pub async fn lock_user_subscription<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<UserSubscription>, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(
        r#"
        SELECT id, user_id, plan_id, created_at, updated_at
        FROM user_subscriptions
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Subscribe a user to `plan_id` unless already subscribed
///
/// Concurrent callers race on the unique `user_id`; the loser inserts
/// nothing and gets `None`.
pub async fn insert_user_subscription<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Option<UserSubscription>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, UserSubscription>(
        r#"
        INSERT INTO user_subscriptions (id, user_id, plan_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (user_id) DO NOTHING
        RETURNING id, user_id, plan_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(plan_id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// Move a subscription to another plan
pub async fn update_subscription_plan<'e, E: PgExecutor<'e>>(
    executor: E,
    subscription_id: Uuid,
    plan_id: Uuid,
) -> Result<UserSubscription, sqlx::Error> {
    sqlx::query_as::<_, UserSubscription>(
        r#"
        UPDATE user_subscriptions
        SET plan_id = $2, updated_at = $3
        WHERE id = $1
        RETURNING id, user_id, plan_id, created_at, updated_at
        "#,
    )
    .bind(subscription_id)
    .bind(plan_id)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

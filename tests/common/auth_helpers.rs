//! Authentication test helpers
//!
//! Provides utilities for creating test users and plans directly in the
//! database, bypassing registration and the mail queue.

use chatplan::backend::auth::users::{self, NewUser, User};
use chatplan::backend::subscription::db::{self as plans, NewPlan, SubscriptionPlan};
use chatplan::backend::subscription::service as subscriptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::database::test_session_keys;

/// Password of every user made by these helpers
pub const TEST_PASSWORD: &str = "password123";

/// Test user with a valid access token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> String {
        self.user.id.to_string()
    }
}

/// Unique alphanumeric name, `prefix` plus 12 hex digits
pub fn unique_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &suffix[..12])
}

/// Create an active (email verified) user
pub async fn create_active_user(pool: &PgPool) -> TestUser {
    let user_name = unique_name("user");
    let email = format!("{user_name}@example.com");
    // minimum bcrypt cost keeps the suite fast
    let password_hash = bcrypt::hash(TEST_PASSWORD, 4).expect("Failed to hash password");

    let user = users::create_user(
        pool,
        NewUser {
            user_name: &user_name,
            email: &email,
            first_name: "Test",
            last_name: "User",
            password_hash: &password_hash,
        },
    )
    .await
    .expect("Failed to create test user");
    let user = users::activate_user(pool, user.id)
        .await
        .expect("Failed to activate test user");

    let token = test_session_keys()
        .create_access_token(user.id)
        .expect("Failed to create test token");

    TestUser { user, token }
}

/// Create an active staff user
pub async fn create_staff_user(pool: &PgPool) -> TestUser {
    let mut staff = create_active_user(pool).await;
    users::set_staff(pool, staff.user.id, true)
        .await
        .expect("Failed to grant staff");
    staff.user.is_staff = true;
    staff
}

/// Create an active, non-default plan with the given limits
pub async fn create_test_plan(
    pool: &PgPool,
    max_characters: i32,
    max_conversations: i32,
) -> SubscriptionPlan {
    plans::create_plan(
        pool,
        &NewPlan {
            name: unique_name("plan"),
            description: "Integration test plan".to_string(),
            price_cents: 500,
            max_characters,
            max_conversations,
            is_active: true,
            is_default: false,
        },
    )
    .await
    .expect("Failed to create test plan")
}

/// Put `user` on a fresh plan with the given limits
pub async fn subscribe_to_test_plan(
    pool: &PgPool,
    user: &TestUser,
    max_characters: i32,
    max_conversations: i32,
) -> SubscriptionPlan {
    let plan = create_test_plan(pool, max_characters, max_conversations).await;
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let changed = subscriptions::change_user_plan(&mut conn, user.user.id, plan.id)
        .await
        .expect("Failed to change plan");
    assert!(changed, "test plan should be active");
    plan
}

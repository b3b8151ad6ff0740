//! Authentication API integration tests
//!
//! Registration, email verification, login, refresh and `me`.

use serde_json::json;

use chatplan::backend::auth::verification;
use chatplan::backend::subscription::service as subscriptions;

use crate::common::{
    create_active_user, create_staff_user, error_code, error_message, test_session_keys,
    unique_name, TestDatabase, TEST_PASSWORD,
};

const REGISTER: &str = r#"
    mutation Register($userName: String!, $email: String!, $password: String!) {
        register(userName: $userName, email: $email, password: $password,
                 firstName: "Ada", lastName: "Lovelace") {
            user { id userName email isActive }
        }
    }
"#;

const LOGIN: &str = r#"
    mutation Login($username: String!, $password: String!) {
        login(username: $username, password: $password) {
            token { access refresh }
            user { userName }
        }
    }
"#;

const VERIFY_EMAIL: &str = r#"
    mutation Verify($token: String!) {
        verifyEmail(token: $token) { success message token { access refresh } }
    }
"#;

#[tokio::test]
async fn test_register_verify_and_login() {
    let Some(db) = TestDatabase::connect().await else { return };
    let mut api = db.api();
    let user_name = unique_name("ada");
    let email = format!("{user_name}@example.com");

    let response = api
        .execute(
            None,
            REGISTER,
            json!({ "userName": user_name, "email": email, "password": TEST_PASSWORD }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["register"]["user"]["userName"], user_name.as_str());
    assert_eq!(data["register"]["user"]["isActive"], false);

    // Inactive users cannot log in yet
    let response = api
        .execute(None, LOGIN, json!({ "username": user_name, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(error_message(&response), Some("Invalid credentials"));

    let job = api.jobs.try_recv().expect("verification email queued");
    assert_eq!(job.to, email);

    let response = api
        .execute(None, VERIFY_EMAIL, json!({ "token": job.token.to_string() }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["verifyEmail"]["success"], true);
    assert_eq!(
        data["verifyEmail"]["message"],
        "Your email has been verified successfully!"
    );
    assert!(data["verifyEmail"]["token"]["access"].is_string());

    // A token is good for one exchange only
    let response = api
        .execute(None, VERIFY_EMAIL, json!({ "token": job.token.to_string() }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["verifyEmail"]["success"], false);
    assert_eq!(
        data["verifyEmail"]["message"],
        "Verification link has expired or already used"
    );

    let response = api
        .execute(None, LOGIN, json!({ "username": user_name, "password": TEST_PASSWORD }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["login"]["user"]["userName"], user_name.as_str());

    let access = data["login"]["token"]["access"].as_str().unwrap().to_string();
    let response = api.execute(Some(&access), "{ me { userName } }", json!({})).await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["me"]["userName"], user_name.as_str());
}

#[tokio::test]
async fn test_register_subscribes_to_default_plan() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user_name = unique_name("sub");

    let response = api
        .execute(
            None,
            REGISTER,
            json!({
                "userName": user_name,
                "email": format!("{user_name}@example.com"),
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    let id: uuid::Uuid = data["register"]["user"]["id"].as_str().unwrap().parse().unwrap();

    let mut conn = db.pool().acquire().await.unwrap();
    let default_plan = subscriptions::default_plan(&mut conn).await.unwrap();
    let plan = subscriptions::current_plan(&mut conn, id).await.unwrap();
    assert_eq!(plan.id, default_plan.id);
}

#[tokio::test]
async fn test_register_rejects_taken_user_name_and_email() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let existing = create_active_user(db.pool()).await;

    let response = api
        .execute(
            None,
            REGISTER,
            json!({
                "userName": existing.user.user_name,
                "email": "someone.else@example.com",
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Username already exists"));
    assert_eq!(error_code(&response), Some("BAD_USER_INPUT"));

    let response = api
        .execute(
            None,
            REGISTER,
            json!({
                "userName": unique_name("other"),
                "email": existing.user.email,
                "password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Email already exists"));
}

#[tokio::test]
async fn test_register_reports_first_failing_rule() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();

    let response = api
        .execute(
            None,
            REGISTER,
            json!({ "userName": unique_name("bad"), "email": "not-an-email", "password": "short" }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Invalid email format"));

    let response = api
        .execute(
            None,
            REGISTER,
            json!({
                "userName": unique_name("bad"),
                "email": "fine@example.com",
                "password": "short",
            }),
        )
        .await;
    assert_eq!(
        error_message(&response),
        Some("Password must be at least 8 characters")
    );
}

#[tokio::test]
async fn test_verify_email_rejects_unknown_and_expired_tokens() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();

    let response = api
        .execute(None, VERIFY_EMAIL, json!({ "token": "not-a-uuid" }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["verifyEmail"]["success"], false);
    assert_eq!(data["verifyEmail"]["message"], "Invalid verification token");

    let user = create_active_user(db.pool()).await;
    let expired = verification::create_verification_token(
        db.pool(),
        user.user.id,
        chrono::Duration::seconds(-1),
    )
    .await
    .unwrap();

    let response = api
        .execute(None, VERIFY_EMAIL, json!({ "token": expired.token.to_string() }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["verifyEmail"]["success"], false);
    assert_eq!(
        data["verifyEmail"]["message"],
        "Verification link has expired or already used"
    );
    assert!(data["verifyEmail"]["token"].is_null());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user = create_active_user(db.pool()).await;

    let response = api
        .execute(
            None,
            LOGIN,
            json!({ "username": user.user.user_name, "password": "wrong-password" }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Invalid credentials"));
    assert_eq!(error_code(&response), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user = create_active_user(db.pool()).await;

    let response = api
        .execute(
            None,
            LOGIN,
            json!({ "username": user.user.user_name, "password": TEST_PASSWORD }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    let access = data["login"]["token"]["access"].as_str().unwrap().to_string();
    let refresh = data["login"]["token"]["refresh"].as_str().unwrap().to_string();

    let refresh_query = r#"
        mutation Refresh($token: String!) { refreshToken(refreshToken: $token) { access } }
    "#;

    let response = api.execute(None, refresh_query, json!({ "token": refresh })).await;
    let data = crate::assert_graphql_ok!(response);
    let new_access = data["refreshToken"]["access"].as_str().unwrap().to_string();

    let response = api.execute(Some(&new_access), "{ me { id } }", json!({})).await;
    let _ = crate::assert_graphql_ok!(response);

    // Access tokens cannot be used to refresh
    let response = api.execute(None, refresh_query, json!({ "token": access })).await;
    assert_eq!(
        error_message(&response),
        Some("Invalid token type: not a refresh token")
    );

    // Refresh tokens cannot be used to authenticate
    let response = api.execute(Some(&refresh), "{ me { id } }", json!({})).await;
    assert_eq!(
        error_message(&response),
        Some("Cannot use refresh token for authentication")
    );
}

#[tokio::test]
async fn test_users_is_staff_only() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user = create_active_user(db.pool()).await;
    let staff = create_staff_user(db.pool()).await;

    let response = api.execute(Some(&user.token), "{ users { id } }", json!({})).await;
    assert_eq!(error_message(&response), Some("Permission denied"));
    assert_eq!(error_code(&response), Some("FORBIDDEN"));

    let response = api.execute(Some(&staff.token), "{ users { id } }", json!({})).await;
    let data = crate::assert_graphql_ok!(response);
    let ids: Vec<&str> = data["users"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["id"].as_str())
        .collect();
    assert!(ids.contains(&user.id().as_str()));
}

#[tokio::test]
async fn test_inactive_user_cannot_authenticate() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user = create_active_user(db.pool()).await;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.user.id)
        .execute(db.pool())
        .await
        .unwrap();

    let response = api.execute(Some(&user.token), "{ me { id } }", json!({})).await;
    assert_eq!(
        error_message(&response),
        Some("Account is not active. Please verify your email first.")
    );
    assert_eq!(error_code(&response), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_tokens_of_deleted_user_are_rejected() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let user = create_active_user(db.pool()).await;
    let refresh = test_session_keys().create_refresh_token(user.user.id).unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.user.id)
        .execute(db.pool())
        .await
        .unwrap();

    let response = api.execute(Some(&user.token), "{ me { id } }", json!({})).await;
    assert_eq!(error_message(&response), Some("User not found"));

    let response = api
        .execute(
            None,
            "mutation Refresh($token: String!) { refreshToken(refreshToken: $token) { access } }",
            json!({ "token": refresh }),
        )
        .await;
    assert_eq!(error_message(&response), Some("User not found"));
    assert_eq!(error_code(&response), Some("UNAUTHENTICATED"));
}

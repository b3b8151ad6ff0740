//! Chat API integration tests
//!
//! Conversations, membership, messages and the plan limits on them.

use async_graphql::{Request, Variables};
use chatplan::backend::middleware::BearerToken;
use serde_json::json;

use crate::common::{
    create_active_user, error_code, error_message, subscribe_to_test_plan, TestApi,
    TestDatabase, TestUser,
};

const CREATE_CONVERSATION: &str = r#"
    mutation Create($title: String!, $memberIds: [ID!]) {
        createConversation(title: $title, memberIds: $memberIds) {
            conversation { id title owner { id } members { id } }
            alert
        }
    }
"#;

const SEND_MESSAGE: &str = r#"
    mutation Send($conversationId: ID!, $text: String!) {
        sendMessage(conversationId: $conversationId, text: $text) {
            message { id text conversationId sender { id } }
        }
    }
"#;

async fn create_conversation(api: &TestApi, user: &TestUser, title: &str) -> String {
    let response = api
        .execute(Some(&user.token), CREATE_CONVERSATION, json!({ "title": title }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    data["createConversation"]["conversation"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_create_conversation_with_members() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    let friend = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;

    let response = api
        .execute(
            Some(&owner.token),
            CREATE_CONVERSATION,
            json!({
                "title": "Weekend plans",
                "memberIds": [friend.id(), uuid::Uuid::new_v4().to_string(), "garbage"],
            }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    let conversation = &data["createConversation"]["conversation"];

    assert_eq!(conversation["title"], "Weekend plans");
    assert_eq!(conversation["owner"]["id"], owner.id().as_str());

    let mut members: Vec<&str> = conversation["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(members[0], owner.id().as_str());
    members.sort_unstable();
    let mut expected = vec![owner.id(), friend.id()];
    expected.sort_unstable();
    assert_eq!(members, expected);
    assert!(data["createConversation"]["alert"].is_null());

    // Members see it, outsiders do not
    let response = api
        .execute(Some(&friend.token), "{ conversations { id } }", json!({}))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["conversations"][0]["id"], conversation["id"]);
}

#[tokio::test]
async fn test_conversation_limit_and_alerts() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 3).await;

    let mut alerts = Vec::new();
    for title in ["one", "two", "three"] {
        let response = api
            .execute(Some(&owner.token), CREATE_CONVERSATION, json!({ "title": title }))
            .await;
        let data = crate::assert_graphql_ok!(response);
        alerts.push(data["createConversation"]["alert"].clone());
    }
    assert_eq!(
        alerts,
        vec![
            serde_json::Value::Null,
            json!("Warning: You have only one conversation remaining."),
            json!("Warning: You have reached your conversation limit."),
        ]
    );

    let response = api
        .execute(Some(&owner.token), CREATE_CONVERSATION, json!({ "title": "four" }))
        .await;
    assert_eq!(
        error_message(&response),
        Some("You have reached your maximum conversation limit. Your plan allows 3 conversations.")
    );
    assert_eq!(error_code(&response), Some("LIMIT_EXCEEDED"));
}

#[tokio::test]
async fn test_concurrent_creates_respect_the_limit() {
    let Some(db) = TestDatabase::connect().await else { return };
    let schema = db.api().schema;
    let owner = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 2).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..6 {
        let schema = schema.clone();
        let request = Request::new(CREATE_CONVERSATION)
            .variables(Variables::from_json(json!({ "title": format!("race {i}") })))
            .data(BearerToken(Some(owner.token.clone())));
        tasks.spawn(async move { schema.execute(request).await.is_ok() });
    }

    let mut created = 0;
    while let Some(ok) = tasks.join_next().await {
        if ok.unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 2);
}

#[tokio::test]
async fn test_conversation_title_is_validated() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;

    let response = api
        .execute(Some(&owner.token), CREATE_CONVERSATION, json!({ "title": "" }))
        .await;
    assert_eq!(
        error_message(&response),
        Some("Title must be between 1 and 255 characters")
    );
}

#[tokio::test]
async fn test_send_and_list_messages() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;
    let conversation_id = create_conversation(&api, &owner, "Messages").await;

    for text in ["first", "second", "third"] {
        let response = api
            .execute(
                Some(&owner.token),
                SEND_MESSAGE,
                json!({ "conversationId": conversation_id, "text": text }),
            )
            .await;
        let data = crate::assert_graphql_ok!(response);
        let message = &data["sendMessage"]["message"];
        assert_eq!(message["text"], text);
        assert_eq!(message["conversationId"], conversation_id.as_str());
        assert_eq!(message["sender"]["id"], owner.id().as_str());
    }

    let response = api
        .execute(
            Some(&owner.token),
            "query Messages($id: ID!) { messages(conversationId: $id) { text } }",
            json!({ "id": conversation_id }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    let texts: Vec<&str> = data["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_message_length_limit() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 5, 10).await;
    let conversation_id = create_conversation(&api, &owner, "Short").await;

    // Five scalar values, more than five bytes
    let response = api
        .execute(
            Some(&owner.token),
            SEND_MESSAGE,
            json!({ "conversationId": conversation_id, "text": "héllö" }),
        )
        .await;
    let _ = crate::assert_graphql_ok!(response);

    let response = api
        .execute(
            Some(&owner.token),
            SEND_MESSAGE,
            json!({ "conversationId": conversation_id, "text": "toolong" }),
        )
        .await;
    assert_eq!(
        error_message(&response),
        Some("Your message exceeds your character limit. out of 5.")
    );

    // The length check runs before the conversation is looked up
    let response = api
        .execute(
            Some(&owner.token),
            SEND_MESSAGE,
            json!({ "conversationId": "nope", "text": "toolong" }),
        )
        .await;
    assert_eq!(
        error_message(&response),
        Some("Your message exceeds your character limit. out of 5.")
    );
    assert_eq!(error_code(&response), Some("LIMIT_EXCEEDED"));

    let response = api
        .execute(
            Some(&owner.token),
            SEND_MESSAGE,
            json!({ "conversationId": "nope", "text": "ok" }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Conversation not found"));
}

#[tokio::test]
async fn test_non_members_are_denied() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    let outsider = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;
    subscribe_to_test_plan(db.pool(), &outsider, 100, 10).await;
    let conversation_id = create_conversation(&api, &owner, "Private").await;

    let response = api
        .execute(
            Some(&outsider.token),
            "query C($id: ID!) { conversation(id: $id) { id } }",
            json!({ "id": conversation_id }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Access denied"));

    let response = api
        .execute(
            Some(&outsider.token),
            SEND_MESSAGE,
            json!({ "conversationId": conversation_id, "text": "hi" }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Access denied"));

    let response = api
        .execute(
            Some(&outsider.token),
            "query C($id: ID!) { conversation(id: $id) { id } }",
            json!({ "id": uuid::Uuid::new_v4().to_string() }),
        )
        .await;
    assert_eq!(error_message(&response), Some("Conversation not found"));
    assert_eq!(error_code(&response), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_add_user_to_conversation() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    let friend = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;
    let conversation_id = create_conversation(&api, &owner, "Team").await;

    let add = r#"
        mutation Add($conversationId: ID!, $userId: ID!) {
            addUserToConversation(conversationId: $conversationId, userId: $userId) {
                success message conversation { id }
            }
        }
    "#;

    let response = api
        .execute(
            Some(&owner.token),
            add,
            json!({ "conversationId": conversation_id, "userId": friend.id() }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["addUserToConversation"]["success"], true);
    assert_eq!(
        data["addUserToConversation"]["message"],
        "User has been added to the conversation"
    );

    let response = api
        .execute(
            Some(&owner.token),
            add,
            json!({ "conversationId": conversation_id, "userId": friend.id() }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["addUserToConversation"]["success"], false);
    assert_eq!(
        data["addUserToConversation"]["message"],
        "User is already a member of this conversation"
    );

    let response = api
        .execute(
            Some(&owner.token),
            add,
            json!({ "conversationId": conversation_id, "userId": uuid::Uuid::new_v4().to_string() }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["addUserToConversation"]["message"], "User not found");

    // Members other than the owner cannot add people
    let response = api
        .execute(
            Some(&friend.token),
            add,
            json!({ "conversationId": conversation_id, "userId": owner.id() }),
        )
        .await;
    assert_eq!(
        error_message(&response),
        Some("Permission denied: Only the owner can add users to this conversation")
    );
}

#[tokio::test]
async fn test_delete_conversation() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;
    let friend = create_active_user(db.pool()).await;
    subscribe_to_test_plan(db.pool(), &owner, 100, 10).await;

    let response = api
        .execute(
            Some(&owner.token),
            CREATE_CONVERSATION,
            json!({ "title": "Doomed", "memberIds": [friend.id()] }),
        )
        .await;
    let data = crate::assert_graphql_ok!(response);
    let conversation_id = data["createConversation"]["conversation"]["id"].clone();

    let delete = r#"
        mutation Delete($id: ID!) { deleteConversation(conversationId: $id) { success message } }
    "#;

    let response = api
        .execute(Some(&friend.token), delete, json!({ "id": conversation_id }))
        .await;
    assert_eq!(
        error_message(&response),
        Some("Permission denied: Only the owner can delete this conversation")
    );

    let response = api
        .execute(Some(&owner.token), delete, json!({ "id": conversation_id }))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["deleteConversation"]["success"], true);
    assert_eq!(
        data["deleteConversation"]["message"],
        "Conversation deleted successfully"
    );

    let response = api
        .execute(Some(&friend.token), "{ conversations { id } }", json!({}))
        .await;
    let data = crate::assert_graphql_ok!(response);
    assert_eq!(data["conversations"], json!([]));
}

#[tokio::test]
async fn test_delete_unknown_conversation() {
    let Some(db) = TestDatabase::connect().await else { return };
    let api = db.api();
    let owner = create_active_user(db.pool()).await;

    let delete = r#"
        mutation Delete($id: ID!) { deleteConversation(conversationId: $id) { success } }
    "#;

    for id in [uuid::Uuid::new_v4().to_string(), "nope".to_string()] {
        let response = api.execute(Some(&owner.token), delete, json!({ "id": id })).await;
        assert_eq!(error_message(&response), Some("Conversation not found"), "{id}");
        assert_eq!(error_code(&response), Some("NOT_FOUND"), "{id}");
    }
}

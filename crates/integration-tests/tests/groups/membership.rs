use integration_tests::*;
use serde_json::json;

use super::{admin_server, alice};

fn pool() -> CognitoMock {
    CognitoMock::new()
        .with_group("admins")
        .with_group("editors")
        .with_user("alice")
        .with_member("admins", "alice")
}

#[tokio::test]
async fn add_me_to_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addMeToGroup", &json!({ "groupname": "editors" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Success adding alice to editors"
    }
    "#);
    insta::assert_json_snapshot!(cognito.requests("AdminAddUserToGroup"), @r#"
    [
      {
        "GroupName": "editors",
        "UserPoolId": "us-east-1_TestPool",
        "Username": "alice"
      }
    ]
    "#);
    assert_eq!(cognito.members("editors"), ["alice"]);
}

#[tokio::test]
async fn add_me_to_group_without_groupname() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server).post("/addMeToGroup", &json!({})).await;
    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Groupname is required"
    }
    "#);
    assert!(cognito.calls().is_empty());
}

#[tokio::test]
async fn add_me_to_group_with_form_body() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post_form("/addMeToGroup", &[("groupname", "editors")])
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(cognito.members("editors"), ["alice"]);
}

#[tokio::test]
async fn add_me_to_group_with_plain_text_body() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .request(reqwest::Method::POST, "/addMeToGroup")
        .header("content-type", "text/plain")
        .body(r#"{"groupname": "editors"}"#)
        .send()
        .await
        .unwrap();

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Groupname is required"
    }
    "#);
    assert!(cognito.calls().is_empty());
}

#[tokio::test]
async fn add_me_to_missing_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addMeToGroup", &json!({ "groupname": "ghosts" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Group not found."
    }
    "#);
}

#[tokio::test]
async fn remove_me_from_group() {
    let cognito = pool().with_member("editors", "alice");
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/removeMeFromGroup", &json!({ "groupname": "editors" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Removed alice from editors"
    }
    "#);
    assert!(cognito.members("editors").is_empty());
}

#[tokio::test]
async fn remove_me_from_group_without_groupname() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/removeMeFromGroup", &json!({ "groupname": "" }))
        .await;

    assert_eq!(response.status(), 400);
    assert!(cognito.calls().is_empty());
}

#[tokio::test]
async fn unknown_user_error_is_passed_through() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = server
        .client
        .as_user("mallory", "admins")
        .post("/addMeToGroup", &json!({ "groupname": "editors" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "User does not exist."
    }
    "#);
}

#[tokio::test]
async fn missing_username_claim() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let client = server.client.with_claims(json!({ "cognito:groups": "admins" }));
    let response = client.post("/addMeToGroup", &json!({ "groupname": "editors" })).await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 401);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Caller identity does not contain a username"
    }
    "#);
    assert!(cognito.calls().is_empty());
}

#[tokio::test]
async fn id_token_username_claim() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let client = server.client.with_claims(json!({
        "cognito:username": "alice",
        "cognito:groups": "admins"
    }));

    let response = client.post("/addMeToGroup", &json!({ "groupname": "editors" })).await;

    assert_eq!(response.status(), 200);
    assert_eq!(cognito.members("editors"), ["alice"]);
}

#[tokio::test]
async fn add_group_and_join_me_creates_missing_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addGroupAndJoinMe", &json!({ "groupname": "reviewers" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Success in creating reviewers and adding alice"
    }
    "#);
    assert_eq!(cognito.operations(), ["GetGroup", "CreateGroup", "AdminAddUserToGroup"]);
    assert!(cognito.has_group("reviewers"));
    assert_eq!(cognito.members("reviewers"), ["alice"]);
}

#[tokio::test]
async fn add_group_and_join_me_with_existing_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addGroupAndJoinMe", &json!({ "groupname": "editors" }))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(cognito.operations(), ["GetGroup", "AdminAddUserToGroup"]);
}

#[tokio::test]
async fn add_group_and_join_me_aborts_on_lookup_failure() {
    let cognito = pool().fail("GetGroup", "NotAuthorizedException", "Access to the user pool is denied");
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addGroupAndJoinMe", &json!({ "groupname": "reviewers" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Failed to look up group reviewers: Access to the user pool is denied"
    }
    "#);
    assert!(!cognito.operations().iter().any(|operation| operation == "CreateGroup"));
    assert!(!cognito.has_group("reviewers"));
}

#[tokio::test]
async fn add_group_and_join_me_create_failure() {
    let cognito = pool().fail("CreateGroup", "InvalidParameterException", "Invalid group name");
    let server = admin_server(&cognito).await;

    let response = alice(&server)
        .post("/addGroupAndJoinMe", &json!({ "groupname": "reviewers" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Failed to create group reviewers: Invalid group name"
    }
    "#);
    assert_eq!(cognito.operations(), ["GetGroup", "CreateGroup"]);
}

#[tokio::test]
async fn add_group_and_join_me_join_failure_keeps_created_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = server
        .client
        .as_user("mallory", "admins")
        .post("/addGroupAndJoinMe", &json!({ "groupname": "reviewers" }))
        .await;

    let (status, body) = status_and_json(response).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "User does not exist."
    }
    "#);
    assert_eq!(cognito.operations(), ["GetGroup", "CreateGroup", "AdminAddUserToGroup"]);
    assert!(cognito.has_group("reviewers"));
    assert!(cognito.members("reviewers").is_empty());
}

#[tokio::test]
async fn add_group_and_join_me_without_groupname() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let response = alice(&server).post("/addGroupAndJoinMe", &json!({})).await;

    assert_eq!(response.status(), 400);
    assert!(cognito.calls().is_empty());
}

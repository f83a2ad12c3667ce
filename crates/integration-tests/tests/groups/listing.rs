use integration_tests::*;

use super::{admin_server, alice};

fn pool() -> CognitoMock {
    CognitoMock::new()
        .with_group("admins")
        .with_group("editors")
        .with_group("reviewers")
        .with_user("alice")
        .with_user("bob")
        .with_user("carol")
        .with_member("admins", "alice")
        .with_member("editors", "alice")
        .with_member("editors", "bob")
        .with_member("editors", "carol")
}

#[tokio::test]
async fn list_groups() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listGroups?limit=1").await).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "Groups": [
        {
          "CreationDate": "2023-11-14T22:13:20Z",
          "Description": "admins group",
          "GroupName": "admins",
          "LastModifiedDate": "2023-11-14T22:13:20Z",
          "Precedence": 0,
          "RoleArn": "arn:aws:iam::123456789012:role/admins",
          "UserPoolId": "us-east-1_TestPool"
        }
      ],
      "NextToken": "1"
    }
    "#);
    insta::assert_json_snapshot!(cognito.requests("ListGroups"), @r#"
    [
      {
        "Limit": 1,
        "UserPoolId": "us-east-1_TestPool"
      }
    ]
    "#);
}

#[tokio::test]
async fn list_groups_default_limit() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listGroups").await).await;

    assert_eq!(status, 200);
    assert_eq!(body["Groups"].as_array().unwrap().len(), 3);
    assert!(body.get("NextToken").is_none());

    insta::assert_json_snapshot!(cognito.requests("ListGroups"), @r#"
    [
      {
        "Limit": 25,
        "UserPoolId": "us-east-1_TestPool"
      }
    ]
    "#);
}

#[tokio::test]
async fn list_groups_follows_cursor() {
    let cognito = pool();
    let server = admin_server(&cognito).await;
    let client = alice(&server);

    let (_, first) = status_and_json(client.get("/listGroups?limit=2").await).await;
    let token = first["NextToken"].as_str().unwrap();

    let (status, second) = status_and_json(client.get(&format!("/listGroups?limit=2&token={token}")).await).await;

    assert_eq!(status, 200);

    let names: Vec<&str> = [&first, &second]
        .into_iter()
        .flat_map(|page| page["Groups"].as_array().unwrap())
        .map(|group| group["GroupName"].as_str().unwrap())
        .collect();

    assert_eq!(names, ["admins", "editors", "reviewers"]);
    assert!(second.get("NextToken").is_none());
}

#[tokio::test]
async fn list_groups_for_me_redacts_attributes() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listGroupsForMe?limit=10").await).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "Groups": [
        {
          "Description": "admins group",
          "GroupName": "admins"
        },
        {
          "Description": "editors group",
          "GroupName": "editors"
        }
      ]
    }
    "#);
    insta::assert_json_snapshot!(cognito.requests("AdminListGroupsForUser"), @r#"
    [
      {
        "Limit": 10,
        "UserPoolId": "us-east-1_TestPool",
        "Username": "alice"
      }
    ]
    "#);
}

#[tokio::test]
async fn list_groups_for_me_with_cursor() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listGroupsForMe?limit=1&token=1").await).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "Groups": [
        {
          "Description": "editors group",
          "GroupName": "editors"
        }
      ]
    }
    "#);
    insta::assert_json_snapshot!(cognito.requests("AdminListGroupsForUser"), @r#"
    [
      {
        "Limit": 1,
        "NextToken": "1",
        "UserPoolId": "us-east-1_TestPool",
        "Username": "alice"
      }
    ]
    "#);
}

#[tokio::test]
async fn list_users_in_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listUsersInGroup?groupname=editors&limit=1").await).await;

    assert_eq!(status, 200);
    insta::assert_json_snapshot!(body, @r#"
    {
      "NextToken": "1",
      "Users": [
        {
          "Attributes": [
            {
              "Name": "email",
              "Value": "alice@example.com"
            }
          ],
          "Enabled": true,
          "UserCreateDate": "2023-11-14T22:13:20Z",
          "UserLastModifiedDate": "2023-11-14T22:13:20Z",
          "UserStatus": "CONFIRMED",
          "Username": "alice"
        }
      ]
    }
    "#);
    insta::assert_json_snapshot!(cognito.requests("ListUsersInGroup"), @r#"
    [
      {
        "GroupName": "editors",
        "Limit": 1,
        "UserPoolId": "us-east-1_TestPool"
      }
    ]
    "#);
}

#[tokio::test]
async fn list_users_in_group_pages_without_gaps() {
    let cognito = pool();
    let server = admin_server(&cognito).await;
    let client = alice(&server);

    let mut usernames = Vec::new();
    let mut path = "/listUsersInGroup?groupname=editors&limit=2".to_string();

    loop {
        let (status, page) = status_and_json(client.get(&path).await).await;
        assert_eq!(status, 200);

        for user in page["Users"].as_array().unwrap() {
            usernames.push(user["Username"].as_str().unwrap().to_string());
        }

        match page["NextToken"].as_str() {
            Some(token) => path = format!("/listUsersInGroup?groupname=editors&limit=2&token={token}"),
            None => break,
        }
    }

    assert_eq!(usernames, ["alice", "bob", "carol"]);
    assert_eq!(cognito.requests("ListUsersInGroup").len(), 2);
}

#[tokio::test]
async fn list_users_in_group_without_groupname() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listUsersInGroup?limit=5").await).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "groupname is required"
    }
    "#);
    assert!(cognito.calls().is_empty());
}

#[tokio::test]
async fn list_users_in_missing_group() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    let (status, body) = status_and_json(alice(&server).get("/listUsersInGroup?groupname=ghosts").await).await;

    assert_eq!(status, 400);
    insta::assert_json_snapshot!(body, @r#"
    {
      "message": "Group not found."
    }
    "#);
}

#[tokio::test]
async fn invalid_limit() {
    let cognito = pool();
    let server = admin_server(&cognito).await;

    for limit in ["0", "-3", "many"] {
        let (status, body) = status_and_json(alice(&server).get(&format!("/listGroups?limit={limit}")).await).await;

        assert_eq!(status, 400, "limit {limit}");
        assert_eq!(body["message"], "limit must be a positive integer");
    }

    assert!(cognito.calls().is_empty());
}

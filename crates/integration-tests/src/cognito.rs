//! In-process stand-in for the Cognito user pool API.
//!
//! Speaks the JSON 1.1 protocol of the AWS SDK: every call is a `POST /` with
//! the operation in the `X-Amz-Target` header. Calls are recorded so tests can
//! check exactly what reached the directory.

use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const USER_POOL_ID: &str = "us-east-1_TestPool";

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Fixed timestamp for all records, 2023-11-14T22:13:20Z.
const TIMESTAMP: f64 = 1_700_000_000.0;

/// A call that reached the mock directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CognitoCall {
    /// Operation name without the service prefix, e.g. `CreateGroup`.
    pub operation: String,
    pub request: Value,
}

#[derive(Default)]
struct UserPool {
    groups: Vec<Value>,
    users: BTreeMap<String, Value>,
    /// Group name to member usernames, in insertion order.
    members: BTreeMap<String, Vec<String>>,
}

impl UserPool {
    fn group(&self, name: &str) -> Option<&Value> {
        self.groups.iter().find(|group| group["GroupName"] == name)
    }
}

#[derive(Default)]
struct Inner {
    pool: Mutex<UserPool>,
    failures: HashMap<String, (String, String)>,
    calls: Mutex<Vec<CognitoCall>>,
}

/// Builder and handle for the mock directory.
#[derive(Clone, Default)]
pub struct CognitoMock {
    inner: Arc<Inner>,
}

impl CognitoMock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group with every attribute the real service returns.
    pub fn with_group(self, name: &str) -> Self {
        {
            let mut pool = self.pool();
            let precedence = pool.groups.len();

            pool.groups.push(json!({
                "GroupName": name,
                "UserPoolId": USER_POOL_ID,
                "Description": format!("{name} group"),
                "RoleArn": format!("arn:aws:iam::123456789012:role/{name}"),
                "Precedence": precedence,
                "LastModifiedDate": TIMESTAMP,
                "CreationDate": TIMESTAMP,
            }));
        }

        self
    }

    pub fn with_user(self, username: &str) -> Self {
        self.pool().users.insert(
            username.to_string(),
            json!({
                "Username": username,
                "Attributes": [{ "Name": "email", "Value": format!("{username}@example.com") }],
                "UserCreateDate": TIMESTAMP,
                "UserLastModifiedDate": TIMESTAMP,
                "Enabled": true,
                "UserStatus": "CONFIRMED",
            }),
        );

        self
    }

    /// Make `username` a member of `group`. Both must have been added before.
    pub fn with_member(self, group: &str, username: &str) -> Self {
        self.pool()
            .members
            .entry(group.to_string())
            .or_default()
            .push(username.to_string());

        self
    }

    /// Fail every call of `operation` with the given error type and message.
    ///
    /// Must be called before the mock is shared.
    pub fn fail(mut self, operation: &str, error_type: &str, message: &str) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner
                .failures
                .insert(operation.to_string(), (error_type.to_string(), message.to_string()));
        }

        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<CognitoCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Operation names of the calls received so far.
    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    /// Request bodies of every call of `operation`.
    pub fn requests(&self, operation: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .map(|call| call.request)
            .collect()
    }

    /// Usernames in `group`.
    pub fn members(&self, group: &str) -> Vec<String> {
        self.pool().members.get(group).cloned().unwrap_or_default()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.pool().group(group).is_some()
    }

    fn pool(&self) -> std::sync::MutexGuard<'_, UserPool> {
        self.inner.pool.lock().unwrap()
    }

    pub(crate) async fn spawn(&self) -> (SocketAddr, CancellationToken) {
        let app = Router::new().route("/", post(dispatch)).with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let ct = CancellationToken::new();
        let shutdown = ct.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .unwrap();
        });

        (address, ct)
    }
}

async fn dispatch(State(mock): State<CognitoMock>, headers: HeaderMap, body: Bytes) -> Response {
    let operation = headers
        .get("x-amz-target")
        .and_then(|value| value.to_str().ok())
        .and_then(|target| target.strip_prefix(TARGET_PREFIX))
        .unwrap_or_default()
        .to_string();

    let request: Value = serde_json::from_slice(&body).unwrap_or_default();

    mock.inner.calls.lock().unwrap().push(CognitoCall {
        operation: operation.clone(),
        request: request.clone(),
    });

    if let Some((error_type, message)) = mock.inner.failures.get(&operation) {
        return error(error_type, message);
    }

    let mut pool = mock.pool();

    let group_name = request["GroupName"].as_str().unwrap_or_default().to_string();
    let username = request["Username"].as_str().unwrap_or_default().to_string();

    match operation.as_str() {
        "AdminAddUserToGroup" => {
            if pool.group(&group_name).is_none() {
                return error("ResourceNotFoundException", "Group not found.");
            }

            if !pool.users.contains_key(&username) {
                return error("UserNotFoundException", "User does not exist.");
            }

            let members = pool.members.entry(group_name).or_default();

            if !members.contains(&username) {
                members.push(username);
            }

            ok(json!({}))
        }
        "AdminRemoveUserFromGroup" => {
            if pool.group(&group_name).is_none() {
                return error("ResourceNotFoundException", "Group not found.");
            }

            if !pool.users.contains_key(&username) {
                return error("UserNotFoundException", "User does not exist.");
            }

            if let Some(members) = pool.members.get_mut(&group_name) {
                members.retain(|member| *member != username);
            }

            ok(json!({}))
        }
        "GetGroup" => match pool.group(&group_name) {
            Some(group) => ok(json!({ "Group": group })),
            None => error("ResourceNotFoundException", "Group not found."),
        },
        "CreateGroup" => {
            if pool.group(&group_name).is_some() {
                return error("GroupExistsException", "A group with the name already exists.");
            }

            let group = json!({
                "GroupName": group_name,
                "UserPoolId": USER_POOL_ID,
                "LastModifiedDate": TIMESTAMP,
                "CreationDate": TIMESTAMP,
            });

            pool.groups.push(group.clone());

            ok(json!({ "Group": group }))
        }
        "ListGroups" => {
            let (groups, next_token) = paginate(&pool.groups, &request);
            ok(page("Groups", groups, next_token))
        }
        "AdminListGroupsForUser" => {
            if !pool.users.contains_key(&username) {
                return error("UserNotFoundException", "User does not exist.");
            }

            let groups: Vec<Value> = pool
                .groups
                .iter()
                .filter(|group| {
                    let name = group["GroupName"].as_str().unwrap_or_default();
                    pool.members.get(name).is_some_and(|members| members.contains(&username))
                })
                .cloned()
                .collect();

            let (groups, next_token) = paginate(&groups, &request);
            ok(page("Groups", groups, next_token))
        }
        "ListUsersInGroup" => {
            if pool.group(&group_name).is_none() {
                return error("ResourceNotFoundException", "Group not found.");
            }

            let users: Vec<Value> = pool
                .members
                .get(&group_name)
                .into_iter()
                .flatten()
                .filter_map(|member| pool.users.get(member).cloned())
                .collect();

            let (users, next_token) = paginate(&users, &request);
            ok(page("Users", users, next_token))
        }
        _ => error("UnknownOperationException", "Unknown operation"),
    }
}

/// Offset cursor. Without a `Limit` the whole remainder is returned.
fn paginate(entries: &[Value], request: &Value) -> (Vec<Value>, Option<String>) {
    let start = request["NextToken"]
        .as_str()
        .and_then(|token| token.parse::<usize>().ok())
        .unwrap_or(0)
        .min(entries.len());

    let end = match request["Limit"].as_u64() {
        Some(limit) => (start + limit as usize).min(entries.len()),
        None => entries.len(),
    };

    let next_token = (end < entries.len()).then(|| end.to_string());

    (entries[start..end].to_vec(), next_token)
}

fn page(key: &str, entries: Vec<Value>, next_token: Option<String>) -> Value {
    let mut page = json!({ key: entries });

    if let Some(token) = next_token {
        page["NextToken"] = Value::String(token);
    }

    page
}

fn ok(body: Value) -> Response {
    (
        StatusCode::OK,
        [("content-type", CONTENT_TYPE)],
        body.to_string(),
    )
        .into_response()
}

fn error(error_type: &str, message: &str) -> Response {
    let body = json!({ "__type": error_type, "message": message });

    (
        StatusCode::BAD_REQUEST,
        [
            ("content-type", CONTENT_TYPE.to_string()),
            ("x-amzn-errortype", error_type.to_string()),
        ],
        body.to_string(),
    )
        .into_response()
}

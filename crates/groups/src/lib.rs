//! Group administration endpoints.
//!
//! Callers manage their own memberships and browse the groups of the user
//! pool. Access control happens in front of this router.

mod error;
mod request;
mod service;

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Extension, Json, Query, State, rejection::QueryRejection},
    http::HeaderMap,
    routing::{get, post},
};
use context::Claims;
use directory::DirectoryClient;

pub use error::{GroupError, GroupResult as Result};
pub use service::{GroupService, GroupsPage, Message, UsersPage};

use request::ListQuery;

/// Creates an axum router for the group endpoints.
pub fn router(directory: Arc<dyn DirectoryClient>) -> Router {
    let service = Arc::new(GroupService::new(directory));

    Router::new()
        .route("/addMeToGroup", post(add_me_to_group))
        .route("/removeMeFromGroup", post(remove_me_from_group))
        .route("/addGroupAndJoinMe", post(add_group_and_join_me))
        .route("/listGroups", get(list_groups))
        .route("/listGroupsForMe", get(list_groups_for_me))
        .route("/listUsersInGroup", get(list_users_in_group))
        .with_state(service)
}

async fn add_me_to_group(
    State(service): State<Arc<GroupService>>,
    claims: Option<Extension<Claims>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Message>> {
    let group = request::group_name(&headers, &body)?;
    let username = request::caller_username(claims.as_deref())?;

    Ok(Json(service.join_group(&username, &group).await?))
}

async fn remove_me_from_group(
    State(service): State<Arc<GroupService>>,
    claims: Option<Extension<Claims>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Message>> {
    let group = request::group_name(&headers, &body)?;
    let username = request::caller_username(claims.as_deref())?;

    Ok(Json(service.leave_group(&username, &group).await?))
}

async fn add_group_and_join_me(
    State(service): State<Arc<GroupService>>,
    claims: Option<Extension<Claims>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Message>> {
    let group = request::group_name(&headers, &body)?;
    let username = request::caller_username(claims.as_deref())?;

    Ok(Json(service.create_and_join_group(&username, &group).await?))
}

async fn list_groups(
    State(service): State<Arc<GroupService>>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<GroupsPage>> {
    let page = list_query(query)?.page()?;
    let response = service.list_groups(page).await?;

    log::debug!("Returning {} groups", response.groups.len());
    Ok(Json(response))
}

async fn list_groups_for_me(
    State(service): State<Arc<GroupService>>,
    claims: Option<Extension<Claims>>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<GroupsPage>> {
    let page = list_query(query)?.page()?;
    let username = request::caller_username(claims.as_deref())?;

    let response = service.list_groups_for_user(&username, page).await?;

    log::debug!("Returning {} groups for {username}", response.groups.len());
    Ok(Json(response))
}

async fn list_users_in_group(
    State(service): State<Arc<GroupService>>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<UsersPage>> {
    let query = list_query(query)?;
    let group = query.groupname.clone().unwrap_or_default();

    // the group name is checked before the page parameters
    if group.is_empty() {
        return Err(GroupError::Validation("groupname is required".to_string()));
    }

    let response = service.list_users_in_group(&group, query.page()?).await?;

    log::debug!("Returning {} users of {group}", response.users.len());
    Ok(Json(response))
}

fn list_query(query: std::result::Result<Query<ListQuery>, QueryRejection>) -> Result<ListQuery> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(rejection) => Err(GroupError::Validation(rejection.body_text())),
    }
}

//! Access to the identity directory that owns users and groups.
//!
//! The [`DirectoryClient`] trait is the seam between the group operations and the
//! directory service. [`CognitoDirectory`] implements it on top of a Cognito user
//! pool; tests substitute their own implementation.

mod cognito;
mod error;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use cognito::CognitoDirectory;
pub use error::{DirectoryError, DirectoryResult as Result};

/// A group or user record, keyed by the directory's attribute names.
pub type Entry = Map<String, Value>;

/// Page selection for the list operations.
///
/// `None` values are left out of the directory request entirely. Some
/// directories read an empty limit as "no results" instead of "default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u32>,
    /// Opaque cursor from a previous response of the same operation.
    pub token: Option<String>,
}

/// Result of looking up a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLookup {
    Found,
    NotFound,
}

/// One page of `ListGroups`.
///
/// The directory returns this cursor as a pagination token, unlike the other
/// list operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListGroupsOutput {
    pub groups: Vec<Entry>,
    pub pagination_token: Option<String>,
}

/// One page of `AdminListGroupsForUser`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListGroupsForUserOutput {
    pub groups: Vec<Entry>,
    pub next_token: Option<String>,
}

/// One page of `ListUsersInGroup`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListUsersInGroupOutput {
    pub users: Vec<Entry>,
    pub next_token: Option<String>,
}

/// Group management primitives of the identity directory.
///
/// Implementations pass errors through unchanged and hold no request state.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn add_user_to_group(&self, username: &str, group: &str) -> Result<()>;

    async fn remove_user_from_group(&self, username: &str, group: &str) -> Result<()>;

    /// Looks a group up. Only a definite "does not exist" answer maps to
    /// [`GroupLookup::NotFound`], every other failure is an error.
    async fn get_group(&self, group: &str) -> Result<GroupLookup>;

    async fn create_group(&self, group: &str) -> Result<()>;

    async fn list_groups(&self, page: PageRequest) -> Result<ListGroupsOutput>;

    async fn list_groups_for_user(&self, username: &str, page: PageRequest) -> Result<ListGroupsForUserOutput>;

    async fn list_users_in_group(&self, group: &str, page: PageRequest) -> Result<ListUsersInGroupOutput>;
}

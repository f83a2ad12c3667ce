//! Group membership operations on top of the directory.

use std::sync::Arc;

use directory::{DirectoryClient, Entry, GroupLookup, PageRequest};
use serde::Serialize;

use crate::error::{GroupError, GroupResult};

/// Attributes that are never returned when listing the caller's own groups.
pub(crate) const REDACTED_GROUP_FIELDS: [&str; 5] = ["UserPoolId", "LastModifiedDate", "CreationDate", "Precedence", "RoleArn"];

/// Error code the directory uses when a group of that name already exists.
const GROUP_EXISTS: &str = "GroupExistsException";

/// Confirmation returned by the membership operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// A page of groups. The cursor is always named `NextToken`, whatever the
/// directory calls it for the underlying operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupsPage {
    pub groups: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// A page of group members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsersPage {
    pub users: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Clone)]
pub struct GroupService {
    directory: Arc<dyn DirectoryClient>,
}

impl GroupService {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }

    /// Add the caller to a group.
    pub async fn join_group(&self, username: &str, group: &str) -> GroupResult<Message> {
        let group = require_group_name(group, "Groupname is required")?;

        self.directory.add_user_to_group(username, group).await?;

        Ok(Message::new(format!("Success adding {username} to {group}")))
    }

    /// Remove the caller from a group.
    pub async fn leave_group(&self, username: &str, group: &str) -> GroupResult<Message> {
        let group = require_group_name(group, "Groupname is required")?;

        self.directory.remove_user_from_group(username, group).await?;

        Ok(Message::new(format!("Removed {username} from {group}")))
    }

    /// Create the group unless it exists, then add the caller to it.
    ///
    /// Only a definite "not found" triggers the creation. Any other lookup
    /// failure aborts before anything is written.
    pub async fn create_and_join_group(&self, username: &str, group: &str) -> GroupResult<Message> {
        let group = require_group_name(group, "Groupname is required")?;

        let lookup = self
            .directory
            .get_group(group)
            .await
            .map_err(|source| GroupError::GroupLookup {
                group: group.to_string(),
                source,
            })?;

        match lookup {
            GroupLookup::Found => log::debug!("Group {group} already exists"),
            GroupLookup::NotFound => match self.directory.create_group(group).await {
                Ok(()) => (),
                // created concurrently by another request
                Err(error) if error.code() == Some(GROUP_EXISTS) => {
                    log::debug!("Group {group} was created concurrently");
                }
                Err(source) => {
                    return Err(GroupError::GroupCreation {
                        group: group.to_string(),
                        source,
                    });
                }
            },
        }

        self.directory.add_user_to_group(username, group).await?;

        Ok(Message::new(format!("Success in creating {group} and adding {username}")))
    }

    /// List all groups of the user pool.
    pub async fn list_groups(&self, page: PageRequest) -> GroupResult<GroupsPage> {
        let output = self.directory.list_groups(page).await?;

        Ok(GroupsPage {
            groups: output.groups,
            next_token: output.pagination_token,
        })
    }

    /// List the groups of the caller, without the attributes in
    /// [`REDACTED_GROUP_FIELDS`].
    pub async fn list_groups_for_user(&self, username: &str, page: PageRequest) -> GroupResult<GroupsPage> {
        let output = self.directory.list_groups_for_user(username, page).await?;

        let mut groups = output.groups;
        groups.iter_mut().for_each(redact_group);

        Ok(GroupsPage {
            groups,
            next_token: output.next_token,
        })
    }

    /// List the members of a group.
    pub async fn list_users_in_group(&self, group: &str, page: PageRequest) -> GroupResult<UsersPage> {
        let group = require_group_name(group, "groupname is required")?;

        let output = self.directory.list_users_in_group(group, page).await?;

        Ok(UsersPage {
            users: output.users,
            next_token: output.next_token,
        })
    }
}

fn require_group_name<'a>(group: &'a str, message: &str) -> GroupResult<&'a str> {
    if group.is_empty() {
        return Err(GroupError::Validation(message.to_string()));
    }

    Ok(group)
}

fn redact_group(group: &mut Entry) {
    for field in REDACTED_GROUP_FIELDS {
        group.remove(field);
    }
}

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Claims of the caller, verified by the authorizer in front of this service.
///
/// Only the claims used for group administration are typed, everything else is
/// kept in `additional`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Username claim of Cognito access tokens.
    #[serde(default)]
    pub username: Option<String>,

    /// Group memberships. `None` means the token carried no groups claim at all.
    #[serde(default, rename = "cognito:groups", deserialize_with = "deserialize_groups")]
    pub groups: Option<BTreeSet<String>>,

    /// Subject claim - identifies the principal that is the subject of the JWT
    #[serde(default, rename = "sub")]
    pub subject: Option<String>,

    /// Additional claims for flexible access to custom fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

impl Claims {
    /// The caller's username.
    ///
    /// ID tokens carry it as `cognito:username` instead of `username`.
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or_else(|| self.additional.get("cognito:username").and_then(Value::as_str))
            .filter(|username| !username.is_empty())
    }

    /// Whether the caller is a member of `group`. Returns `None` when the
    /// memberships are unknown.
    pub fn is_member_of(&self, group: &str) -> Option<bool> {
        self.groups.as_ref().map(|groups| groups.contains(group))
    }
}

/// The authorizer flattens list claims into a comma separated string, but a
/// JSON list is accepted as well.
fn deserialize_groups<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawGroups {
        Joined(String),
        List(Vec<String>),
    }

    let groups = match Option::<RawGroups>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawGroups::Joined(joined)) => parse_group_list(joined.split(',')),
        Some(RawGroups::List(list)) => parse_group_list(list.iter().map(String::as_str)),
    };

    Ok(Some(groups))
}

fn parse_group_list<'a>(groups: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    groups
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(str::to_string)
        .collect()
}

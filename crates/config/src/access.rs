//! Access control for the administrative endpoints.

use serde::Deserialize;

/// Admin group value that switches group enforcement off.
pub const DISABLED_ADMIN_GROUP: &str = "NONE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Group the caller must belong to. Unset, empty or `NONE` disables enforcement.
    pub admin_group: Option<String>,
    /// Path that stays reachable for every caller, even without the admin group.
    pub sign_out_path: String,
}

impl AccessConfig {
    /// The group callers must be members of, if enforcement is enabled.
    pub fn enforced_group(&self) -> Option<&str> {
        self.admin_group
            .as_deref()
            .filter(|group| !group.is_empty() && *group != DISABLED_ADMIN_GROUP)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_group: None,
            sign_out_path: "/signUserOut".to_string(),
        }
    }
}

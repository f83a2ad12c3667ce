use config::AccessConfig;
use context::Claims;
use groups::GroupError;

/// Admin group check in front of every endpoint.
#[derive(Debug)]
pub(crate) struct Gate {
    admin_group: Option<String>,
    exempt_paths: Vec<String>,
}

impl Gate {
    pub fn new(access: &AccessConfig, exempt_paths: &[&str]) -> Self {
        let exempt_paths = std::iter::once(access.sign_out_path.as_str())
            .chain(exempt_paths.iter().copied())
            .map(str::to_string)
            .collect();

        Self {
            admin_group: access.enforced_group().map(str::to_string),
            exempt_paths,
        }
    }

    /// Let the request through if enforcement is disabled, the path is exempt
    /// or the caller is a member of the admin group. Unknown memberships deny.
    pub fn authorize(&self, path: &str, claims: Option<&Claims>) -> Result<(), GroupError> {
        let Some(admin_group) = self.admin_group.as_deref() else {
            return Ok(());
        };

        if self.exempt_paths.iter().any(|exempt| exempt == path) {
            return Ok(());
        }

        let is_member = claims.and_then(|claims| claims.is_member_of(admin_group));

        match is_member {
            Some(true) => Ok(()),
            Some(false) => {
                log::warn!(
                    "Denied {path} to {}: not a member of {admin_group}",
                    caller(claims)
                );
                Err(GroupError::Forbidden)
            }
            None => {
                log::warn!("Denied {path} to {}: no group memberships in the claims", caller(claims));
                Err(GroupError::Forbidden)
            }
        }
    }
}

fn caller(claims: Option<&Claims>) -> &str {
    claims.and_then(Claims::username).unwrap_or("anonymous caller")
}

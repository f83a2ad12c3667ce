//! Identity directory (Cognito user pool) connection settings.

use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// The user pool every group operation runs against.
    pub user_pool_id: String,

    /// AWS region of the user pool.
    pub region: String,

    /// AWS profile name (optional - uses default profile if not specified).
    pub profile: Option<String>,

    /// AWS Access Key ID (optional - uses credential chain if not provided).
    pub access_key_id: Option<SecretString>,

    /// AWS Secret Access Key (required if access_key_id is provided).
    pub secret_access_key: Option<SecretString>,

    /// AWS Session Token (optional - for temporary credentials).
    pub session_token: Option<SecretString>,

    /// Custom endpoint URL (optional - for VPC endpoints and local testing).
    pub base_url: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            user_pool_id: String::new(),
            region: "us-east-1".to_string(),
            profile: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            base_url: None,
        }
    }
}

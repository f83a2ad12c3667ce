use std::path::Path;

use anyhow::bail;
use indoc::indoc;

use crate::Config;

/// Reads and parses the configuration file.
///
/// The directory section is not checked here, because the user pool is commonly
/// provided through the environment after loading. Call [`validate`] once all
/// overrides are in place.
pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;

    validate_access(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    validate_access(config)?;
    validate_directory(config)?;

    Ok(())
}

fn validate_access(config: &Config) -> anyhow::Result<()> {
    if !config.access.sign_out_path.starts_with('/') {
        bail!(
            "Invalid sign out path '{}': the path must start with '/'",
            config.access.sign_out_path
        );
    }

    Ok(())
}

fn validate_directory(config: &Config) -> anyhow::Result<()> {
    let directory = &config.directory;

    if directory.user_pool_id.trim().is_empty() {
        bail!(indoc! {r#"
            No user pool configured. All group operations run against a Cognito user pool.

            Set the USERPOOL environment variable, or configure it explicitly:

              [directory]
              user_pool_id = "us-east-1_AbCdEf123"
              region = "us-east-1"
        "#});
    }

    if directory.access_key_id.is_some() != directory.secret_access_key.is_some() {
        bail!("Directory credentials are incomplete: access_key_id and secret_access_key must be set together");
    }

    if directory.session_token.is_some() && directory.access_key_id.is_none() {
        bail!("Directory session_token requires access_key_id and secret_access_key");
    }

    Ok(())
}

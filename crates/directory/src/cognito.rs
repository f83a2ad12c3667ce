//! Cognito user pool implementation of the directory.
//!
//! Every call is a single request against the user pool management API. Page
//! parameters that were not supplied are not sent at all.

mod entries;

use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_cognitoidentityprovider::{Client, error::ProvideErrorMetadata};
use aws_smithy_runtime_api::client::{orchestrator::HttpResponse, result::SdkError};
use config::DirectoryConfig;
use secrecy::ExposeSecret;

use crate::{
    DirectoryClient, DirectoryError, GroupLookup, ListGroupsForUserOutput, ListGroupsOutput, ListUsersInGroupOutput,
    PageRequest,
};

/// Directory backed by a Cognito user pool.
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
}

impl CognitoDirectory {
    /// Create a client for the user pool in the configuration.
    pub async fn new(config: &DirectoryConfig) -> Self {
        let sdk_config = create_aws_config(config).await;

        Self {
            client: Client::new(&sdk_config),
            user_pool_id: config.user_pool_id.clone(),
        }
    }
}

#[async_trait]
impl DirectoryClient for CognitoDirectory {
    async fn add_user_to_group(&self, username: &str, group: &str) -> crate::Result<()> {
        log::debug!("Attempting to add {username} to {group}");

        self.client
            .admin_add_user_to_group()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .group_name(group)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to add {username} to {group}: {e:?}");
                handle_cognito_error(e)
            })?;

        log::info!("Success adding {username} to {group}");

        Ok(())
    }

    async fn remove_user_from_group(&self, username: &str, group: &str) -> crate::Result<()> {
        log::debug!("Attempting to remove {username} from {group}");

        self.client
            .admin_remove_user_from_group()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .group_name(group)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to remove {username} from {group}: {e:?}");
                handle_cognito_error(e)
            })?;

        log::info!("Removed {username} from {group}");

        Ok(())
    }

    async fn get_group(&self, group: &str) -> crate::Result<GroupLookup> {
        let result = self
            .client
            .get_group()
            .user_pool_id(&self.user_pool_id)
            .group_name(group)
            .send()
            .await;

        match result {
            Ok(_) => Ok(GroupLookup::Found),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_resource_not_found_exception()) => {
                log::debug!("Group {group} does not exist");
                Ok(GroupLookup::NotFound)
            }
            Err(e) => {
                log::error!("Failed to look up group {group}: {e:?}");
                Err(handle_cognito_error(e))
            }
        }
    }

    async fn create_group(&self, group: &str) -> crate::Result<()> {
        log::debug!("Attempting to create group {group}");

        self.client
            .create_group()
            .user_pool_id(&self.user_pool_id)
            .group_name(group)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to create group {group}: {e:?}");
                handle_cognito_error(e)
            })?;

        log::info!("Created group {group}");

        Ok(())
    }

    async fn list_groups(&self, page: PageRequest) -> crate::Result<ListGroupsOutput> {
        log::debug!("Attempting to list groups");

        let output = self
            .client
            .list_groups()
            .user_pool_id(&self.user_pool_id)
            .set_limit(page.limit.map(clamp_limit))
            .set_next_token(page.token)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to list groups: {e:?}");
                handle_cognito_error(e)
            })?;

        Ok(ListGroupsOutput {
            groups: output.groups().iter().map(entries::group_entry).collect(),
            pagination_token: output.next_token().map(str::to_string),
        })
    }

    async fn list_groups_for_user(&self, username: &str, page: PageRequest) -> crate::Result<ListGroupsForUserOutput> {
        log::debug!("Attempting to list groups for {username}");

        let output = self
            .client
            .admin_list_groups_for_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .set_limit(page.limit.map(clamp_limit))
            .set_next_token(page.token)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to list groups for {username}: {e:?}");
                handle_cognito_error(e)
            })?;

        Ok(ListGroupsForUserOutput {
            groups: output.groups().iter().map(entries::group_entry).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn list_users_in_group(&self, group: &str, page: PageRequest) -> crate::Result<ListUsersInGroupOutput> {
        log::debug!("Attempting to list users in group {group}");

        let output = self
            .client
            .list_users_in_group()
            .user_pool_id(&self.user_pool_id)
            .group_name(group)
            .set_limit(page.limit.map(clamp_limit))
            .set_next_token(page.token)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to list users in group {group}: {e:?}");
                handle_cognito_error(e)
            })?;

        Ok(ListUsersInGroupOutput {
            users: output.users().iter().map(entries::user_entry).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn clamp_limit(limit: u32) -> i32 {
    i32::try_from(limit).unwrap_or(i32::MAX)
}

/// Create AWS SDK configuration from the directory config.
async fn create_aws_config(config: &DirectoryConfig) -> aws_config::SdkConfig {
    let region = Region::new(config.region.clone());

    let mut config_loader = aws_config::from_env().region(region);

    // Use explicit credentials if provided
    if let (Some(access_key), Some(secret_key)) = (&config.access_key_id, &config.secret_access_key) {
        config_loader = config_loader.credentials_provider(Credentials::new(
            access_key.expose_secret(),
            secret_key.expose_secret(),
            config.session_token.as_ref().map(|t| t.expose_secret().to_string()),
            None,
            "directory_config",
        ));
    }

    if let Some(profile) = &config.profile {
        config_loader = config_loader.profile_name(profile);
    }

    let mut sdk_config = config_loader.load().await;

    if let Some(base_url) = &config.base_url {
        log::debug!("Using custom Cognito endpoint: {base_url}");
        sdk_config = sdk_config.into_builder().endpoint_url(base_url).build();
    }

    sdk_config
}

/// Convert Cognito SDK errors to directory errors without reinterpreting them.
fn handle_cognito_error<E>(error: SdkError<E, HttpResponse>) -> DirectoryError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match &error {
        SdkError::ServiceError(service_error) => {
            let err = service_error.err();
            let code = err.code().map(str::to_string);

            let message = err
                .message()
                .or(code.as_deref())
                .unwrap_or("Unknown error")
                .to_string();

            DirectoryError::Service {
                code,
                message,
                status: Some(service_error.raw().status().as_u16()),
            }
        }
        _ => DirectoryError::Connection(format!("{error:?}")),
    }
}

mod access;
mod directory;
mod loader;
mod server;

use std::path::Path;

use serde::Deserialize;

pub use access::{AccessConfig, DISABLED_ADMIN_GROUP};
pub use directory::DirectoryConfig;
pub use server::{CorsConfig, ServerConfig, TlsServerConfig};

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates a configuration that was not read from a file, e.g. after
    /// command line overrides were applied.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

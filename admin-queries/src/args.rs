use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use config::Config;

const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Group administration API for a Cognito user pool.
#[derive(Debug, Parser)]
#[command(name = "admin-queries", version, about)]
pub struct Args {
    /// IP address and port to listen on. Overrides the configuration file.
    #[arg(short, long, env = "ADMIN_QUERIES_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,

    /// Path to the TOML configuration file. Defaults apply if the file does not exist.
    #[arg(short, long, env = "ADMIN_QUERIES_CONFIG_PATH", default_value = "./admin-queries.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. "info" or "server=debug,groups=debug".
    #[arg(long, env = "ADMIN_QUERIES_LOG", default_value = "info")]
    pub log_level: String,

    /// Group callers must belong to. "NONE" disables the check.
    #[arg(long, env = "GROUP")]
    pub admin_group: Option<String>,

    /// Cognito user pool holding the groups.
    #[arg(long, env = "USERPOOL")]
    pub user_pool_id: Option<String>,
}

impl Args {
    /// Load the configuration file and apply the overrides from the command line.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = if self.config.exists() {
            Config::load(&self.config).with_context(|| format!("failed to load {}", self.config.display()))?
        } else {
            log::debug!("{} not found, using the default configuration", self.config.display());
            Config::default()
        };

        if let Some(group) = &self.admin_group {
            config.access.admin_group = Some(group.clone());
        }

        if let Some(user_pool_id) = &self.user_pool_id {
            config.directory.user_pool_id = user_pool_id.clone();
        }

        Ok(config)
    }

    pub fn listen_address(&self, config: &Config) -> SocketAddr {
        self.listen_address
            .or(config.server.listen_address)
            .unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }
}

//! Process-level settings read from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings of the webhook service.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Token used for every GitHub API call.
    pub github_token: String,

    /// Shared secret of the GitHub webhook.
    pub webhook_secret: Vec<u8>,

    /// GitHub user ID the bot acts as. Pull requests authored by this user
    /// are the cascading ones; when unset, no PR is treated as cascading.
    pub bot_user_id: Option<u64>,

    pub listen_addr: SocketAddr,
}

impl ServiceConfig {
    /// Reads `GITHUB_TOKEN`, `WEBHOOK_SECRET`, `CASCADING_BOT_USER_ID` and
    /// `LISTEN_ADDR`.
    pub fn from_env() -> Result<Self, ServiceConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ServiceConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ServiceConfigError::Missing(name))
        };

        let github_token = required("GITHUB_TOKEN")?;
        let webhook_secret = required("WEBHOOK_SECRET")?.into_bytes();

        let bot_user_id = match lookup("CASCADING_BOT_USER_ID").filter(|v| !v.is_empty()) {
            Some(value) => Some(value.parse::<u64>().map_err(|_| {
                ServiceConfigError::Invalid {
                    name: "CASCADING_BOT_USER_ID",
                    value,
                }
            })?),
            None => None,
        };

        let listen_addr = lookup("LISTEN_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse()
            .map_err(|_| ServiceConfigError::Invalid {
                name: "LISTEN_ADDR",
                value: listen_addr.clone(),
            })?;

        Ok(ServiceConfig {
            github_token,
            webhook_secret,
            bot_user_id,
            listen_addr,
        })
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bot_user_id", &self.bot_user_id)
            .field("listen_addr", &self.listen_addr)
            .finish_non_exhaustive()
    }
}

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::backoff::BackoffPolicy;

/// Provider config
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Tendermint RPC endpoint of the consensus node.
    pub rpc_url: String,
    /// Retry delays of the approved-from query.
    #[serde(default = "BackoffPolicy::fast")]
    pub backoff: BackoffPolicy,
    /// Resolve the chain id once per provider instead of on every call.
    #[serde(default = "defaults::default_true")]
    pub cache_chain_id: bool,
}

impl Config {
    /// Reads config from a file
    ///
    /// # Errors
    /// Fails if the file cannot be read, parsed or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse JSON configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validates the parsed config
    ///
    /// # Errors
    /// Fails on an empty or non-http(s) RPC url, or an invalid backoff policy.
    pub fn validate(&self) -> Result<()> {
        let rpc_url = self.rpc_url.trim();

        anyhow::ensure!(!rpc_url.is_empty(), "RPC url cannot be empty");
        anyhow::ensure!(
            rpc_url.starts_with("http://") || rpc_url.starts_with("https://"),
            "RPC url must start with 'http://' or 'https://': '{}'",
            rpc_url
        );

        self.backoff.validate().context("Invalid backoff policy")?;

        Ok(())
    }
}

mod defaults {
    pub const fn default_true() -> bool {
        true
    }
}

use serde::{Deserialize, Serialize};

/// Where the account's private key comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WalletSource {
    /// JSON wallet file, optionally encrypted with scrypt + AES-256-GCM.
    File {
        path: String,
        #[serde(default)]
        encrypted: bool,
    },
    /// Raw hex key held in the named environment variable.
    Env {
        #[serde(default = "default_env_key")]
        key: String,
    },
}

fn default_env_key() -> String {
    "PRIVATE_KEY".to_string()
}

impl Default for WalletSource {
    fn default() -> Self {
        WalletSource::Env {
            key: default_env_key(),
        }
    }
}

impl WalletSource {
    pub fn needs_password(&self) -> bool {
        matches!(self, WalletSource::File { encrypted: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: String,
    /// Expected chain id. When set, startup fails if the endpoint reports another.
    #[serde(default)]
    pub chain_id: Option<u64>,
}

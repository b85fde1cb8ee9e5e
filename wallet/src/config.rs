//! Wallet client settings.
//!
//! Read from `wallet.json` in the data directory. Every key is optional and
//! falls back to its default, so an empty object is a valid file and a
//! missing file is the same as an empty one.
//!
//! ```json
//! {
//!   "clientIdGoogle": "....apps.googleusercontent.com",
//!   "saltServiceUrl": "https://salt.api.mystenlabs.com/get_salt",
//!   "backendUrl": "http://localhost:3001"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use microloan_protocol::config::{Network, DEFAULT_API_PORT};

use crate::error::{WalletError, WalletResult};
use crate::identity::Provider;

pub const CONFIG_FILE_NAME: &str = "wallet.json";

pub const DEFAULT_SALT_SERVICE_URL: &str = "https://salt.api.mystenlabs.com/get_salt";
pub const DEFAULT_PROVER_URL: &str = "https://prover-dev.mystenlabs.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/callback";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    pub client_id_google: String,
    pub client_id_twitch: String,
    pub client_id_facebook: String,
    pub salt_service_url: String,
    pub prover_url: String,
    /// Base URL of the microloan server.
    pub backend_url: String,
    /// Where the provider sends the browser after login. The wallet never
    /// listens there; the user pastes the resulting URL back.
    pub redirect_uri: String,
    pub network: Network,
    /// Overrides the network's public fullnode.
    pub rpc_url: Option<String>,
    /// Overrides the network's faucet.
    pub faucet_url: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            client_id_google: String::new(),
            client_id_twitch: String::new(),
            client_id_facebook: String::new(),
            salt_service_url: DEFAULT_SALT_SERVICE_URL.to_string(),
            prover_url: DEFAULT_PROVER_URL.to_string(),
            backend_url: format!("http://localhost:{DEFAULT_API_PORT}"),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            network: Network::default(),
            rpc_url: None,
            faucet_url: None,
        }
    }
}

impl WalletConfig {
    /// Loads `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> WalletResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(WalletError::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> WalletResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WalletError::Config(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| WalletError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// OAuth client id registered for `provider`.
    pub fn client_id(&self, provider: Provider) -> WalletResult<&str> {
        let id = match provider {
            Provider::Google => &self.client_id_google,
            Provider::Twitch => &self.client_id_twitch,
            Provider::Facebook => &self.client_id_facebook,
        };
        if id.is_empty() {
            return Err(WalletError::Config(format!(
                "no client id configured for {provider}"
            )));
        }
        Ok(id)
    }

    /// The fullnode URL to use.
    pub fn fullnode_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.fullnode_url())
    }

    /// The faucet gas endpoint to use.
    pub fn faucet_url(&self) -> WalletResult<&str> {
        self.faucet_url
            .as_deref()
            .or_else(|| self.network.faucet_url())
            .ok_or_else(|| WalletError::Config(format!("{} has no faucet", self.network)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = WalletConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(cfg, WalletConfig::default());
        assert_eq!(cfg.backend_url, "http://localhost:3001");
        assert_eq!(cfg.network, Network::Testnet);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"clientIdTwitch": "twitch-id", "network": "devnet"}"#,
        )
        .unwrap();

        let cfg = WalletConfig::load(&path).unwrap();
        assert_eq!(cfg.client_id(Provider::Twitch).unwrap(), "twitch-id");
        assert!(cfg.client_id(Provider::Google).is_err());
        assert_eq!(cfg.network, Network::Devnet);
        assert_eq!(cfg.prover_url, DEFAULT_PROVER_URL);
        assert!(cfg.fullnode_url().contains("devnet"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let cfg = WalletConfig {
            rpc_url: Some("http://127.0.0.1:9000".into()),
            ..WalletConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = WalletConfig::load(&path).unwrap();
        assert_eq!(loaded.fullnode_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn faucet_follows_network_unless_overridden() {
        let mut cfg = WalletConfig::default();
        assert!(cfg.faucet_url().unwrap().contains("faucet.testnet"));

        cfg.network = Network::Mainnet;
        assert!(cfg.faucet_url().is_err());

        cfg.faucet_url = Some("http://127.0.0.1:9123/v2/gas".into());
        assert_eq!(cfg.faucet_url().unwrap(), "http://127.0.0.1:9123/v2/gas");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(WalletConfig::load(&path).is_err());
    }
}

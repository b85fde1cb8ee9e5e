//! # Identity / Session Manager
//!
//! Drives the zkLogin OAuth flow.
//!
//! 1. [`IdentityManager::start_login`] reads the current epoch, creates an
//!    ephemeral key and nonce randomness, stores them as a [`Setup`] and
//!    returns the provider's authorization URL.
//! 2. The user logs in in a browser and is redirected to the configured
//!    redirect URI with `#id_token=...` in the fragment.
//! 3. [`IdentityManager::complete_login`] takes that URL (or just the
//!    fragment), fetches the salt and the proof, derives the address and
//!    stores the [`Account`], consuming the setup.
//!
//! A failure anywhere in step 3 keeps the setup, so the same login can be
//! completed again with a fresh token.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use microloan_protocol::config::MAX_EPOCH_OFFSET;
use microloan_protocol::crypto::EphemeralKeypair;
use microloan_protocol::ledger::Ledger;
use microloan_protocol::zklogin::{
    decode_claims, extended_ephemeral_public_key, generate_nonce, generate_randomness,
    jwt_to_address,
};

use crate::config::WalletConfig;
use crate::error::{WalletError, WalletResult};
use crate::session::{Account, SessionStore, Setup};
use crate::zk_services::{ProofRequest, ZkServices};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Supported OpenID providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Google,
    Twitch,
    Facebook,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Twitch, Provider::Facebook];

    /// OAuth authorization endpoint.
    pub fn authorize_endpoint(&self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Twitch => "https://id.twitch.tv/oauth2/authorize",
            Provider::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Google => "Google",
            Provider::Twitch => "Twitch",
            Provider::Facebook => "Facebook",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "twitch" => Ok(Provider::Twitch),
            "facebook" => Ok(Provider::Facebook),
            other => Err(format!(
                "unknown provider: {other} (expected google, twitch or facebook)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Callback parsing
// ---------------------------------------------------------------------------

/// Pulls `id_token` out of a redirect. Accepts the full URL, the `#fragment`
/// or the bare fragment.
pub fn extract_id_token(callback: &str) -> Option<String> {
    let callback = callback.trim();
    let fragment = match callback.split_once('#') {
        Some((_, fragment)) => fragment,
        None => callback,
    };
    // Decode the fragment as a query string.
    let url = reqwest::Url::parse(&format!("http://callback/?{fragment}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "id_token")
        .map(|(_, v)| v.into_owned())
        .filter(|token| !token.is_empty())
}

// ---------------------------------------------------------------------------
// IdentityManager
// ---------------------------------------------------------------------------

pub struct IdentityManager {
    ledger: Arc<dyn Ledger>,
    store: SessionStore,
    config: WalletConfig,
    zk: ZkServices,
}

impl IdentityManager {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        store: SessionStore,
        config: WalletConfig,
        zk: ZkServices,
    ) -> Self {
        Self {
            ledger,
            store,
            config,
            zk,
        }
    }

    /// Begins a login with `provider` and returns the URL to open.
    pub async fn start_login(&self, provider: Provider) -> WalletResult<String> {
        let client_id = self.config.client_id(provider)?.to_string();
        let epoch = self.ledger.latest_epoch().await?;
        let max_epoch = epoch + MAX_EPOCH_OFFSET;

        let keypair = EphemeralKeypair::generate();
        let randomness = generate_randomness();
        let nonce = generate_nonce(&keypair, max_epoch, &randomness)?;

        self.store.save_setup(Setup {
            provider,
            max_epoch,
            randomness,
            ephemeral_key: keypair.to_bech32()?,
            started_at: Utc::now(),
        })?;
        info!(%provider, epoch, max_epoch, "login started");

        let url = reqwest::Url::parse_with_params(
            provider.authorize_endpoint(),
            &[
                ("client_id", client_id.as_str()),
                ("nonce", nonce.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "id_token"),
                ("scope", "openid"),
            ],
        )
        .map_err(|e| WalletError::Config(format!("invalid authorization URL: {e}")))?;
        Ok(url.into())
    }

    /// Finishes the pending login from the provider's redirect.
    ///
    /// Returns `Ok(None)` when there is no login in progress.
    pub async fn complete_login(&self, callback: &str) -> WalletResult<Option<Account>> {
        let jwt = extract_id_token(callback)
            .ok_or_else(|| WalletError::Callback("no id_token found".into()))?;
        let claims = decode_claims(&jwt)?;

        let Some(setup) = self.store.setup()? else {
            info!("no login in progress");
            return Ok(None);
        };

        let keypair = EphemeralKeypair::from_bech32(&setup.ephemeral_key)?;
        let expected_nonce = generate_nonce(&keypair, setup.max_epoch, &setup.randomness)?;
        if claims.nonce.as_deref() != Some(expected_nonce.as_str()) {
            warn!("token nonce does not match the pending login");
        }

        let salt = self.zk.fetch_salt(&jwt).await?;
        let address = jwt_to_address(&jwt, &salt)?;

        let request = ProofRequest::new(
            jwt.as_str(),
            salt.as_str(),
            setup.max_epoch,
            setup.randomness.as_str(),
            extended_ephemeral_public_key(&keypair),
        );
        let zk_proof = self.zk.fetch_proof(&request).await?;

        let account = Account {
            provider: setup.provider,
            address: address.to_string(),
            zk_proof,
            ephemeral_key: setup.ephemeral_key,
            salt,
            sub: claims.sub,
            aud: claims.aud,
            max_epoch: setup.max_epoch,
            logged_in_at: Utc::now(),
        };
        if !self.store.finish_login(account.clone())? {
            warn!(address = %account.address, "account rejected");
            return Ok(None);
        }
        info!(provider = %account.provider, address = %account.address, "login complete");
        Ok(Some(account))
    }
}

//! # Configuration & Constants
//!
//! Every magic number in the microloan stack lives here. If you're
//! hardcoding a package id or a gas budget somewhere else, move it here.
//!
//! Runtime-overridable settings (RPC URL, package id, ports) are exposed by
//! the binaries as CLI flags with `MICROLOAN_*` environment fallbacks; the
//! values below are their defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ObjectId;

// ---------------------------------------------------------------------------
// On-chain program
// ---------------------------------------------------------------------------

/// Package id of the deployed `microloan` Move package (testnet).
pub const DEFAULT_PACKAGE_ID: ObjectId = ObjectId::new([
    0x84, 0xb1, 0x0f, 0x34, 0x71, 0x85, 0x08, 0x9b, 0x21, 0xb5, 0xc1, 0xc9, 0x44, 0x3b, 0xae, 0xde,
    0x69, 0x8f, 0xe0, 0xd9, 0x3f, 0xc0, 0xf8, 0x2e, 0x0a, 0xdb, 0x65, 0x1a, 0x35, 0xaa, 0xb6, 0x73,
]);

/// Module inside the package that owns every entry function we call.
pub const DEFAULT_MODULE_NAME: &str = "microloan";

/// Struct name of the per-address reputation object.
pub const REPUTATION_STRUCT: &str = "Reputation";

/// Struct name of a loan request object.
pub const LOAN_REQUEST_STRUCT: &str = "LoanRequest";

/// Entry functions of the `microloan` module.
pub const FN_INIT_REPUTATION: &str = "init_reputation";
pub const FN_CREATE_LOAN: &str = "create_loan";
pub const FN_BACK_LOAN: &str = "back_loan";
pub const FN_REPAY: &str = "repay";

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// The native coin type. Everything is paid in SUI.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// MIST per SUI. Nine decimals, no exceptions.
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Number of decimal places of the SUI display unit.
pub const SUI_DECIMALS: usize = 9;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Every canonical address and object id starts with this.
pub const ADDRESS_PREFIX: &str = "0x";

/// Address and object id length in bytes.
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Gas budget attached to every transaction we build, in MIST.
/// 0.05 SUI covers any single microloan call with room to spare.
pub const DEFAULT_GAS_BUDGET: u64 = 50_000_000;

/// Upper bound on coin pages fetched while looking for a payment coin.
/// 10 pages of 50 coins is more dust than any demo wallet should carry.
pub const MAX_COIN_PAGES: usize = 10;

/// Page size requested from `suix_getCoins`.
pub const COIN_PAGE_SIZE: u32 = 50;

// ---------------------------------------------------------------------------
// zkLogin
// ---------------------------------------------------------------------------

/// Number of epochs an ephemeral key stays valid after login.
pub const MAX_EPOCH_OFFSET: u64 = 2;

/// Claim used as the stable user identifier when deriving addresses.
pub const KEY_CLAIM_NAME: &str = "sub";

/// Padded widths (in bytes) of the strings hashed into the address seed.
pub const MAX_KEY_CLAIM_NAME_LENGTH: usize = 32;
pub const MAX_KEY_CLAIM_VALUE_LENGTH: usize = 115;
pub const MAX_AUD_VALUE_LENGTH: usize = 120;

/// Bits packed into one field element when hashing strings (31 bytes).
pub const PACK_WIDTH: usize = 248;

/// Length of the nonce commitment embedded into the OAuth request.
pub const NONCE_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Client behaviour
// ---------------------------------------------------------------------------

/// How often the wallet polls balances while watching.
pub const BALANCE_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout applied to every outbound HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default port of the transaction builder API.
pub const DEFAULT_API_PORT: u16 = 3001;

/// Default port of the Prometheus endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9184;

/// Front-end origin allowed by CORS.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The Sui network a component talks to.
///
/// Server and wallet both default to testnet: the microloan package is
/// deployed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    /// Public fullnode JSON-RPC endpoint for this network.
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }

    /// Faucet gas endpoint. Mainnet has none.
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Testnet => Some("https://faucet.testnet.sui.io/v2/gas"),
            Network::Devnet => Some("https://faucet.devnet.sui.io/v2/gas"),
            Network::Localnet => Some("http://127.0.0.1:9123/v2/gas"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output format of the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for local development.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other} (expected pretty or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Program configuration
// ---------------------------------------------------------------------------

/// Where the microloan program lives and how transactions against it are
/// paid for. Shared by the server (builder) and the wallet (queries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Package id of the deployed Move package.
    pub package_id: ObjectId,
    /// Module name inside the package.
    pub module: String,
    /// Coin type used for payments and gas.
    pub coin_type: String,
    /// Gas budget per transaction, in MIST.
    pub gas_budget: u64,
}

impl ProgramConfig {
    /// Fully qualified Move type of the reputation object.
    pub fn reputation_type(&self) -> String {
        self.struct_type(REPUTATION_STRUCT)
    }

    /// Fully qualified Move type of a loan request object.
    pub fn loan_request_type(&self) -> String {
        self.struct_type(LOAN_REQUEST_STRUCT)
    }

    fn struct_type(&self, name: &str) -> String {
        format!("{}::{}::{}", self.package_id, self.module, name)
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            package_id: DEFAULT_PACKAGE_ID,
            module: DEFAULT_MODULE_NAME.to_string(),
            coin_type: SUI_COIN_TYPE.to_string(),
            gas_budget: DEFAULT_GAS_BUDGET,
        }
    }
}

// ---------------------------------------------------------------------------
// Amount helpers
// ---------------------------------------------------------------------------

/// Parses a decimal SUI amount ("1.5") into MIST without going through
/// floating point. More than nine fractional digits is an error, not a
/// silent rounding.
pub fn parse_sui_amount(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty amount".into());
    }
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if frac.len() > SUI_DECIMALS {
        return Err(format!("too many decimal places in {input}"));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(format!("invalid amount: {input}"));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| format!("invalid amount: {input}"))?
    };
    let frac_mist: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = SUI_DECIMALS);
        padded.parse().map_err(|_| format!("invalid amount: {input}"))?
    };

    whole
        .checked_mul(MIST_PER_SUI)
        .and_then(|m| m.checked_add(frac_mist))
        .ok_or_else(|| format!("amount overflows: {input}"))
}

/// Formats MIST as a SUI decimal string, trimming trailing zeros.
pub fn format_sui(mist: u128) -> String {
    let per = MIST_PER_SUI as u128;
    let whole = mist / per;
    let frac = mist % per;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = SUI_DECIMALS);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_round_trips_through_str() {
        for net in [
            Network::Mainnet,
            Network::Testnet,
            Network::Devnet,
            Network::Localnet,
        ] {
            assert_eq!(net.to_string().parse::<Network>().unwrap(), net);
        }
        assert!("moonnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_default_network_is_testnet() {
        assert_eq!(Network::default(), Network::Testnet);
        assert!(Network::default().fullnode_url().contains("testnet"));
    }

    #[test]
    fn test_faucet_exists_off_mainnet() {
        assert_eq!(Network::Mainnet.faucet_url(), None);
        assert!(Network::Testnet
            .faucet_url()
            .is_some_and(|url| url.contains("faucet.testnet")));
    }

    #[test]
    fn test_log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::default().to_string(), "pretty");
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_program_types_are_fully_qualified() {
        let cfg = ProgramConfig::default();
        assert_eq!(
            cfg.reputation_type(),
            format!("{DEFAULT_PACKAGE_ID}::microloan::Reputation")
        );
        assert!(cfg.loan_request_type().ends_with("::microloan::LoanRequest"));
        assert_eq!(
            DEFAULT_PACKAGE_ID.to_string(),
            "0x84b10f347185089b21b5c1c9443baede698fe0d93fc0f82e0adb651a35aab673"
        );
    }

    #[test]
    fn test_parse_sui_amount() {
        assert_eq!(parse_sui_amount("1").unwrap(), MIST_PER_SUI);
        assert_eq!(parse_sui_amount("1.5").unwrap(), 1_500_000_000);
        assert_eq!(parse_sui_amount("0.000000001").unwrap(), 1);
        assert_eq!(parse_sui_amount(".25").unwrap(), 250_000_000);
        assert!(parse_sui_amount("0.0000000001").is_err());
        assert!(parse_sui_amount("abc").is_err());
        assert!(parse_sui_amount("").is_err());
        assert!(parse_sui_amount(".").is_err());
        assert!(parse_sui_amount("99999999999999999999").is_err());
    }

    #[test]
    fn test_format_sui() {
        assert_eq!(format_sui(0), "0");
        assert_eq!(format_sui(2_000_000_000), "2");
        assert_eq!(format_sui(1_500_000_000), "1.5");
        assert_eq!(format_sui(1), "0.000000001");
    }

    #[test]
    fn test_zklogin_widths_pack_into_field_elements() {
        // Every padded width must chunk cleanly into 31-byte limbs.
        assert_eq!(PACK_WIDTH % 8, 0);
        for width in [
            MAX_KEY_CLAIM_NAME_LENGTH,
            MAX_KEY_CLAIM_VALUE_LENGTH,
            MAX_AUD_VALUE_LENGTH,
        ] {
            assert!(width.div_ceil(PACK_WIDTH / 8) <= 16);
        }
    }
}

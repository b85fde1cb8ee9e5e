//! # CLI Interface
//!
//! Command-line structure for `microloan-wallet`. Global options pick the
//! data directory and override `wallet.json`; subcommands stand in for the
//! buttons and forms of a browser front end.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use microloan_protocol::config::{parse_sui_amount, LogFormat, Network};
use microloan_protocol::types::ObjectId;
use microloan_wallet::identity::Provider;

/// zkLogin wallet for the microloan program.
#[derive(Parser, Debug)]
#[command(
    name = "microloan-wallet",
    about = "zkLogin wallet for the microloan program",
    version,
    propagate_version = true
)]
pub struct WalletCli {
    /// Directory holding `wallet.json` and the session store.
    #[arg(
        long,
        short = 'd',
        env = "MICROLOAN_WALLET_DIR",
        default_value = ".microloan-wallet",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Sui network; overrides `wallet.json`.
    #[arg(long, env = "MICROLOAN_NETWORK", global = true)]
    pub network: Option<Network>,

    /// Fullnode JSON-RPC URL; overrides `wallet.json`.
    #[arg(long, env = "MICROLOAN_RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Microloan server URL; overrides `wallet.json`.
    #[arg(long, env = "MICROLOAN_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Log output format: pretty or json.
    #[arg(
        long,
        env = "MICROLOAN_LOG_FORMAT",
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default `wallet.json` if there is none and print the settings.
    Config,
    /// Start a zkLogin with an OAuth provider and print the URL to open.
    Login {
        /// google, twitch or facebook.
        provider: Provider,
    },
    /// Finish the login with the URL the provider redirected to.
    Callback {
        /// Full redirect URL, `#fragment`, or bare fragment.
        url: String,
    },
    /// List logged-in accounts, newest first.
    Accounts,
    /// Print every account's SUI balance once.
    Balances,
    /// Print balances every few seconds until Ctrl+C.
    Watch,
    /// Fund an account from the network's faucet.
    Faucet(AccountArg),
    /// Create the account's reputation object.
    InitReputation(AccountArg),
    /// Request a loan.
    CreateLoan {
        /// Amount in SUI, e.g. 1.5.
        #[arg(value_parser = parse_sui_amount)]
        amount: u64,
        /// Interest in basis points.
        #[arg(long)]
        interest_bps: u64,
        /// Epoch by which the loan must be repaid.
        #[arg(long)]
        due_epoch: u64,
        #[command(flatten)]
        account: AccountArg,
    },
    /// Fund someone's loan request.
    BackLoan {
        loan_request_id: ObjectId,
        /// Amount in SUI.
        #[arg(value_parser = parse_sui_amount)]
        amount: u64,
        #[command(flatten)]
        account: AccountArg,
    },
    /// Repay a backed loan.
    Repay {
        loan_request_id: ObjectId,
        /// Repayment in SUI; defaults to principal plus interest.
        #[arg(value_parser = parse_sui_amount)]
        amount: Option<u64>,
        /// Reputation object to credit; looked up when omitted.
        #[arg(long)]
        reputation_id: Option<ObjectId>,
        #[command(flatten)]
        account: AccountArg,
    },
    /// Show a reputation score.
    Reputation {
        /// Address to look up; defaults to the selected account.
        #[arg(long)]
        address: Option<String>,
        #[command(flatten)]
        account: AccountArg,
    },
    /// Show a loan request.
    Loan { loan_request_id: ObjectId },
    /// Forget the pending login and every account.
    Clear,
}

/// Which account to act as.
#[derive(Args, Debug, Clone, Default)]
pub struct AccountArg {
    /// Address or list index; defaults to the newest account.
    #[arg(long, short = 'a')]
    pub account: Option<String>,
}

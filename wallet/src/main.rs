// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Microloan Wallet CLI
//!
//! Entry point for the `microloan-wallet` binary. Opens the data directory,
//! loads `wallet.json` and the session store, and runs one subcommand.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use microloan_protocol::config::{format_sui, BALANCE_REFRESH_INTERVAL, SUI_COIN_TYPE};
use microloan_protocol::ledger::{Ledger, SuiRpcClient};
use microloan_protocol::loan::Loan;
use microloan_protocol::service::MicroloanCall;
use microloan_protocol::types::SuiAddress;
use microloan_wallet::backend::BackendClient;
use microloan_wallet::balances::refresh_balances;
use microloan_wallet::config::{WalletConfig, CONFIG_FILE_NAME};
use microloan_wallet::faucet::FaucetClient;
use microloan_wallet::identity::IdentityManager;
use microloan_wallet::session::{Account, SessionStore};
use microloan_wallet::signer::{submit, TxStatus};
use microloan_wallet::zk_services::ZkServices;
use microloan_wallet::{logging, WalletError};

use cli::{AccountArg, Commands, WalletCli};

const SESSION_DIR_NAME: &str = "session";

/// Everything a subcommand may need, opened once.
struct Wallet {
    config_path: PathBuf,
    config: WalletConfig,
    store: SessionStore,
    ledger: Arc<dyn Ledger>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = WalletCli::parse();
    logging::init_logging(
        "microloan_wallet=info,microloan_protocol=warn",
        cli.log_format,
    );

    let wallet = Wallet::open(&cli)?;
    match cli.command {
        Commands::Config => wallet.show_config(),
        Commands::Login { provider } => {
            let url = wallet.identity()?.start_login(provider).await?;
            println!("Open this URL to log in with {provider}:\n\n{url}\n");
            println!("Then run `microloan-wallet callback '<redirect URL>'`.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Callback { url } => match wallet.identity()?.complete_login(&url).await? {
            Some(account) => {
                println!("Logged in as {} ({})", account.address, account.provider);
                wallet.print_balances().await?;
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("No login in progress.");
                Ok(ExitCode::SUCCESS)
            }
        },
        Commands::Accounts => wallet.list_accounts(),
        Commands::Balances => {
            wallet.print_balances().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch => wallet.watch().await,
        Commands::Faucet(account) => wallet.faucet(&account).await,
        Commands::InitReputation(account) => {
            wallet
                .transact(&account, MicroloanCall::InitReputation)
                .await
        }
        Commands::CreateLoan {
            amount,
            interest_bps,
            due_epoch,
            account,
        } => {
            let call = MicroloanCall::CreateLoan {
                amount,
                interest_bps,
                due_epoch,
            };
            wallet.transact(&account, call).await
        }
        Commands::BackLoan {
            loan_request_id,
            amount,
            account,
        } => {
            let call = MicroloanCall::BackLoan {
                loan_request_id,
                amount,
            };
            wallet.transact(&account, call).await
        }
        Commands::Repay {
            loan_request_id,
            amount,
            reputation_id,
            account,
        } => {
            let reputation_id = match reputation_id {
                Some(id) => id,
                None => {
                    let acct = wallet.select_account(&account)?;
                    wallet.backend()?.reputation(&acct.address).await?.reputation_id
                }
            };
            let repayment_amount = match amount {
                Some(amount) => amount,
                None => {
                    let fields = wallet.backend()?.loan(loan_request_id).await?;
                    let due = Loan::from_fields(loan_request_id, &fields)?.amount_due();
                    println!("Repaying {} SUI", format_sui(u128::from(due)));
                    due
                }
            };
            let call = MicroloanCall::Repay {
                loan_request_id,
                repayment_amount,
                reputation_id,
            };
            wallet.transact(&account, call).await
        }
        Commands::Reputation { address, account } => {
            let address = match address {
                Some(address) => address,
                None => wallet.select_account(&account)?.address,
            };
            let reputation = wallet.backend()?.reputation(&address).await?;
            println!("Reputation {}", reputation.reputation_id);
            println!("  score: {}", reputation.score);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Loan { loan_request_id } => {
            let fields = wallet.backend()?.loan(loan_request_id).await?;
            match Loan::from_fields(loan_request_id, &fields) {
                Ok(loan) => print_loan(&loan),
                Err(e) => {
                    tracing::warn!(error = %e, "unexpected loan fields");
                    println!("{}", serde_json::to_string_pretty(&fields)?);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clear => {
            wallet.store.clear()?;
            println!("Session cleared.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_loan(loan: &Loan) {
    let party = |who: Option<SuiAddress>| who.map_or_else(|| "-".to_string(), |a| a.to_string());
    println!("Loan request {}", loan.id);
    println!("  amount:     {} SUI", format_sui(u128::from(loan.amount)));
    println!("  interest:   {} bps", loan.interest_bps);
    println!("  amount due: {} SUI", format_sui(u128::from(loan.amount_due())));
    println!("  due epoch:  {}", loan.due_epoch);
    println!("  backed:     {}", loan.backed);
    println!("  requester:  {}", party(loan.requester));
    println!("  backer:     {}", party(loan.backer));
}

impl Wallet {
    fn open(cli: &WalletCli) -> Result<Self> {
        std::fs::create_dir_all(&cli.data_dir).with_context(|| {
            format!("failed to create data directory {}", cli.data_dir.display())
        })?;

        let config_path = cli.data_dir.join(CONFIG_FILE_NAME);
        let mut config = WalletConfig::load(&config_path)?;
        if let Some(network) = cli.network {
            config.network = network;
        }
        if let Some(rpc_url) = &cli.rpc_url {
            config.rpc_url = Some(rpc_url.clone());
        }
        if let Some(backend_url) = &cli.backend_url {
            config.backend_url = backend_url.clone();
        }

        let session_path = cli.data_dir.join(SESSION_DIR_NAME);
        let store = SessionStore::open(&session_path).with_context(|| {
            format!("failed to open session store at {}", session_path.display())
        })?;

        let ledger = SuiRpcClient::new(config.fullnode_url())
            .context("failed to create fullnode client")?;
        tracing::debug!(network = %config.network, rpc_url = %ledger.url(), "wallet opened");

        Ok(Self {
            config_path,
            config,
            store,
            ledger: Arc::new(ledger),
        })
    }

    fn identity(&self) -> Result<IdentityManager> {
        let zk = ZkServices::new(&self.config.salt_service_url, &self.config.prover_url)?;
        Ok(IdentityManager::new(
            Arc::clone(&self.ledger),
            self.store.clone(),
            self.config.clone(),
            zk,
        ))
    }

    fn backend(&self) -> Result<BackendClient> {
        Ok(BackendClient::new(&self.config.backend_url)?)
    }

    /// Picks an account by address or list index, or the newest one.
    fn select_account(&self, arg: &AccountArg) -> Result<Account> {
        let accounts = self.store.accounts()?;
        let found = match arg.account.as_deref() {
            None => accounts.into_iter().next(),
            Some(key) => match key.parse::<usize>() {
                Ok(index) => accounts.into_iter().nth(index),
                Err(_) => accounts.into_iter().find(|a| a.address == key),
            },
        };
        found.ok_or_else(|| {
            let key = arg.account.clone().unwrap_or_else(|| "(none logged in)".into());
            WalletError::UnknownAccount(key).into()
        })
    }

    /// Build on the server, sign locally, execute, then refresh balances.
    async fn transact(&self, arg: &AccountArg, call: MicroloanCall) -> Result<ExitCode> {
        let account = self.select_account(arg)?;
        tracing::info!(function = call.function(), address = %account.address, "sending transaction");

        let status = match self.backend()?.build(&account.address, &call).await {
            Ok(tx_bytes) => submit(self.ledger.as_ref(), &tx_bytes, &account).await,
            Err(e) => TxStatus::Failed {
                message: e.to_string(),
            },
        };
        println!("{status}");
        self.print_balances().await?;

        Ok(if status.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    /// Requests faucet gas for an account, then refreshes balances.
    async fn faucet(&self, arg: &AccountArg) -> Result<ExitCode> {
        let account = self.select_account(arg)?;
        let recipient: SuiAddress = account
            .address
            .parse()
            .with_context(|| format!("stored address {} is invalid", account.address))?;
        let faucet = FaucetClient::new(self.config.faucet_url()?)?;

        let coins = faucet.request_gas(recipient).await?;
        for coin in &coins {
            println!(
                "Received {} SUI in {} (tx {})",
                format_sui(u128::from(coin.amount)),
                coin.id,
                coin.transfer_tx_digest
            );
        }
        self.print_balances().await?;
        Ok(ExitCode::SUCCESS)
    }

    fn show_config(&self) -> Result<ExitCode> {
        if !self.config_path.exists() {
            WalletConfig::default().save(&self.config_path)?;
            println!("Wrote default settings to {}", self.config_path.display());
        }
        println!("{}", serde_json::to_string_pretty(&self.config)?);
        Ok(ExitCode::SUCCESS)
    }

    fn list_accounts(&self) -> Result<ExitCode> {
        let accounts = self.store.accounts()?;
        if accounts.is_empty() {
            println!("No accounts. Run `microloan-wallet login <provider>`.");
        }
        for (index, account) in accounts.iter().enumerate() {
            println!("[{index}] {} {}", account.provider, account.address);
            println!("    user id:   {}", account.sub);
            println!("    max epoch: {}", account.max_epoch);
            println!("    since:     {}", account.logged_in_at.to_rfc3339());
        }
        if let Some(setup) = self.store.setup()? {
            println!(
                "Login with {} pending since {}",
                setup.provider,
                setup.started_at.to_rfc3339()
            );
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn print_balances(&self) -> Result<()> {
        let accounts = self.store.accounts()?;
        let balances = refresh_balances(self.ledger.as_ref(), &accounts, SUI_COIN_TYPE).await;
        for account in &accounts {
            match balances.get(&account.address) {
                Some(mist) => println!("{}  {} SUI", account.address, format_sui(*mist)),
                None => println!("{}  (unavailable)", account.address),
            }
        }
        Ok(())
    }

    async fn watch(&self) -> Result<ExitCode> {
        let mut interval = tokio::time::interval(BALANCE_REFRESH_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    println!("-- {}", chrono::Utc::now().format("%H:%M:%S"));
                    self.print_balances().await?;
                }
                res = signal::ctrl_c() => {
                    res.context("failed to listen for Ctrl+C")?;
                    return Ok(ExitCode::SUCCESS);
                }
            }
        }
    }
}


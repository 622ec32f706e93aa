//! etherkeep CLI
//!
//! Terminal front end for the wallet library: account management and the
//! transfer flow. This is the only place where errors turn into a process
//! exit and where prompts touch a real terminal.

use clap::{Parser, Subcommand};
use etherkeep::asset::Asset;
use etherkeep::fee::FeeQuote;
use etherkeep::node::HttpNodeClient;
use etherkeep::oracle::CoinbaseOracle;
use etherkeep::transfer::{Confirmer, SecretSource};
use etherkeep::wallet::Keypair;
use etherkeep::{
    account::AccountStore, vault, Chain, Error, NetworkProfile, Result, TransferOrchestrator,
    TransferOutcome, TransferRequest,
};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "etherkeep")]
#[command(about = "Local Ethereum wallet: encrypted key custody and ETH/ERC-20 transfers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Target network
    #[arg(short, long, global = true, default_value = "sepolia")]
    network: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage encrypted accounts
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Transfer ether or the configured token, amount given in USD
    Transfer {
        /// Asset to transfer (ether, or the token symbol e.g. usdt)
        #[arg(short, long)]
        asset: String,

        /// Account holding the sender key
        #[arg(long)]
        account: String,

        /// Receiver address
        #[arg(long)]
        to: String,

        /// Amount in USD
        #[arg(long)]
        amount: String,
    },

    /// Show the active configuration
    Config,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Generate a new key and store it encrypted
    Create { name: String },

    /// Import an existing private key (prompted, not passed as an argument)
    Import { name: String },

    /// Show the public address of an account
    Address { name: String },

    /// Print the decrypted private key (hex)
    ExportKey { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let chain: Chain = cli.network.parse()?;
    let profile = NetworkProfile::for_chain(chain);

    match cli.command {
        Commands::Account { command } => run_account(command, &profile),
        Commands::Transfer {
            asset,
            account,
            to,
            amount,
        } => run_transfer(profile, asset, account, to, amount).await,
        Commands::Config => {
            let rendered = serde_json::to_string_pretty(&profile)
                .map_err(|e| Error::Config(format!("failed to render configuration: {e}")))?;
            println!("{rendered}");
            Ok(())
        }
    }
}

fn run_account(command: AccountCommands, profile: &NetworkProfile) -> Result<()> {
    let store = AccountStore::new(profile.account_dir.clone());
    let secrets = TerminalSecrets;

    match command {
        AccountCommands::Create { name } => {
            AccountStore::validate_name(&name)?;
            if store.exists(&name)? {
                println!("Account '{name}' already exists and will be overwritten.");
            }
            let keypair = Keypair::random();
            let passphrase = secrets.provide("Enter a password to encrypt the private key: ")?;
            let sealed = vault::seal(&keypair.to_raw_bytes(), &passphrase)?;
            store.save(&name, &sealed)?;
            println!("Public Address: {}", keypair.address());
            println!("Account '{name}' saved under {}", store.root().display());
        }
        AccountCommands::Import { name } => {
            AccountStore::validate_name(&name)?;
            let key_hex = secrets.provide("Enter private key (hex): ")?;
            let keypair = Keypair::from_hex(key_hex.expose_secret())?;
            let passphrase = secrets.provide("Enter a password to encrypt the private key: ")?;
            let sealed = vault::seal(&keypair.to_raw_bytes(), &passphrase)?;
            store.save(&name, &sealed)?;
            println!("Public Address: {}", keypair.address());
            println!("Account '{name}' saved under {}", store.root().display());
        }
        AccountCommands::Address { name } => {
            let keypair = unlock(&store, &secrets, &name)?;
            println!("Public Address: {}", keypair.address());
        }
        AccountCommands::ExportKey { name } => {
            let keypair = unlock(&store, &secrets, &name)?;
            println!("Private Key: {}", *keypair.to_hex());
        }
    }
    Ok(())
}

fn unlock(store: &AccountStore, secrets: &dyn SecretSource, name: &str) -> Result<Keypair> {
    let vault_bytes = store.load(name)?;
    let passphrase = secrets.provide("Enter password: ")?;
    let raw_key = vault::open(&vault_bytes, &passphrase)?;
    Keypair::from_raw_bytes(&raw_key)
}

async fn run_transfer(
    profile: NetworkProfile,
    asset: String,
    account: String,
    to: String,
    amount: String,
) -> Result<()> {
    let asset = match asset.to_lowercase().as_str() {
        "ether" | "eth" => Asset::Ether,
        symbol if symbol == profile.token.symbol.to_lowercase() => Asset::Erc20 {
            contract: profile.token.contract,
            decimals: profile.token.decimals,
            symbol: profile.token.symbol.clone(),
        },
        other => {
            return Err(Error::InvalidInput(format!(
                "unknown asset {other:?} (expected 'ether' or '{}')",
                profile.token.symbol.to_lowercase()
            )))
        }
    };

    let node = HttpNodeClient::new(&profile.rpc_url)?;
    let orchestrator = TransferOrchestrator::new(
        profile,
        Arc::new(node),
        Arc::new(CoinbaseOracle::new()),
        Arc::new(TerminalSecrets),
        Arc::new(TerminalConfirmer),
    );

    let request = TransferRequest {
        account,
        asset,
        receiver: to,
        amount: amount.parse()?,
    };

    match orchestrator.execute(&request).await? {
        TransferOutcome::Submitted {
            tx_hash,
            explorer_url,
        } => {
            println!("Transaction sent: {tx_hash}");
            println!("Check the transaction at: {explorer_url}");
        }
        TransferOutcome::Cancelled => {
            println!("Transaction cancelled.");
        }
    }
    Ok(())
}

/// Passphrase prompt against the real terminal (input hidden).
struct TerminalSecrets;

impl SecretSource for TerminalSecrets {
    fn provide(&self, prompt: &str) -> Result<SecretString> {
        let secret = rpassword::prompt_password(prompt)
            .map_err(|e| Error::InvalidInput(format!("failed to read input: {e}")))?;
        Ok(SecretString::from(secret))
    }
}

/// Interactive yes/no fee confirmation.
struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, quote: &FeeQuote) -> Result<bool> {
        println!("Suggested Gas Price: {} Gwei", format_gwei(quote.suggested_gas_price));
        println!("Increased Gas Price: {} Gwei", format_gwei(quote.gas_price));
        println!("Transaction Fee: ${}", quote.fee_fiat);
        print!("Are you okay with this increased gas price and transaction fee? (yes/no): ");
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("yes"))
    }
}

/// Render a wei-per-gas price in gwei without going through floats.
fn format_gwei(wei: u128) -> String {
    const GWEI: u128 = 1_000_000_000;
    let frac = wei % GWEI;
    if frac == 0 {
        format!("{}", wei / GWEI)
    } else {
        let s = format!("{}.{:09}", wei / GWEI, frac);
        s.trim_end_matches('0').to_string()
    }
}

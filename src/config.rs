//! Wallet configuration
//!
//! Everything deployment-specific (RPC endpoint, explorer, token contract,
//! gas inflation factor) lives in a [`NetworkProfile`] handed to the
//! orchestrator at construction. Presets exist for mainnet and the Sepolia
//! test network; env vars override the RPC endpoint.

use crate::fee::DEFAULT_GAS_PRICE_FACTOR;
use alloy::primitives::{address, Address, B256};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable names
mod env_vars {
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";
    pub const ACCOUNT_DIR: &str = "ETHERKEEP_ACCOUNT_DIR";
}

/// Supported deployment targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Mainnet,
    Sepolia,
}

impl Chain {
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Sepolia => 11_155_111,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chain::Mainnet => "mainnet",
            Chain::Sepolia => "sepolia",
        }
    }
}

impl std::str::FromStr for Chain {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Chain::Mainnet),
            "sepolia" => Ok(Chain::Sepolia),
            other => Err(crate::Error::Config(format!("unknown network: {other}"))),
        }
    }
}

/// ERC-20 token the wallet knows how to transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub contract: Address,
    pub decimals: u8,
    pub symbol: String,
}

/// Per-deployment configuration injected into the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub chain: Chain,
    pub rpc_url: String,
    /// Block explorer base, e.g. `https://etherscan.io`.
    pub explorer_url: String,
    pub token: TokenConfig,
    /// Multiplier applied to the network-suggested gas price.
    pub gas_price_factor: u32,
    /// Directory holding the account vault files.
    pub account_dir: PathBuf,
}

impl NetworkProfile {
    pub fn mainnet() -> Self {
        Self {
            chain: Chain::Mainnet,
            rpc_url: rpc_override(env_vars::ETH_RPC_URL, "https://cloudflare-eth.com"),
            explorer_url: "https://etherscan.io".to_string(),
            token: TokenConfig {
                contract: address!("dac17f958d2ee523a2206206994597c13d831ec7"),
                decimals: 6,
                symbol: "USDT".to_string(),
            },
            gas_price_factor: DEFAULT_GAS_PRICE_FACTOR,
            account_dir: account_dir(),
        }
    }

    pub fn sepolia() -> Self {
        Self {
            chain: Chain::Sepolia,
            rpc_url: rpc_override(env_vars::SEPOLIA_RPC_URL, "https://rpc.sepolia.org"),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            token: TokenConfig {
                contract: address!("e3d2b274ec5a0f4e9fa12911f76ba052fafea6ae"),
                decimals: 6,
                symbol: "USDT".to_string(),
            },
            gas_price_factor: DEFAULT_GAS_PRICE_FACTOR,
            account_dir: account_dir(),
        }
    }

    pub fn for_chain(chain: Chain) -> Self {
        match chain {
            Chain::Mainnet => Self::mainnet(),
            Chain::Sepolia => Self::sepolia(),
        }
    }

    /// Fiat pair the price oracle is asked for.
    pub fn price_pair(&self) -> &'static str {
        "ETH-USD"
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, hash: B256) -> String {
        format!("{}/tx/{hash}", self.explorer_url)
    }
}

fn rpc_override(var: &str, fallback: &str) -> String {
    match std::env::var(var) {
        Ok(url) if !url.is_empty() => {
            tracing::debug!(var = %var, "Using RPC URL from environment");
            url
        }
        _ => fallback.to_string(),
    }
}

fn account_dir() -> PathBuf {
    std::env::var(env_vars::ACCOUNT_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("accounts"))
}

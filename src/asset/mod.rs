//! Transferable assets
//!
//! One capability, two implementations: native ether and an ERC-20 token.
//! Both consume the same [`TransferIntent`] and produce an unsigned legacy
//! transaction; they differ in unit conversion and payload shape. Adding a
//! further asset kind means adding a variant here; the orchestrator never
//! branches on the asset.

use crate::fiat::Fiat;
use crate::node::{ContractCall, NodeClient};
use crate::{Error, Result};
use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::str::FromStr;

/// Gas limit for a plain ether transfer; fixed by the protocol.
pub const ETHER_TRANSFER_GAS: u64 = 21_000;

sol! {
    /// Minimal ERC-20 surface used by the transfer flow.
    interface IERC20 {
        function transfer(address to, uint256 value) external returns (bool);
    }
}

/// What the user asked for, with the network parameters already resolved.
///
/// The receiver stays as entered: it is validated here, before any
/// transaction object exists, so a malformed address never reaches the node.
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub sender: Address,
    pub receiver: String,
    /// Fiat amount to transfer; must be positive.
    pub amount: Fiat,
    /// Fiat price of one native coin; must be positive.
    pub price_per_coin: Fiat,
    pub nonce: u64,
    /// Gas price in wei per gas, already inflated.
    pub gas_price: u128,
}

/// An asset the wallet can transfer.
#[derive(Debug, Clone)]
pub enum Asset {
    /// The chain's native coin.
    Ether,
    /// A fungible token exposing `transfer(address,uint256)`.
    Erc20 {
        contract: Address,
        decimals: u8,
        symbol: String,
    },
}

impl Asset {
    pub fn name(&self) -> &str {
        match self {
            Asset::Ether => "Ether",
            Asset::Erc20 { symbol, .. } => symbol,
        }
    }

    fn validate(intent: &TransferIntent) -> Result<Address> {
        if intent.amount.is_zero() {
            return Err(Error::InvalidInput(
                "transfer amount must be greater than zero".into(),
            ));
        }
        if intent.price_per_coin.is_zero() {
            return Err(Error::InvalidInput("spot price must be positive".into()));
        }
        if intent.receiver.trim().is_empty() {
            return Err(Error::InvalidInput("receiver address is required".into()));
        }
        Address::from_str(intent.receiver.trim())
            .map_err(|e| Error::InvalidInput(format!("invalid receiver address: {e}")))
    }

    /// ABI-encoded `transfer(to, value)` calldata for the token variant.
    fn transfer_calldata(to: Address, value: U256) -> Bytes {
        IERC20::transferCall { to, value }.abi_encode().into()
    }

    /// Build the unsigned transaction for this transfer.
    ///
    /// Input validation happens before anything touches the node. For the
    /// token variant the gas limit comes from the node's estimate of the
    /// exact call, since contract execution cost depends on the calldata.
    pub async fn build_transaction(
        &self,
        node: &dyn NodeClient,
        intent: &TransferIntent,
        chain_id: u64,
    ) -> Result<TxLegacy> {
        let receiver = Self::validate(intent)?;

        match self {
            Asset::Ether => {
                let value = intent.amount.to_wei(intent.price_per_coin)?;
                Ok(TxLegacy {
                    chain_id: Some(chain_id),
                    nonce: intent.nonce,
                    gas_price: intent.gas_price,
                    gas_limit: ETHER_TRANSFER_GAS,
                    to: TxKind::Call(receiver),
                    value,
                    input: Bytes::new(),
                })
            }
            Asset::Erc20 {
                contract, decimals, ..
            } => {
                let token_units = intent.amount.to_token_units(*decimals);
                let data = Self::transfer_calldata(receiver, token_units);

                let gas_limit = node
                    .estimate_gas(&ContractCall {
                        from: intent.sender,
                        to: *contract,
                        data: data.clone(),
                    })
                    .await?;

                Ok(TxLegacy {
                    chain_id: Some(chain_id),
                    nonce: intent.nonce,
                    gas_price: intent.gas_price,
                    gas_limit,
                    to: TxKind::Call(*contract),
                    // the token moves inside the contract, no ether attached
                    value: U256::ZERO,
                    input: data,
                })
            }
        }
    }
}

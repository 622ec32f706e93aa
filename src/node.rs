//! Ethereum node collaborator
//!
//! The orchestrator talks to the chain exclusively through [`NodeClient`], so
//! tests can substitute a scripted double and the wire transport stays in one
//! place. [`HttpNodeClient`] is the production implementation over JSON-RPC.

use crate::error::BroadcastFailure;
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use url::Url;

/// A read-only contract call used for gas estimation.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// Chain RPCs the transfer pipeline depends on. All calls are synchronous
/// from the pipeline's point of view: one request, one fallible answer.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Next usable nonce for the sender, including pending transactions.
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    /// Network-suggested gas price in wei per gas.
    async fn suggest_gas_price(&self) -> Result<u128>;

    /// Native-coin balance of the address in wei.
    async fn balance_of(&self, address: Address) -> Result<U256>;

    /// Gas-limit estimate for the exact call. Fails when the call would
    /// revert.
    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64>;

    /// Submit a signed, RLP-encoded transaction. Returns its hash.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<B256>;

    /// Chain id the node is serving.
    async fn chain_id(&self) -> Result<u64>;
}

/// JSON-RPC node client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    rpc_url: Url,
}

impl HttpNodeClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("invalid RPC URL {rpc_url:?}: {e}")))?;
        Ok(Self { rpc_url })
    }

    fn provider(&self) -> impl Provider {
        ProviderBuilder::new().connect_http(self.rpc_url.clone())
    }
}

fn rpc_error(err: RpcError<TransportErrorKind>) -> Error {
    Error::Network(err.to_string())
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        self.provider()
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(rpc_error)
    }

    async fn suggest_gas_price(&self) -> Result<u128> {
        self.provider().get_gas_price().await.map_err(rpc_error)
    }

    async fn balance_of(&self, address: Address) -> Result<U256> {
        self.provider().get_balance(address).await.map_err(rpc_error)
    }

    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64> {
        let tx = TransactionRequest::default()
            .from(call.from)
            .to(call.to)
            .input(call.data.clone().into());
        self.provider()
            .estimate_gas(tx)
            .await
            .map_err(|e| Error::GasEstimation(e.to_string()))
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<B256> {
        match self.provider().send_raw_transaction(raw_tx).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            // The node answered with an error: it saw the transaction and
            // rejected it, so nothing was submitted.
            Err(RpcError::ErrorResp(payload)) => Err(Error::Broadcast {
                outcome: BroadcastFailure::NotSent,
                reason: payload.to_string(),
            }),
            // Transport-level failure: the request may have reached the node
            // before the connection died, so the outcome is unknown.
            Err(e) => Err(Error::Broadcast {
                outcome: BroadcastFailure::UnknownOutcome,
                reason: e.to_string(),
            }),
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider().get_chain_id().await.map_err(rpc_error)
    }
}

//! Transfer orchestration
//!
//! Drives one transfer attempt end to end: resolve the signing key, fetch the
//! spot price and network parameters, gate on balance and user confirmation,
//! then build, sign, and broadcast. The stages run strictly in order; the
//! first failure aborts the attempt with a typed error and nothing is
//! retried. A declined confirmation is a normal outcome, not an error.
//!
//! Broadcasting is the only irreversible step, so every check happens before
//! it.

use crate::account::AccountStore;
use crate::asset::{Asset, TransferIntent, ETHER_TRANSFER_GAS};
use crate::config::NetworkProfile;
use crate::fee::{self, FeeQuote};
use crate::fiat::Fiat;
use crate::node::NodeClient;
use crate::oracle::PriceOracle;
use crate::wallet::Keypair;
use crate::{vault, Error, Result};
use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{B256, U256};
use secrecy::SecretString;
use std::sync::Arc;

/// Supplies the vault passphrase. The production implementation prompts the
/// terminal; tests supply a fixed secret.
pub trait SecretSource: Send + Sync {
    fn provide(&self, prompt: &str) -> Result<SecretString>;
}

/// Asks for explicit approval of the quoted fee before anything is signed.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, quote: &FeeQuote) -> Result<bool>;
}

/// Pipeline stage, for tracing and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    ResolvingKey,
    FetchingPrice,
    FetchingNetworkParams,
    CheckingBalance,
    AwaitingConfirmation,
    BuildingTransaction,
    Signing,
    Broadcasting,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransferStage::ResolvingKey => "resolving key",
            TransferStage::FetchingPrice => "fetching price",
            TransferStage::FetchingNetworkParams => "fetching network params",
            TransferStage::CheckingBalance => "checking balance",
            TransferStage::AwaitingConfirmation => "awaiting confirmation",
            TransferStage::BuildingTransaction => "building transaction",
            TransferStage::Signing => "signing",
            TransferStage::Broadcasting => "broadcasting",
        };
        f.write_str(s)
    }
}

/// One transfer as requested by the user.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub account: String,
    pub asset: Asset,
    pub receiver: String,
    pub amount: Fiat,
}

/// Terminal result of a transfer attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The transaction was accepted by the node.
    Submitted { tx_hash: B256, explorer_url: String },
    /// The user declined the quoted fee; nothing was signed or sent.
    Cancelled,
}

/// Sequences a single transfer attempt against the injected collaborators.
pub struct TransferOrchestrator {
    profile: NetworkProfile,
    store: AccountStore,
    node: Arc<dyn NodeClient>,
    oracle: Arc<dyn PriceOracle>,
    secrets: Arc<dyn SecretSource>,
    confirmer: Arc<dyn Confirmer>,
}

impl TransferOrchestrator {
    pub fn new(
        profile: NetworkProfile,
        node: Arc<dyn NodeClient>,
        oracle: Arc<dyn PriceOracle>,
        secrets: Arc<dyn SecretSource>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let store = AccountStore::new(profile.account_dir.clone());
        Self {
            profile,
            store,
            node,
            oracle,
            secrets,
            confirmer,
        }
    }

    /// Run the pipeline for one request.
    ///
    /// Not re-entrant for the same account: concurrent attempts would race on
    /// the sender nonce, which the node assigns per address.
    pub async fn execute(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        if request.amount.is_zero() {
            return Err(Error::InvalidInput(
                "transfer amount must be greater than zero".into(),
            ));
        }

        tracing::info!(stage = %TransferStage::ResolvingKey, account = %request.account, "Starting transfer");
        let vault_bytes = self.store.load(&request.account)?;
        let passphrase = self.secrets.provide("Enter password: ")?;
        let raw_key = vault::open(&vault_bytes, &passphrase)?;
        let keypair = Keypair::from_raw_bytes(&raw_key)?;
        drop(raw_key);
        let sender = keypair.address();

        tracing::info!(stage = %TransferStage::FetchingPrice, pair = %self.profile.price_pair(), "Fetching spot price");
        let price = self.oracle.spot_price(self.profile.price_pair()).await?;
        tracing::info!(price = %price, "Current spot price");

        tracing::info!(stage = %TransferStage::FetchingNetworkParams, sender = %sender, "Fetching network params");
        let chain_id = self.node.chain_id().await?;
        let nonce = self.node.pending_nonce(sender).await?;
        let suggested_gas_price = self.node.suggest_gas_price().await?;
        let gas_price = fee::inflate(suggested_gas_price, self.profile.gas_price_factor);

        // The quote uses the flat ether gas limit even for token transfers;
        // the token build below replaces it with the node's estimate for the
        // exact call.
        let quote = FeeQuote {
            suggested_gas_price,
            gas_price,
            gas_limit: ETHER_TRANSFER_GAS,
            fee_fiat: fee::fee_in_fiat(gas_price, ETHER_TRANSFER_GAS, price),
        };
        tracing::info!(
            nonce,
            suggested_gas_price,
            gas_price,
            fee_fiat = %quote.fee_fiat,
            "Priced transfer"
        );

        tracing::info!(stage = %TransferStage::CheckingBalance, "Checking sender balance");
        let balance = self.node.balance_of(sender).await?;
        self.check_balance(request, balance, gas_price, price)?;

        tracing::info!(stage = %TransferStage::AwaitingConfirmation, "Awaiting fee confirmation");
        if !self.confirmer.confirm(&quote)? {
            tracing::info!("Transfer cancelled by user");
            return Ok(TransferOutcome::Cancelled);
        }

        tracing::info!(stage = %TransferStage::BuildingTransaction, asset = %request.asset.name(), "Building transaction");
        let intent = TransferIntent {
            sender,
            receiver: request.receiver.clone(),
            amount: request.amount,
            price_per_coin: price,
            nonce,
            gas_price,
        };
        let mut tx = request
            .asset
            .build_transaction(self.node.as_ref(), &intent, chain_id)
            .await?;

        tracing::info!(stage = %TransferStage::Signing, "Signing transaction");
        let signature = keypair.sign_transaction(&mut tx)?;
        // key material is done with; drop it before the network call
        drop(keypair);
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        let raw = envelope.encoded_2718();

        tracing::info!(stage = %TransferStage::Broadcasting, "Broadcasting transaction");
        let tx_hash = self.node.broadcast(&raw).await?;
        let explorer_url = self.profile.explorer_tx_url(tx_hash);
        tracing::info!(tx_hash = %tx_hash, explorer_url = %explorer_url, "Transaction sent");

        Ok(TransferOutcome::Submitted {
            tx_hash,
            explorer_url,
        })
    }

    /// Balance gate, before anything is signed.
    ///
    /// The fee must always be affordable. For native transfers the check is
    /// extended to fee + transferred value, since both come out of the same
    /// balance; token transfers only spend gas from it.
    fn check_balance(
        &self,
        request: &TransferRequest,
        balance: U256,
        gas_price: u128,
        price: Fiat,
    ) -> Result<()> {
        if !fee::sufficient_balance(balance, gas_price, ETHER_TRANSFER_GAS) {
            return Err(Error::InsufficientBalance {
                required: fee::fee_wei(gas_price, ETHER_TRANSFER_GAS).to_string(),
                available: balance.to_string(),
            });
        }
        if let Asset::Ether = request.asset {
            let required =
                fee::fee_wei(gas_price, ETHER_TRANSFER_GAS) + request.amount.to_wei(price)?;
            if balance < required {
                return Err(Error::InsufficientBalance {
                    required: required.to_string(),
                    available: balance.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContractCall;
    use alloy::primitives::Address;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const TX_HASH: B256 = B256::repeat_byte(0xab);

    struct MockNode {
        balance: U256,
        broadcasts: AtomicUsize,
        last_raw: Mutex<Vec<u8>>,
    }

    impl MockNode {
        fn with_balance(balance: U256) -> Self {
            Self {
                balance,
                broadcasts: AtomicUsize::new(0),
                last_raw: Mutex::new(Vec::new()),
            }
        }

        fn rich() -> Self {
            Self::with_balance(U256::from(10).pow(U256::from(20))) // 100 ETH
        }

        fn broadcast_count(&self) -> usize {
            self.broadcasts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NodeClient for MockNode {
        async fn pending_nonce(&self, _: Address) -> Result<u64> {
            Ok(5)
        }
        async fn suggest_gas_price(&self) -> Result<u128> {
            Ok(10_000_000_000) // 10 gwei
        }
        async fn balance_of(&self, _: Address) -> Result<U256> {
            Ok(self.balance)
        }
        async fn estimate_gas(&self, _: &ContractCall) -> Result<u64> {
            Ok(60_000)
        }
        async fn broadcast(&self, raw_tx: &[u8]) -> Result<B256> {
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
            *self.last_raw.lock().unwrap() = raw_tx.to_vec();
            Ok(TX_HASH)
        }
        async fn chain_id(&self) -> Result<u64> {
            Ok(11_155_111)
        }
    }

    struct FixedPrice(&'static str);

    #[async_trait]
    impl PriceOracle for FixedPrice {
        async fn spot_price(&self, _: &str) -> Result<Fiat> {
            Ok(self.0.parse().unwrap())
        }
    }

    struct FixedSecret(&'static str);

    impl SecretSource for FixedSecret {
        fn provide(&self, _: &str) -> Result<SecretString> {
            Ok(SecretString::from(self.0.to_string()))
        }
    }

    struct Decision(bool);

    impl Confirmer for Decision {
        fn confirm(&self, _: &FeeQuote) -> Result<bool> {
            Ok(self.0)
        }
    }

    const RECEIVER: &str = "0x1111111111111111111111111111111111111111";
    const PASSPHRASE: &str = "correct horse battery staple";

    /// Seal a fresh key into the store and return an orchestrator wired to
    /// the given doubles.
    fn orchestrator(
        dir: &TempDir,
        node: Arc<MockNode>,
        confirm: bool,
    ) -> TransferOrchestrator {
        let mut profile = NetworkProfile::sepolia();
        profile.account_dir = dir.path().to_path_buf();

        let store = AccountStore::new(dir.path());
        let keypair = Keypair::random();
        let passphrase = SecretString::from(PASSPHRASE.to_string());
        let sealed = vault::seal(&keypair.to_raw_bytes(), &passphrase).unwrap();
        store.save("alice", &sealed).unwrap();

        TransferOrchestrator::new(
            profile,
            node,
            Arc::new(FixedPrice("2000")),
            Arc::new(FixedSecret(PASSPHRASE)),
            Arc::new(Decision(confirm)),
        )
    }

    fn ether_request() -> TransferRequest {
        TransferRequest {
            account: "alice".to_string(),
            asset: Asset::Ether,
            receiver: RECEIVER.to_string(),
            amount: "100".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_successful_ether_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let node = Arc::new(MockNode::rich());
        let orchestrator = orchestrator(&dir, node.clone(), true);

        let outcome = orchestrator.execute(&ether_request()).await.unwrap();

        match outcome {
            TransferOutcome::Submitted {
                tx_hash,
                explorer_url,
            } => {
                assert_eq!(tx_hash, TX_HASH);
                assert!(explorer_url.ends_with(&format!("/tx/{TX_HASH}")));
            }
            other => panic!("expected Submitted, got {other:?}"),
        }
        assert_eq!(node.broadcast_count(), 1);
        assert!(!node.last_raw.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_declined_confirmation_cancels_without_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let node = Arc::new(MockNode::rich());
        let orchestrator = orchestrator(&dir, node.clone(), false);

        let outcome = orchestrator.execute(&ether_request()).await.unwrap();

        assert_eq!(outcome, TransferOutcome::Cancelled);
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_token_transfer_uses_estimated_gas() {
        let dir = tempfile::tempdir().unwrap();
        let node = Arc::new(MockNode::rich());
        let orchestrator = orchestrator(&dir, node.clone(), true);

        let request = TransferRequest {
            asset: Asset::Erc20 {
                contract: "0xe3d2b274ec5a0f4e9fa12911f76ba052fafea6ae".parse().unwrap(),
                decimals: 6,
                symbol: "USDT".to_string(),
            },
            ..ether_request()
        };
        let outcome = orchestrator.execute(&request).await.unwrap();

        assert!(matches!(outcome, TransferOutcome::Submitted { .. }));
        assert_eq!(node.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_aborts_before_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        // covers neither gas nor value
        let node = Arc::new(MockNode::with_balance(U256::from(1000)));
        let orchestrator = orchestrator(&dir, node.clone(), true);

        let result = orchestrator.execute(&ether_request()).await;

        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_native_balance_gate_includes_value() {
        let dir = tempfile::tempdir().unwrap();
        // enough for gas (630k gwei) but nowhere near the 0.05 ETH value
        let node = Arc::new(MockNode::with_balance(U256::from(10).pow(U256::from(16))));
        let orchestrator = orchestrator(&dir, node.clone(), true);

        let result = orchestrator.execute(&ether_request()).await;

        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let dir = tempfile::tempdir().unwrap();
        let node = Arc::new(MockNode::rich());
        let orchestrator = orchestrator(&dir, node.clone(), true);

        let request = TransferRequest {
            account: "nobody".to_string(),
            ..ether_request()
        };
        let result = orchestrator.execute(&request).await;

        assert!(matches!(result, Err(Error::AccountNotFound(_))));
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let node = Arc::new(MockNode::rich());
        let mut orchestrator = orchestrator(&dir, node.clone(), true);
        orchestrator.secrets = Arc::new(FixedSecret("wrong"));

        let result = orchestrator.execute(&ether_request()).await;

        assert!(matches!(result, Err(Error::AuthenticationFailed)));
        assert_eq!(node.broadcast_count(), 0);
    }
}

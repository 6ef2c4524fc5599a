// src/blockchain/transactions.rs

use ethers_core::types::TransactionRequest;
use ethers_signers::{LocalWallet, Signer};
use tracing::{info, warn};

use crate::blockchain::{nonce_manager::NonceManager, rpc::RpcClient};
use crate::providers::ProviderError;

/// Fills in nonce, chain id, gas and gas price, signs locally and submits
/// the transaction. Returns the transaction hash.
pub async fn send_evm_transaction(
    rpc: &RpcClient,
    wallet: &LocalWallet,
    tx_request: TransactionRequest,
    nonce_manager: &NonceManager,
) -> Result<String, ProviderError> {
    let from = wallet.address();
    let chain_id = rpc.chain_id().await?;
    let nonce = nonce_manager.get_next_nonce(from, rpc).await?;

    let mut tx = tx_request.from(from).nonce(nonce).chain_id(chain_id);

    let submitted = async {
        if tx.gas.is_none() {
            tx.gas = Some(rpc.estimate_gas(&tx).await?);
        }
        if tx.gas_price.is_none() {
            tx.gas_price = Some(rpc.gas_price().await?);
        }

        let signature = wallet
            .sign_transaction(&tx.clone().into())
            .await
            .map_err(|e| ProviderError::Signing(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);
        rpc.send_raw_transaction(&raw).await
    }
    .await;

    match submitted {
        Ok(hash) => {
            info!(from = ?from, nonce = %nonce, tx_hash = %hash, "transaction submitted");
            Ok(hash)
        }
        Err(e) => {
            warn!(from = ?from, nonce = %nonce, error = %e, "transaction not submitted");
            nonce_manager.reset(from).await;
            Err(e)
        }
    }
}

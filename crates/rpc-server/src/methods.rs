//! RPC Methods - JSON-RPC method handlers
//!
//! Implements the Solana-compatible subset of RPC methods served by the
//! local cluster.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use intro_runtime::{BankError, LocalBank};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::{
    account::Account,
    clock::Slot,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError, VersionedTransaction},
};
use std::{str::FromStr, sync::Arc};

/// Most signatures accepted by one getSignatureStatuses call
pub const MAX_SIGNATURE_STATUS_QUERY: usize = 256;

/// RPC context shared across handlers
pub struct RpcContext {
    pub bank: Arc<Mutex<LocalBank>>,
}

impl RpcContext {
    pub fn new(bank: Arc<Mutex<LocalBank>>) -> Self {
        Self { bank }
    }
}

// ============ Request/Response Types ============

#[derive(Debug, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub transaction: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetAccountInfoRequest {
    pub pubkey: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseContext {
    pub slot: Slot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountInfo {
    pub data: (String, String), // (data, encoding)
    pub executable: bool,
    pub lamports: u64,
    pub owner: String,
    #[serde(rename = "rentEpoch")]
    pub rent_epoch: u64,
    pub space: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetAccountInfoResponse {
    pub context: ResponseContext,
    pub value: Option<AccountInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockhashInfo {
    pub blockhash: String,
    #[serde(rename = "lastValidBlockHeight")]
    pub last_valid_block_height: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetLatestBlockhashResponse {
    pub context: ResponseContext,
    pub value: BlockhashInfo,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub slot: Slot,
    pub confirmations: Option<usize>,
    pub err: Option<TransactionError>,
    pub status: Result<(), TransactionError>,
    pub confirmation_status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetSignatureStatusesResponse {
    pub context: ResponseContext,
    pub value: Vec<Option<TransactionStatus>>,
}

// ============ RPC Handlers ============

/// Handle sendTransaction RPC method
///
/// The transaction executes before the call returns, so a returned signature
/// is already final.
pub fn handle_send_transaction(
    ctx: &RpcContext,
    params: SendTransactionRequest,
) -> Result<String, RpcError> {
    let encoding = params.encoding.as_deref().unwrap_or("base58");
    let tx_bytes = match encoding {
        "base58" => bs58::decode(&params.transaction)
            .into_vec()
            .map_err(|_| RpcError::InvalidParams("Invalid base58 encoding".to_string()))?,
        "base64" => BASE64
            .decode(&params.transaction)
            .map_err(|_| RpcError::InvalidParams("Invalid base64 encoding".to_string()))?,
        other => {
            return Err(RpcError::InvalidParams(format!(
                "Unsupported encoding: {}",
                other
            )))
        }
    };

    let tx: VersionedTransaction = bincode::deserialize(&tx_bytes)
        .map_err(|_| RpcError::InvalidParams("Invalid transaction format".to_string()))?;
    let tx: Transaction = tx.into_legacy_transaction().ok_or_else(|| {
        RpcError::InvalidParams("Only legacy transactions are supported".to_string())
    })?;

    let result = ctx.bank.lock().process_transaction(tx)?;
    Ok(result.signature.to_string())
}

/// Handle getAccountInfo RPC method
pub fn handle_get_account_info(
    ctx: &RpcContext,
    params: GetAccountInfoRequest,
) -> Result<GetAccountInfoResponse, RpcError> {
    let pubkey = Pubkey::from_str(&params.pubkey)
        .map_err(|_| RpcError::InvalidParams("Invalid pubkey".to_string()))?;

    let (slot, account) = {
        let bank = ctx.bank.lock();
        (bank.slot(), bank.get_account(&pubkey))
    };

    let encoding = params.encoding.as_deref().unwrap_or("base64");
    let value = match account {
        Some(account) => Some(encode_account(account, encoding)?),
        None => None,
    };

    Ok(GetAccountInfoResponse {
        context: ResponseContext { slot },
        value,
    })
}

fn encode_account(account: Account, encoding: &str) -> Result<AccountInfo, RpcError> {
    let data = match encoding {
        "base58" => (bs58::encode(&account.data).into_string(), "base58".to_string()),
        "base64" => (BASE64.encode(&account.data), "base64".to_string()),
        other => {
            return Err(RpcError::InvalidParams(format!(
                "Unsupported encoding: {}",
                other
            )))
        }
    };

    Ok(AccountInfo {
        data,
        executable: account.executable,
        lamports: account.lamports,
        owner: account.owner.to_string(),
        rent_epoch: account.rent_epoch,
        space: account.data.len() as u64,
    })
}

/// Handle getLatestBlockhash RPC method
pub fn handle_get_latest_blockhash(
    ctx: &RpcContext,
) -> Result<GetLatestBlockhashResponse, RpcError> {
    let bank = ctx.bank.lock();

    Ok(GetLatestBlockhashResponse {
        context: ResponseContext { slot: bank.slot() },
        value: BlockhashInfo {
            blockhash: bank.latest_blockhash().to_string(),
            last_valid_block_height: bank.last_valid_block_height(),
        },
    })
}

/// Handle getSignatureStatuses RPC method
pub fn handle_get_signature_statuses(
    ctx: &RpcContext,
    signatures: &[String],
) -> Result<GetSignatureStatusesResponse, RpcError> {
    if signatures.len() > MAX_SIGNATURE_STATUS_QUERY {
        return Err(RpcError::InvalidParams(format!(
            "Too many signatures: {} > {}",
            signatures.len(),
            MAX_SIGNATURE_STATUS_QUERY
        )));
    }

    let signatures = signatures
        .iter()
        .map(|s| {
            Signature::from_str(s)
                .map_err(|_| RpcError::InvalidParams(format!("Invalid signature: {}", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bank = ctx.bank.lock();
    let value = signatures
        .iter()
        .map(|signature| {
            bank.signature_status(signature).map(|status| TransactionStatus {
                slot: status.slot,
                // Single node: everything processed is final
                confirmations: None,
                err: status.err.clone(),
                status: status.err.clone().map_or(Ok(()), Err),
                confirmation_status: "finalized".to_string(),
            })
        })
        .collect();

    Ok(GetSignatureStatusesResponse {
        context: ResponseContext { slot: bank.slot() },
        value,
    })
}

/// Handle requestAirdrop RPC method
pub fn handle_request_airdrop(
    ctx: &RpcContext,
    pubkey: &str,
    lamports: u64,
) -> Result<String, RpcError> {
    let pubkey = Pubkey::from_str(pubkey)
        .map_err(|_| RpcError::InvalidParams("Invalid pubkey".to_string()))?;

    let signature = ctx
        .bank
        .lock()
        .airdrop(&pubkey, lamports)
        .map_err(|e| RpcError::InvalidParams(e.to_string()))?;

    Ok(signature.to_string())
}

/// Handle getSlot RPC method
pub fn handle_get_slot(ctx: &RpcContext) -> Result<Slot, RpcError> {
    Ok(ctx.bank.lock().slot())
}

/// Handle getHealth RPC method
pub fn handle_get_health() -> Result<String, RpcError> {
    Ok("ok".to_string())
}

// ============ Error Types ============

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Transaction failed: {message}")]
    TransactionFailed {
        message: String,
        err: Value,
        logs: Vec<String>,
    },
}

impl RpcError {
    /// JSON-RPC error code
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_) => -32602,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InternalError(_) => -32603,
            RpcError::TransactionFailed { .. } => -32002,
        }
    }

    /// Structured error data, if any
    pub fn data(&self) -> Option<Value> {
        match self {
            RpcError::TransactionFailed { err, logs, .. } => Some(json!({
                "err": err,
                "logs": logs,
            })),
            _ => None,
        }
    }
}

impl From<BankError> for RpcError {
    fn from(e: BankError) -> Self {
        let message = e.to_string();
        let Some(error) = e.transaction_error() else {
            return RpcError::InvalidParams(message);
        };
        let logs = match e {
            BankError::TransactionFailed { logs, .. } => logs,
            _ => vec![],
        };
        RpcError::TransactionFailed {
            message,
            err: serde_json::to_value(&error).unwrap_or(Value::Null),
            logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::InstructionError,
        message::Message,
        signature::{Keypair, Signer},
    };
    use student_intro_program::StudentIntroError;

    fn context() -> RpcContext {
        RpcContext::new(Arc::new(Mutex::new(LocalBank::new())))
    }

    fn encode_tx(tx: &Transaction) -> String {
        BASE64.encode(bincode::serialize(tx).unwrap())
    }

    #[test]
    fn test_get_account_info_missing() {
        let ctx = context();
        let response = handle_get_account_info(
            &ctx,
            GetAccountInfoRequest {
                pubkey: Pubkey::new_unique().to_string(),
                encoding: None,
            },
        )
        .unwrap();
        assert!(response.value.is_none());
    }

    #[test]
    fn test_airdrop_then_get_account_info() {
        let ctx = context();
        let wallet = Pubkey::new_unique();

        let signature = handle_request_airdrop(&ctx, &wallet.to_string(), 42).unwrap();
        let statuses = handle_get_signature_statuses(&ctx, &[signature]).unwrap();
        let status = statuses.value[0].as_ref().unwrap();
        assert!(status.err.is_none());
        assert_eq!(status.confirmation_status, "finalized");

        let response = handle_get_account_info(
            &ctx,
            GetAccountInfoRequest {
                pubkey: wallet.to_string(),
                encoding: Some("base58".to_string()),
            },
        )
        .unwrap();
        let info = response.value.unwrap();
        assert_eq!(info.lamports, 42);
        assert_eq!(info.data.1, "base58");
        assert_eq!(info.owner, solana_sdk::system_program::id().to_string());
    }

    #[test]
    fn test_send_transaction_and_status() {
        let ctx = context();
        let student = Keypair::new();
        handle_request_airdrop(&ctx, &student.pubkey().to_string(), 1_000_000_000).unwrap();

        let blockhash = ctx.bank.lock().latest_blockhash();
        let ix = student_intro_program::instruction::add_student_intro(
            &student_intro_program::id(),
            &student.pubkey(),
            "name",
            "message",
        );
        let tx = Transaction::new(
            &[&student],
            Message::new(&[ix], Some(&student.pubkey())),
            blockhash,
        );

        let signature = handle_send_transaction(
            &ctx,
            SendTransactionRequest {
                transaction: encode_tx(&tx),
                encoding: Some("base64".to_string()),
            },
        )
        .unwrap();
        assert_eq!(signature, tx.signatures[0].to_string());

        let statuses = handle_get_signature_statuses(&ctx, &[signature]).unwrap();
        assert!(statuses.value[0].as_ref().unwrap().status.is_ok());

        // Replaying the same transaction fails preflight
        let err = handle_send_transaction(
            &ctx,
            SendTransactionRequest {
                transaction: encode_tx(&tx),
                encoding: Some("base64".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), -32002);
    }

    #[test]
    fn test_failed_transaction_carries_logs() {
        let ctx = context();
        let student = Keypair::new();
        handle_request_airdrop(&ctx, &student.pubkey().to_string(), 1_000_000_000).unwrap();

        let blockhash = ctx.bank.lock().latest_blockhash();
        let ix = student_intro_program::instruction::close(
            &student_intro_program::id(),
            &student.pubkey(),
        );
        let tx = Transaction::new(
            &[&student],
            Message::new(&[ix], Some(&student.pubkey())),
            blockhash,
        );

        let err = handle_send_transaction(
            &ctx,
            SendTransactionRequest {
                transaction: bs58::encode(bincode::serialize(&tx).unwrap()).into_string(),
                encoding: None,
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), -32002);
        let data = err.data().unwrap();
        assert!(!data["logs"].as_array().unwrap().is_empty());

        let tx_error: TransactionError = serde_json::from_value(data["err"].clone()).unwrap();
        assert_eq!(
            tx_error,
            TransactionError::InstructionError(
                0,
                InstructionError::Custom(StudentIntroError::AccountNotInitialized as u32)
            )
        );
    }

    #[test]
    fn test_stale_blockhash_reports_typed_error() {
        let ctx = context();
        let student = Keypair::new();
        handle_request_airdrop(&ctx, &student.pubkey().to_string(), 1_000_000_000).unwrap();

        let ix = student_intro_program::instruction::close(
            &student_intro_program::id(),
            &student.pubkey(),
        );
        let tx = Transaction::new(
            &[&student],
            Message::new(&[ix], Some(&student.pubkey())),
            Hash::new_unique(),
        );

        let err = handle_send_transaction(
            &ctx,
            SendTransactionRequest {
                transaction: encode_tx(&tx),
                encoding: Some("base64".to_string()),
            },
        )
        .unwrap_err();

        assert_eq!(err.code(), -32002);
        let tx_error: TransactionError =
            serde_json::from_value(err.data().unwrap()["err"].clone()).unwrap();
        assert_eq!(tx_error, TransactionError::BlockhashNotFound);
    }

    #[test]
    fn test_invalid_params() {
        let ctx = context();
        let err = handle_request_airdrop(&ctx, "not-a-pubkey", 1).unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = handle_get_signature_statuses(&ctx, &["bad".to_string()]).unwrap_err();
        assert_eq!(err.code(), -32602);

        let err = handle_send_transaction(
            &ctx,
            SendTransactionRequest {
                transaction: "!!!".to_string(),
                encoding: Some("base64".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), -32602);
    }
}

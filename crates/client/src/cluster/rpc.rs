//! JSON-RPC cluster
//!
//! Speaks the Solana JSON-RPC subset the local validator serves and that
//! any public cluster understands.

use super::Cluster;
use crate::{config::Commitment, error::ClientError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use jsonrpsee::{
    core::{client::ClientT, ClientError as JsonRpcClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use std::{str::FromStr, time::Duration};
use tokio::time::{sleep, timeout};

/// JSON-RPC code for a transaction rejected before or during execution
const TRANSACTION_FAILED_CODE: i32 = -32002;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct RpcBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcAccount {
    data: (String, String),
    executable: bool,
    lamports: u64,
    owner: String,
    rent_epoch: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureStatus {
    err: Option<Value>,
    confirmation_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    logs: Vec<String>,
}

/// Cluster reached over HTTP JSON-RPC
pub struct RpcCluster {
    url: String,
    client: HttpClient,
    commitment: Commitment,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcCluster {
    pub fn new(
        url: &str,
        commitment: Commitment,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, ClientError> {
        let client = HttpClientBuilder::default()
            .request_timeout(confirm_timeout)
            .build(url)
            .map_err(|e| ClientError::Rpc(format!("{}: {}", url, e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
            commitment,
            confirm_timeout,
            poll_interval,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll getSignatureStatuses until the commitment is reached
    async fn confirm(&self, signature: &Signature) -> Result<(), ClientError> {
        let poll = async {
            loop {
                let statuses: RpcResponse<Vec<Option<RpcSignatureStatus>>> = self
                    .client
                    .request(
                        "getSignatureStatuses",
                        rpc_params![[signature.to_string()], json!({"searchTransactionHistory": true})],
                    )
                    .await
                    .map_err(rpc_error)?;

                if let Some(Some(status)) = statuses.value.into_iter().next() {
                    if let Some(err) = status.err {
                        return Err(ClientError::TransactionFailed {
                            signature: Some(*signature),
                            message: err.to_string(),
                            error: transaction_error(err),
                            logs: vec![],
                        });
                    }

                    // A missing level means the transaction is rooted
                    let reached = status
                        .confirmation_status
                        .as_deref()
                        .map(Commitment::from_str)
                        .transpose()
                        .map_err(ClientError::Rpc)?
                        .unwrap_or(Commitment::Finalized);
                    if reached >= self.commitment {
                        tracing::debug!("{} reached {}", signature, reached);
                        return Ok(());
                    }
                }

                sleep(self.poll_interval).await;
            }
        };

        timeout(self.confirm_timeout, poll)
            .await
            .map_err(|_| ClientError::ConfirmationTimeout {
                signature: *signature,
                timeout: self.confirm_timeout,
            })?
    }
}

/// Convert a jsonrpsee error, keeping transaction failures and their logs
fn rpc_error(e: JsonRpcClientError) -> ClientError {
    match e {
        JsonRpcClientError::Call(err) if err.code() == TRANSACTION_FAILED_CODE => {
            let data = err
                .data()
                .and_then(|raw| serde_json::from_str::<RpcErrorData>(raw.get()).ok())
                .unwrap_or_default();
            ClientError::TransactionFailed {
                signature: None,
                message: err.message().to_string(),
                error: data.err.and_then(transaction_error),
                logs: data.logs,
            }
        }
        other => ClientError::Rpc(other.to_string()),
    }
}

/// Decode a serde-encoded `TransactionError`; unknown shapes are dropped
fn transaction_error(err: Value) -> Option<TransactionError> {
    match serde_json::from_value(err) {
        Ok(error) => Some(error),
        Err(e) => {
            tracing::debug!("Unrecognized transaction error: {}", e);
            None
        }
    }
}

fn parse_pubkey(s: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(s).map_err(|e| ClientError::Rpc(format!("invalid pubkey {}: {}", s, e)))
}

fn parse_signature(s: &str) -> Result<Signature, ClientError> {
    Signature::from_str(s).map_err(|e| ClientError::Rpc(format!("invalid signature {}: {}", s, e)))
}

#[async_trait]
impl Cluster for RpcCluster {
    async fn latest_blockhash(&self) -> Result<Hash, ClientError> {
        let response: RpcResponse<RpcBlockhash> = self
            .client
            .request(
                "getLatestBlockhash",
                rpc_params![json!({"commitment": self.commitment.as_str()})],
            )
            .await
            .map_err(rpc_error)?;

        Hash::from_str(&response.value.blockhash)
            .map_err(|e| ClientError::Rpc(format!("invalid blockhash: {}", e)))
    }

    async fn send_and_confirm(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        let bytes = bincode::serialize(tx)
            .map_err(|e| ClientError::Rpc(format!("cannot serialize transaction: {}", e)))?;

        let signature: String = self
            .client
            .request(
                "sendTransaction",
                rpc_params![
                    BASE64.encode(bytes),
                    json!({
                        "encoding": "base64",
                        "preflightCommitment": self.commitment.as_str(),
                    })
                ],
            )
            .await
            .map_err(rpc_error)?;
        let signature = parse_signature(&signature)?;

        tracing::debug!("Sent {}, waiting for {}", signature, self.commitment);
        self.confirm(&signature).await?;
        Ok(signature)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ClientError> {
        let response: RpcResponse<Option<RpcAccount>> = self
            .client
            .request(
                "getAccountInfo",
                rpc_params![
                    pubkey.to_string(),
                    json!({"encoding": "base64", "commitment": self.commitment.as_str()})
                ],
            )
            .await
            .map_err(rpc_error)?;

        let Some(account) = response.value else {
            return Ok(None);
        };

        let (data, encoding) = account.data;
        if encoding != "base64" {
            return Err(ClientError::Rpc(format!(
                "unexpected account encoding: {}",
                encoding
            )));
        }
        let data = BASE64
            .decode(data)
            .map_err(|e| ClientError::Rpc(format!("invalid account data: {}", e)))?;

        Ok(Some(Account {
            lamports: account.lamports,
            data,
            owner: parse_pubkey(&account.owner)?,
            executable: account.executable,
            rent_epoch: account.rent_epoch,
        }))
    }

    async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, ClientError> {
        let signature: String = self
            .client
            .request("requestAirdrop", rpc_params![pubkey.to_string(), lamports])
            .await
            .map_err(rpc_error)?;
        let signature = parse_signature(&signature)?;

        self.confirm(&signature).await?;
        Ok(signature)
    }
}

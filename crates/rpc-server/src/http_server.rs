//! HTTP JSON-RPC Server
//!
//! Provides HTTP endpoint for JSON-RPC methods.

use crate::methods::{
    handle_get_account_info, handle_get_health, handle_get_latest_blockhash,
    handle_get_signature_statuses, handle_get_slot, handle_request_airdrop,
    handle_send_transaction, GetAccountInfoRequest, RpcContext, RpcError, SendTransactionRequest,
};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// HTTP RPC Server
pub struct HttpRpcServer {
    context: Arc<RpcContext>,
}

impl HttpRpcServer {
    /// Create a new HTTP RPC server
    pub fn new(context: Arc<RpcContext>) -> Self {
        Self { context }
    }

    /// Create the Axum router
    pub fn router(self) -> Router {
        // CORS layer to allow browser clients
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

        Router::new()
            .route("/", post(handle_rpc))
            .layer(cors)
            .with_state(self.context)
    }

    /// Bind `addr` and run the server
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        tracing::info!("HTTP RPC server listening on {}", local_addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Handle JSON-RPC request
async fn handle_rpc(
    State(context): State<Arc<RpcContext>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let result = dispatch(context, request.method.clone(), request.params).await;

    let response = match result {
        Ok(value) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: Some(value),
            error: None,
        },
        Err(e) => {
            tracing::debug!("RPC {} failed: {}", request.method, e);
            JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(JsonRpcError {
                    code: e.code(),
                    message: e.to_string(),
                    data: e.data(),
                }),
            }
        }
    };

    (StatusCode::OK, Json(response))
}

/// Run a method on the blocking pool.
///
/// Handlers take the bank lock and `sendTransaction` executes the transaction
/// before returning, so neither may run on a runtime worker.
pub async fn dispatch(
    context: Arc<RpcContext>,
    method: String,
    params: Value,
) -> Result<Value, RpcError> {
    tokio::task::spawn_blocking(move || dispatch_method(&context, &method, params))
        .await
        .map_err(|e| RpcError::InternalError(format!("RPC handler panicked: {}", e)))?
}

/// Positional params as an array; `null` or missing means none
fn positional(params: Value) -> Result<Vec<Value>, RpcError> {
    match params {
        Value::Null => Ok(vec![]),
        Value::Array(values) => Ok(values),
        _ => Err(RpcError::InvalidParams(
            "Expected an array of params".to_string(),
        )),
    }
}

/// Encoding from a trailing config param, either `"base64"` or `{"encoding": "base64"}`
fn encoding_param(param: Option<&Value>) -> Option<String> {
    match param {
        Some(Value::String(s)) => Some(s.clone()),
        Some(config) => config
            .get("encoding")
            .and_then(|v| v.as_str())
            .map(String::from),
        None => None,
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::InternalError(e.to_string()))
}

/// Dispatch to appropriate method handler
pub fn dispatch_method(ctx: &RpcContext, method: &str, params: Value) -> Result<Value, RpcError> {
    tracing::debug!("RPC method called: {}", method);
    match method {
        "sendTransaction" => {
            let params = positional(params)?;
            let transaction = params
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| RpcError::InvalidParams("Missing transaction".to_string()))?;

            let request = SendTransactionRequest {
                transaction: transaction.to_string(),
                encoding: encoding_param(params.get(1)),
            };

            let sig = handle_send_transaction(ctx, request)?;
            Ok(json!(sig))
        }

        "getAccountInfo" => {
            let params = positional(params)?;
            let pubkey = params
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| RpcError::InvalidParams("Missing pubkey".to_string()))?;

            let request = GetAccountInfoRequest {
                pubkey: pubkey.to_string(),
                encoding: encoding_param(params.get(1)),
            };

            to_value(handle_get_account_info(ctx, request)?)
        }

        "getLatestBlockhash" => to_value(handle_get_latest_blockhash(ctx)?),

        "getSignatureStatuses" => {
            let params = positional(params)?;
            let signatures: Vec<String> = params
                .first()
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| RpcError::InvalidParams("Expected signature list".to_string()))?
                .ok_or_else(|| RpcError::InvalidParams("Missing signatures".to_string()))?;

            to_value(handle_get_signature_statuses(ctx, &signatures)?)
        }

        "requestAirdrop" => {
            let params = positional(params)?;
            let pubkey = params
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| RpcError::InvalidParams("Missing pubkey".to_string()))?;
            let lamports = params
                .get(1)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| RpcError::InvalidParams("Missing lamports".to_string()))?;

            let sig = handle_request_airdrop(ctx, pubkey, lamports)?;
            Ok(json!(sig))
        }

        "getSlot" => {
            let slot = handle_get_slot(ctx)?;
            Ok(json!(slot))
        }

        "getHealth" => {
            let health = handle_get_health()?;
            Ok(json!(health))
        }

        "getVersion" => Ok(json!({
            "solana-core": "2.1.0",
            "feature-set": 0,
            "student-intro-version": env!("CARGO_PKG_VERSION"),
        })),

        _ => Err(RpcError::MethodNotFound(method.to_string())),
    }
}

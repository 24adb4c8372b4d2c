//! JSON-RPC envelope types
//!
//! CGRateS clients talk JSON-RPC over HTTP. Requests carry the call
//! arguments as the first element of `params`.

use apolo_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Error codes
// ============================================================================

/// Malformed JSON body
pub const PARSE_ERROR: i32 = -32700;
/// Body is JSON but not a request object
pub const INVALID_REQUEST: i32 = -32600;
/// Method not served here
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Arguments could not be decoded
pub const INVALID_PARAMS: i32 = -32602;
/// Engine failure; the message is the engine error text
pub const SERVER_ERROR: i32 = -32000;

// ============================================================================
// Envelope
// ============================================================================

/// Incoming request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, echoed back when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    pub method: String,

    #[serde(default)]
    pub params: Vec<Value>,

    /// Number, string or null
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    /// First positional argument, `None` when absent or null
    pub fn first_param(&self) -> Option<&Value> {
        self.params.first().filter(|v| !v.is_null())
    }
}

/// Outgoing response, exactly one of `result` and `error` is set
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    #[serde(default)]
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, jsonrpc: Option<String>, result: Value) -> Self {
        Self {
            jsonrpc,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, jsonrpc: Option<String>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc,
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn from_result(
        id: Value,
        jsonrpc: Option<String>,
        result: Result<Value, JsonRpcError>,
    ) -> Self {
        match result {
            Ok(v) => Self::success(id, jsonrpc, v),
            Err(e) => Self::failure(id, jsonrpc, e),
        }
    }
}

/// Error object
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("parse error: {}", detail))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("rpc: can't find method {}", method))
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("invalid params: {}", detail))
    }
}

impl From<AppError> for JsonRpcError {
    fn from(err: AppError) -> Self {
        Self::new(SERVER_ERROR, err.to_string())
    }
}

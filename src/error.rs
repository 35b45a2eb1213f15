//! Error types for the gateway

use serde_json::json;
use thiserror::Error;
use warp::{
    http::StatusCode,
    reject::Reject,
    reply::{Json, WithStatus},
    Rejection,
};

/// Type alias for Results using GatewayError
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The generic gateway error
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A value failed validation against the RFQ/quote invariants of the
    /// wire protocol
    #[error("validation error: {0}")]
    Validation(String),
    /// The requested chain is not active or not registered
    #[error("chain not active or not registered: {0}")]
    ChainNotActive(u64),
    /// A websocket transport error
    #[error("transport error: {0}")]
    Transport(String),
    /// An on-chain RPC call failed
    #[error("rpc error: {0}")]
    Rpc(String),
    /// JSON serialization/deserialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A fatal configuration error encountered at startup
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Create a validation error
    #[allow(clippy::needless_pass_by_value)]
    pub fn validation<S: ToString>(msg: S) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a transport error
    #[allow(clippy::needless_pass_by_value)]
    pub fn transport<S: ToString>(msg: S) -> Self {
        Self::Transport(msg.to_string())
    }

    /// Create an rpc error
    #[allow(clippy::needless_pass_by_value)]
    pub fn rpc<S: ToString>(msg: S) -> Self {
        Self::Rpc(msg.to_string())
    }

    /// Create a configuration error
    #[allow(clippy::needless_pass_by_value)]
    pub fn config<S: ToString>(msg: S) -> Self {
        Self::Config(msg.to_string())
    }
}

impl Reject for GatewayError {}

// ------------------
// | Error Handling |
// ------------------

/// Handle rejections and convert GatewayError to JSON responses
pub async fn handle_rejection(err: Rejection) -> Result<WithStatus<Json>, Rejection> {
    if let Some(gateway_error) = err.find::<GatewayError>() {
        let msg = format!("internal server error: {gateway_error}");
        Ok(json_error(&msg, StatusCode::INTERNAL_SERVER_ERROR))
    } else if err.is_not_found() {
        Ok(json_error("not found", StatusCode::NOT_FOUND))
    } else {
        Err(err)
    }
}

/// Return a json error from a string message
fn json_error(msg: &str, code: StatusCode) -> WithStatus<Json> {
    let json = json!({ "error": msg });
    warp::reply::with_status(warp::reply::json(&json), code)
}

//! Error Types
//!
//! Design Decision: Two dedicated error types instead of one flat enum
//!
//! Rationale: failures at the wire/application boundary (`RpcException`, the JSON-RPC error
//! object itself) and failures in the machinery that moves bytes around (`EndpointError`,
//! framing/IO/shutdown) are different audiences. A handler matches on `RpcException` to decide
//! what code to send back; an endpoint owner matches on `EndpointError` to decide whether to
//! reconnect. Conflating them would force every caller to handle cases that don't apply to them.
//!
//! Trade-offs:
//! - Two enums to maintain vs. one generic error with a kind field
//! - Explicit code<->variant mapping vs. storing the raw code everywhere
//!
//! Alternatives Considered:
//! 1. Single flat error enum: rejected, mixes wire semantics with transport plumbing.
//! 2. `anyhow::Error` throughout: rejected, this is a library surface and callers need to match
//!    on specific variants.

use thiserror::Error;

use crate::protocol::Id;

/// Reserved JSON-RPC 2.0 error codes.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SERVER_ERROR_LOWER: i64 = -32099;
pub const SERVER_ERROR_UPPER: i64 = -32000;

/// The typed JSON-RPC error taxonomy.
///
/// Every variant carries enough information to reconstruct the wire-level `{code, message,
/// data}` error object. Handlers may return this directly from a dispatch callback to control
/// exactly what code/message/data the caller sees; any other error type is wrapped into
/// [`RpcException::Internal`] with the formatted cause placed in `data`.
///
/// Usage:
///     async fn handler(params: Params) -> Result<Value, RpcException> {
///         Err(RpcException::MethodNotFound { method: "foo".into() })
///     }
#[derive(Debug, Error, Clone)]
pub enum RpcException {
    /// The JSON body could not be parsed at all.
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// The JSON parsed but was not a valid JSON-RPC entity.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// No handler is registered for the requested namespace/method.
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// The handler's parameters did not match the call's arity/shape.
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    /// The handler raised an unexpected failure.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// An application-defined error in the `-32000..-32099` range.
    #[error("Server error ({code}): {message}")]
    ServerError {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// A code outside every reserved/server range, carried through verbatim.
    #[error("RPC error ({code}): {message}")]
    Custom {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
}

impl RpcException {
    /// The wire code this exception maps to.
    pub fn code(&self) -> i64 {
        match self {
            RpcException::ParseError { .. } => PARSE_ERROR,
            RpcException::InvalidRequest { .. } => INVALID_REQUEST,
            RpcException::MethodNotFound { .. } => METHOD_NOT_FOUND,
            RpcException::InvalidParams { .. } => INVALID_PARAMS,
            RpcException::Internal { .. } => INTERNAL_ERROR,
            RpcException::ServerError { code, .. } => *code,
            RpcException::Custom { code, .. } => *code,
        }
    }

    /// The `data` field this exception would carry on the wire, if any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            RpcException::Internal { data, .. } => data.clone(),
            RpcException::ServerError { data, .. } => data.clone(),
            RpcException::Custom { data, .. } => data.clone(),
            _ => None,
        }
    }

    /// Reconstruct an exception from a received `(code, message, data)` triple.
    ///
    /// Mirrors the source's `JsonRpcException.from_error` registry: reserved codes map to their
    /// named kind, the server-error range maps to [`RpcException::ServerError`], and anything
    /// else passes through as [`RpcException::Custom`].
    pub fn from_error(code: i64, message: String, data: Option<serde_json::Value>) -> Self {
        match code {
            PARSE_ERROR => RpcException::ParseError { message },
            INVALID_REQUEST => RpcException::InvalidRequest { message },
            METHOD_NOT_FOUND => RpcException::MethodNotFound { method: message },
            INVALID_PARAMS => RpcException::InvalidParams { message },
            INTERNAL_ERROR => RpcException::Internal { message, data },
            code if (SERVER_ERROR_UPPER..=SERVER_ERROR_LOWER).contains(&code) => {
                RpcException::ServerError { code, message, data }
            }
            code => RpcException::Custom { code, message, data },
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RpcException::Internal { message: message.into(), data: None }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        RpcException::MethodNotFound { method: method.into() }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        RpcException::InvalidParams { message: message.into() }
    }
}

/// Failures in the transport/endpoint machinery itself, as distinct from JSON-RPC error replies.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The underlying stream ended (cleanly or not) while a call was still pending.
    #[error("stream closed")]
    StreamClosed,

    /// The endpoint was closed before or during this operation.
    #[error("endpoint is closed")]
    Closed,

    /// A call did not receive a response before its timeout elapsed.
    #[error("call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The peer's reply could not be correlated to a pending call.
    #[error("no pending call for id {0:?}")]
    UnknownId(Id),

    /// IO failure reading or writing the transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer returned a JSON-RPC error in reply to a call.
    #[error(transparent)]
    Rpc(#[from] RpcException),
}

pub type Result<T> = std::result::Result<T, EndpointError>;

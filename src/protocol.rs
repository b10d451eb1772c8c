//! JSON-RPC 2.0 Entity Model
//!
//! Design Decision: a tagged sum type (`Entity`) rather than a class hierarchy
//!
//! Rationale: every JSON-RPC message on the wire is one of a small closed set of shapes.
//! Modeling each shape as an `Entity` variant lets the compiler enforce exhaustive handling at
//! every call site that routes entities (the endpoint's reader loop, the dispatch namespace),
//! instead of relying on runtime `isinstance` checks as the source implementation does.
//!
//! Trade-offs:
//! - Exhaustiveness checking vs. open extensibility (a new wire shape needs a new variant and a
//!   recompile, not a new subclass)
//! - One `Malformed` variant absorbs every decode failure rather than raising, so `decode` can be
//!   total (see `serializer.rs`)
//!
//! Extension Points: a custom framing layer could add transport-specific metadata by wrapping
//! `Entity` rather than extending it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::RpcException;

/// A JSON-RPC request/response identifier.
///
/// Per the spec, ids are non-null scalars: either an integer or a string. `Id` is kept distinct
/// from `serde_json::Value` so that pending-request lookups and comparisons don't have to reason
/// about non-scalar JSON values that are not valid ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

/// The shape of a call's parameters.
///
/// JSON-RPC allows `params` to be absent, a positional array, or a named object. A bare scalar
/// never appears on the wire, but dispatch still needs a slot for "one value, no structure" when
/// a handler is invoked with something that isn't array-or-object shaped; `Raw` exists for that
/// internal case and is never produced by [`crate::serializer::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
    Raw(Value),
}

impl Params {
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            None => Params::None,
            Some(Value::Array(items)) => Params::Positional(items),
            Some(Value::Object(map)) => Params::Named(map),
            Some(other) => Params::Raw(other),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Params::None => None,
            Params::Positional(items) => Some(Value::Array(items)),
            Params::Named(map) => Some(Value::Object(map)),
            Params::Raw(v) => Some(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Params::None)
    }

    /// Deserialize the params into `T`, mapping any failure to [`RpcException::InvalidParams`].
    pub fn into_typed<T: serde::de::DeserializeOwned>(self) -> Result<T, RpcException> {
        let value = self.into_value().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| RpcException::invalid_params(e.to_string()))
    }
}

/// The full JSON-RPC error object, as carried by [`Entity::Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&RpcException> for ErrorDetails {
    fn from(exc: &RpcException) -> Self {
        ErrorDetails {
            code: exc.code(),
            message: exc.to_string(),
            data: exc.data(),
        }
    }
}

impl From<RpcException> for ErrorDetails {
    fn from(exc: RpcException) -> Self {
        ErrorDetails::from(&exc)
    }
}

/// One JSON-RPC 2.0 message, inbound or outbound.
///
/// `Malformed` is the odd one out: it is never serialized (see `serializer::encode`'s
/// `debug_assert!`) and exists purely so the reader loop has something to route when decoding
/// fails, keeping `decode` total rather than fallible.
#[derive(Debug, Clone)]
pub enum Entity {
    Request {
        id: Id,
        method: String,
        params: Params,
    },
    Notification {
        method: String,
        params: Params,
    },
    Result {
        id: Id,
        result: Value,
    },
    Error {
        id: Option<Id>,
        error: ErrorDetails,
    },
    Batch(Vec<Entity>),
    Malformed {
        id: Option<Id>,
        cause: String,
    },
}

impl Entity {
    pub fn request(id: impl Into<Id>, method: impl Into<String>, params: Params) -> Self {
        Entity::Request { id: id.into(), method: method.into(), params }
    }

    pub fn notification(method: impl Into<String>, params: Params) -> Self {
        Entity::Notification { method: method.into(), params }
    }

    pub fn result(id: impl Into<Id>, result: Value) -> Self {
        Entity::Result { id: id.into(), result }
    }

    pub fn error(id: Option<Id>, error: ErrorDetails) -> Self {
        Entity::Error { id, error }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Entity::Malformed { .. })
    }

    /// True for entities that never produce a reply when routed by the endpoint.
    pub fn is_reply_free(&self) -> bool {
        matches!(self, Entity::Notification { .. })
    }
}

//! Entity Serialization
//!
//! Design Decision: `decode` never fails
//!
//! Rationale: a peer sending one malformed frame must not be able to take down the reader loop.
//! Every failure mode — invalid JSON, missing fields, wrong shapes, an empty batch — collapses
//! into `Entity::Malformed`, which the endpoint turns into a proper JSON-RPC error reply (or
//! logs and drops, for entities with no id at all). `encode`, by contrast, is only ever called on
//! entities this crate itself constructed, so it is allowed to assert that it is never asked to
//! serialize a `Malformed` entity.
//!
//! Alternatives Considered:
//! 1. `decode` returning `Result<Entity, DecodeError>`: rejected, pushes the "what do I reply
//!    with" decision out to every caller instead of centralizing it in the endpoint's router.

use serde_json::{Map, Value};

use crate::protocol::{Entity, ErrorDetails, Id, Params};

const JSONRPC_VERSION: &str = "2.0";

/// Serialize one entity to its wire-format JSON bytes.
///
/// # Panics in debug builds
/// Encoding [`Entity::Malformed`] is a programmer error: malformed entities are an internal
/// routing signal and must be converted to an `Entity::Error` before being encoded. Debug builds
/// assert this; release builds fall back to an empty internal-error object rather than panicking
/// in production.
pub fn encode(entity: &Entity) -> Vec<u8> {
    let value = to_value(entity);
    serde_json::to_vec(&value).expect("entity values are always serializable")
}

fn to_value(entity: &Entity) -> Value {
    match entity {
        Entity::Request { id, method, params } => {
            let mut obj = Map::new();
            obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            obj.insert("id".into(), id_to_value(id));
            obj.insert("method".into(), Value::String(method.clone()));
            if let Some(p) = params.clone().into_value() {
                obj.insert("params".into(), p);
            }
            Value::Object(obj)
        }
        Entity::Notification { method, params } => {
            let mut obj = Map::new();
            obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            obj.insert("method".into(), Value::String(method.clone()));
            if let Some(p) = params.clone().into_value() {
                obj.insert("params".into(), p);
            }
            Value::Object(obj)
        }
        Entity::Result { id, result } => {
            let mut obj = Map::new();
            obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            obj.insert("id".into(), id_to_value(id));
            obj.insert("result".into(), result.clone());
            Value::Object(obj)
        }
        Entity::Error { id, error } => {
            let mut obj = Map::new();
            obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            obj.insert(
                "id".into(),
                id.as_ref().map(id_to_value).unwrap_or(Value::Null),
            );
            obj.insert(
                "error".into(),
                serde_json::to_value(error).expect("ErrorDetails always serializes"),
            );
            Value::Object(obj)
        }
        Entity::Batch(entities) => Value::Array(entities.iter().map(to_value).collect()),
        Entity::Malformed { .. } => {
            debug_assert!(
                false,
                "attempted to encode a Malformed entity; convert it to an Error reply first"
            );
            Value::Object({
                let mut obj = Map::new();
                obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
                obj.insert("id".into(), Value::Null);
                obj.insert(
                    "error".into(),
                    serde_json::json!({"code": crate::error::INTERNAL_ERROR, "message": "attempted to encode a malformed entity"}),
                );
                obj
            })
        }
    }
}

fn id_to_value(id: &Id) -> Value {
    match id {
        Id::Number(n) => Value::Number((*n).into()),
        Id::String(s) => Value::String(s.clone()),
    }
}

/// Parse one wire-format JSON value into an entity, never failing.
pub fn decode(bytes: &[u8]) -> Entity {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => decode_value(value),
        Err(e) => Entity::Malformed { id: None, cause: e.to_string() },
    }
}

fn decode_value(value: Value) -> Entity {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Entity::Malformed {
                    id: None,
                    cause: "batch must not be empty".into(),
                };
            }
            Entity::Batch(items.into_iter().map(decode_value).collect())
        }
        Value::Object(mut obj) => decode_object(&mut obj),
        other => Entity::Malformed {
            id: None,
            cause: format!("expected an object or array, got {other}"),
        },
    }
}

fn decode_object(obj: &mut Map<String, Value>) -> Entity {
    let id = match decode_id(obj) {
        Ok(id) => id,
        Err(()) => {
            return Entity::Malformed {
                id: None,
                cause: "id must be a non-null scalar (integer or string)".into(),
            };
        }
    };

    if let Some(method) = obj.remove("method") {
        let Some(method) = method.as_str().map(str::to_owned) else {
            return Entity::Malformed { id, cause: "method must be a string".into() };
        };
        let params = Params::from_value(obj.remove("params"));
        return match id {
            Some(id) => Entity::Request { id, method, params },
            None => Entity::Notification { method, params },
        };
    }

    if let Some(result) = obj.remove("result") {
        return match id {
            Some(id) => Entity::Result { id, result },
            None => Entity::Malformed {
                id: None,
                cause: "result entity is missing id".into(),
            },
        };
    }

    if let Some(error_value) = obj.remove("error") {
        return match serde_json::from_value::<ErrorDetails>(error_value) {
            Ok(error) => Entity::Error { id, error },
            Err(e) => Entity::Malformed { id, cause: e.to_string() },
        };
    }

    Entity::Malformed {
        id,
        cause: "object is neither a request, notification, result, nor error".into(),
    }
}

/// Extracts the `id` field, distinguishing "absent or null" (a valid, idless entity) from
/// "present but not a scalar" (invalid on the wire, `Err`). A bare `None` does not tell a caller
/// which of those two happened, which is exactly the distinction SPEC_FULL.md's id invariant
/// needs: `{"id": 1.5, "method": "foo"}` must become `Malformed`, not silently decode as if `id`
/// had never been sent at all.
fn decode_id(obj: &mut Map<String, Value>) -> std::result::Result<Option<Id>, ()> {
    match obj.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_to_id(value).map(Some).ok_or(()),
    }
}

fn value_to_id(value: Value) -> Option<Id> {
    match value {
        Value::Number(n) => n.as_i64().map(Id::Number),
        Value::String(s) => Some(Id::String(s)),
        _ => None,
    }
}

//! Dispatch Namespace
//!
//! Design Decision: explicit registration instead of reflective discovery
//!
//! Rationale: the source offers three "discovery modes" — decorated, public, and all member
//! callables — because a dynamic language can enumerate a target object's methods at runtime.
//! Rust cannot, so this crate keeps only the generalized form of the `decorated` mode: the
//! embedding application builds a [`DispatchNamespace`] by registering each handler explicitly
//! through [`DispatchNamespaceBuilder`]. `public`/`all` had no independent meaning once discovery
//! goes away — they differed only in which members got swept up by reflection — so nothing is
//! lost by dropping them, only the enumeration mechanism they depended on.
//!
//! Trade-offs:
//! - A little registration boilerplate vs. "just implement the trait and it's found"
//! - Handlers are `dyn`-dispatched trait objects, so each call pays one vtable indirection

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcException;
use crate::protocol::Params;

/// Whether a registered handler answers requests (expects a reply) or notifications (fire and
/// forget). Kept as data rather than two separate maps so namespaces can report registered
/// methods uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Request,
    Notification,
}

/// A handler bound to one method name.
///
/// Implemented for any `async fn(Params) -> Result<Value, RpcException>` via the blanket impl
/// below; most callers won't implement this trait by hand.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, params: Params) -> Result<Value, RpcException>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, RpcException>> + Send,
{
    async fn handle(&self, params: Params) -> Result<Value, RpcException> {
        (self)(params).await
    }
}

struct Registration {
    handler: Arc<dyn Handler>,
    kind: RequestKind,
}

/// A named group of handlers, built once and then shared read-only across the endpoint's
/// lifetime.
pub struct DispatchNamespace {
    handlers: HashMap<String, Registration>,
}

impl DispatchNamespace {
    pub fn builder() -> DispatchNamespaceBuilder {
        DispatchNamespaceBuilder::new()
    }

    /// Invoke a registered request handler, awaiting its result.
    ///
    /// Returns [`RpcException::MethodNotFound`] if nothing is registered under `method`. Any
    /// error the handler itself returns passes through unchanged — handlers are expected to
    /// return a well-formed [`RpcException`] (mapping bad input to `InvalidParams`, for example);
    /// anything else should be wrapped by the caller, conventionally the endpoint's router, into
    /// `RpcException::Internal`.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value, RpcException> {
        match self.handlers.get(method) {
            Some(reg) => reg.handler.handle(params).await,
            None => Err(RpcException::method_not_found(method)),
        }
    }

    /// Invoke a registered notification handler. Lookup and handler failures are returned to the
    /// caller (conventionally logged and swallowed by the endpoint, since notifications have no
    /// reply channel) rather than panicking.
    pub async fn notify(&self, method: &str, params: Params) -> Result<(), RpcException> {
        match self.handlers.get(method) {
            Some(reg) => reg.handler.handle(params).await.map(|_| ()),
            None => Err(RpcException::method_not_found(method)),
        }
    }

    pub fn kind_of(&self, method: &str) -> Option<RequestKind> {
        self.handlers.get(method).map(|reg| reg.kind)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Builds a [`DispatchNamespace`] by explicit registration.
#[derive(Default)]
pub struct DispatchNamespaceBuilder {
    handlers: HashMap<String, Registration>,
}

impl DispatchNamespaceBuilder {
    pub fn new() -> Self {
        DispatchNamespaceBuilder { handlers: HashMap::new() }
    }

    /// Register a handler that answers requests (a reply is always produced).
    pub fn request(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(
            name.into(),
            Registration { handler: Arc::new(handler), kind: RequestKind::Request },
        );
        self
    }

    /// Register a handler that answers notifications (no reply is ever produced, even on error).
    pub fn notification(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(
            name.into(),
            Registration { handler: Arc::new(handler), kind: RequestKind::Notification },
        );
        self
    }

    pub fn build(self) -> DispatchNamespace {
        DispatchNamespace { handlers: self.handlers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_handler(params: Params) -> impl std::future::Future<Output = Result<Value, RpcException>> {
        async move { Ok(params.into_value().unwrap_or(Value::Null)) }
    }

    #[tokio::test]
    async fn dispatches_a_positional_call() {
        let ns = DispatchNamespace::builder()
            .request("sum", |params: Params| async move {
                let (a, b): (i64, i64) = params.into_typed()?;
                Ok(Value::from(a + b))
            })
            .build();

        let result = ns
            .call("sum", Params::Positional(vec![serde_json::json!(10), serde_json::json!(9)]))
            .await
            .unwrap();
        assert_eq!(result, Value::from(19));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let ns = DispatchNamespace::builder().build();
        let err = ns.call("missing", Params::None).await.unwrap_err();
        assert!(matches!(err, RpcException::MethodNotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_params_shape_is_reported() {
        let ns = DispatchNamespace::builder()
            .request("sum", |params: Params| async move {
                let (a, b): (i64, i64) = params.into_typed()?;
                Ok(Value::from(a + b))
            })
            .build();

        let err = ns.call("sum", Params::Positional(vec![serde_json::json!("nope")])).await.unwrap_err();
        assert!(matches!(err, RpcException::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn notification_handler_error_is_returned_not_panicked() {
        let ns = DispatchNamespace::builder()
            .notification("boom", |_: Params| async move {
                Err(RpcException::internal("handler exploded"))
            })
            .build();

        let err = ns.notify("boom", Params::None).await.unwrap_err();
        assert!(matches!(err, RpcException::Internal { .. }));
    }

    #[tokio::test]
    async fn echo_handler_round_trips_named_params() {
        let ns = DispatchNamespace::builder().request("echo", echo_handler).build();
        let mut map = serde_json::Map::new();
        map.insert("hello".into(), Value::from("world"));
        let result = ns.call("echo", Params::Named(map.clone())).await.unwrap();
        assert_eq!(result, Value::Object(map));
    }

    #[test]
    fn kind_of_reports_registered_request_kind() {
        let ns = DispatchNamespace::builder()
            .request("req", |_: Params| async move { Ok(Value::Null) })
            .notification("note", |_: Params| async move { Ok(Value::Null) })
            .build();
        assert_eq!(ns.kind_of("req"), Some(RequestKind::Request));
        assert_eq!(ns.kind_of("note"), Some(RequestKind::Notification));
        assert_eq!(ns.kind_of("missing"), None);
    }
}

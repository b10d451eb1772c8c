//! Proxy Namespace
//!
//! Design Decision: a captured handle instead of rewriting a target object's methods in place
//!
//! Rationale: the source's proxy mode works by replacing a plain object's methods with ones that
//! forward over RPC — straightforward in a language where methods are just attributes. Rust has
//! no equivalent rebinding; instead, [`ProxyHandle`] is a cheap, `Clone`-able capture of an
//! endpoint and a namespace name. Embedding code defines whatever trait or struct represents the
//! remote interface it wants to call, and implements it in terms of `handle.call(...)` /
//! `handle.notify(...)` — the generated-stub idea the design notes describe, just written by
//! hand instead of synthesized.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::protocol::Params;

/// A handle bound to one endpoint and one remote namespace, used to build outbound call stubs.
#[derive(Clone)]
pub struct ProxyHandle {
    endpoint: Endpoint,
    namespace: String,
}

impl ProxyHandle {
    pub(crate) fn new(endpoint: Endpoint, namespace: String) -> Self {
        ProxyHandle { endpoint, namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Issue a request to `method` within this proxy's namespace and await the raw JSON result.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.endpoint.call(&self.namespace, method, params).await
    }

    /// Issue a request and deserialize its result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Params) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            crate::error::EndpointError::Rpc(crate::error::RpcException::internal(format!(
                "failed to decode result: {e}"
            )))
        })
    }

    /// Fire a notification to `method` within this proxy's namespace.
    pub async fn notify(&self, method: &str, params: Params) -> Result<()> {
        self.endpoint.notify(&self.namespace, method, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::dispatch::DispatchNamespace;
    use crate::stream::{ContentLengthReader, ContentLengthWriter, EntityReader, EntityWriter};
    use tokio::io::duplex;

    fn build_pair() -> (
        (Box<dyn EntityReader>, Box<dyn EntityWriter>),
        (Box<dyn EntityReader>, Box<dyn EntityWriter>),
    ) {
        let (a, b) = duplex(16 * 1024);
        let (a_read, a_write) = tokio::io::split(a);
        let (b_read, b_write) = tokio::io::split(b);
        (
            (
                Box::new(ContentLengthReader::new(a_read)),
                Box::new(ContentLengthWriter::new(a_write)),
            ),
            (
                Box::new(ContentLengthReader::new(b_read)),
                Box::new(ContentLengthWriter::new(b_write)),
            ),
        )
    }

    #[tokio::test]
    async fn proxy_call_forwards_into_namespace() {
        let ((r1, w1), (r2, w2)) = build_pair();
        let server = Endpoint::new(r2, w2, EndpointConfig::default());
        server
            .attach_dispatcher(
                "greeter",
                DispatchNamespace::builder()
                    .request("hello", |params: Params| async move {
                        let (name,): (String,) = params.into_typed()?;
                        Ok(Value::from(format!("hello, {name}")))
                    })
                    .build(),
            )
            .await;
        server.start();

        let client = Endpoint::new(r1, w1, EndpointConfig::default());
        client.start();
        let greeter = client.proxy("greeter");
        let greeting: String = greeter
            .call_typed("hello", Params::Positional(vec![Value::from("world")]))
            .await
            .unwrap();
        assert_eq!(greeting, "hello, world");
    }

    #[tokio::test]
    async fn proxy_notify_does_not_await_a_reply() {
        let ((r1, w1), (r2, w2)) = build_pair();
        let server = Endpoint::new(r2, w2, EndpointConfig::default());
        server
            .attach_dispatcher(
                "log",
                DispatchNamespace::builder()
                    .notification("emit", |_: Params| async move { Ok(Value::Null) })
                    .build(),
            )
            .await;
        server.start();

        let client = Endpoint::new(r1, w1, EndpointConfig::default());
        client.start();
        let logger = client.proxy("log");
        logger.notify("emit", Params::None).await.unwrap();
    }
}

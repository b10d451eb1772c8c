//! A bidirectional JSON-RPC 2.0 endpoint over any ordered, reliable byte stream.
//!
//! An [`Endpoint`] multiplexes inbound request/notification dispatch and outbound request/
//! notification calls over a single transport, correlating outbound calls to their eventual
//! replies by id. Framing defaults to Content-Length (LSP-style); any transport whose reader half
//! implements [`stream::EntityReader`] and whose writer half implements [`stream::EntityWriter`]
//! can be used in its place.
//!
//! ```no_run
//! use jsonrpc_endpoint::{
//!     config::EndpointConfig,
//!     dispatch::DispatchNamespace,
//!     endpoint::Endpoint,
//!     protocol::Params,
//!     stream::{ContentLengthReader, ContentLengthWriter},
//! };
//!
//! # async fn run(stream: tokio::net::TcpStream) {
//! let (read_half, write_half) = stream.into_split();
//! let reader = Box::new(ContentLengthReader::new(read_half));
//! let writer = Box::new(ContentLengthWriter::new(write_half));
//! let endpoint = Endpoint::new(reader, writer, EndpointConfig::default());
//!
//! endpoint
//!     .attach_dispatcher(
//!         "math",
//!         DispatchNamespace::builder()
//!             .request("sum", |params: Params| async move {
//!                 let (a, b): (i64, i64) = params.into_typed()?;
//!                 Ok(serde_json::Value::from(a + b))
//!             })
//!             .build(),
//!     )
//!     .await;
//! endpoint.start();
//!
//! let result = endpoint.call("math", "sum", Params::Positional(vec![10.into(), 9.into()])).await;
//! # let _ = result;
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod serializer;
pub mod stream;

pub use config::EndpointConfig;
pub use dispatch::{DispatchNamespace, DispatchNamespaceBuilder, Handler, RequestKind};
pub use endpoint::Endpoint;
pub use error::{EndpointError, Result, RpcException};
pub use protocol::{Entity, ErrorDetails, Id, Params};
pub use proxy::ProxyHandle;

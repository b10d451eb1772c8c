//! Integration test: a real TCP connection carrying a sequence of calls end to end.
//!
//! Grounded in the original implementation's TCP server test, which opens a real socket and
//! checks that a run of sequential calls each echo back the value sent.

use jsonrpc_endpoint::{
    config::EndpointConfig,
    dispatch::DispatchNamespace,
    endpoint::Endpoint,
    protocol::Params,
    stream::{ContentLengthReader, ContentLengthWriter},
};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};

/// Builds an endpoint over one accepted/connected socket, without starting its reader task — the
/// caller attaches its dispatchers first, then calls `start()`.
fn endpoint_over(stream: TcpStream) -> Endpoint {
    let (read_half, write_half) = stream.into_split();
    let reader = Box::new(ContentLengthReader::new(read_half));
    let writer = Box::new(ContentLengthWriter::new(write_half));
    Endpoint::new(reader, writer, EndpointConfig::default())
}

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn sequential_calls_over_a_real_socket_echo_back() {
    init_test_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let server = endpoint_over(stream);
        server
            .attach_dispatcher(
                "echo",
                DispatchNamespace::builder()
                    .request("value", |params: Params| async move {
                        let (v,): (Value,) = params.into_typed()?;
                        Ok(v)
                    })
                    .build(),
            )
            .await;
        server.start();
        server.closed().await;
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let client = endpoint_over(stream);
    client.start();

    for i in 0..100i64 {
        let result = client
            .call("echo", "value", Params::Positional(vec![Value::from(i)]))
            .await
            .unwrap();
        assert_eq!(result, Value::from(i));
    }

    client.close().await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), server_task).await;
}

#[tokio::test]
async fn batch_with_malformed_element_yields_mixed_reply_batch() {
    use jsonrpc_endpoint::serializer::{decode, encode};
    use jsonrpc_endpoint::protocol::Entity;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let server = endpoint_over(stream);
        server
            .attach_dispatcher(
                "",
                DispatchNamespace::builder()
                    .request("ping", |_: Params| async move { Ok(Value::from("pong")) })
                    .build(),
            )
            .await;
        server.start();
        server.closed().await;
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();

    let batch = serde_json::json!([
        {"jsonrpc": "2.0", "id": 1, "method": "ping"},
        {"not": "valid"},
    ]);
    let body = serde_json::to_vec(&batch).unwrap();
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(header.as_bytes()).await.unwrap();
    stream.write_all(&body).await.unwrap();
    stream.flush().await.unwrap();

    // Read the raw reply frame back and confirm it is a two-element batch: one Result, one Error.
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.unwrap();
    let raw = &buf[..n];
    let header_end = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let reply = decode(&raw[header_end..]);
    match reply {
        Entity::Batch(items) => {
            assert_eq!(items.len(), 2);
            assert!(matches!(items[0], Entity::Result { .. }));
            assert!(matches!(items[1], Entity::Error { .. }));
        }
        other => panic!("expected a batch reply, got {other:?}"),
    }
    let _ = encode(&reply);

    drop(stream);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), server_task).await;
}

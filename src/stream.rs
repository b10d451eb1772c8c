//! Framed Entity Stream
//!
//! Design Decision: split reader/writer halves instead of one mutex-guarded stream
//!
//! Rationale: the endpoint has exactly one task reading frames (the reader loop) but many
//! concurrent tasks writing them (every outbound `call`/`notify`, plus the reader loop replying
//! to inbound requests). Guarding a single combined stream with one mutex would let a slow
//! writer block the reader from ever reaching its next `fetch`, or vice versa — a correctness
//! hazard the concurrency model explicitly rules out. Splitting into [`EntityReader`] (owned
//! exclusively by the reader task, no locking needed) and [`EntityWriter`] (shared behind a
//! `tokio::sync::Mutex`, per endpoint) makes the required mutual exclusion a type-level fact
//! instead of a discipline callers have to maintain by hand.
//!
//! Trade-offs:
//! - Two trait objects instead of one: more API surface, but each has a single clear owner
//! - Content-Length framing chosen as the default codec (LSP-style); any other codec satisfying
//!   the same two traits is a drop-in replacement (see Extension Points)
//!
//! Extension Points: a newline-delimited-JSON codec, for transports like the teacher's own
//! stdio-based MCP transport, implements the same two traits without touching the endpoint.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{EndpointError, Result};
use crate::protocol::Entity;
use crate::serializer::{decode, encode};

/// Consumes framed messages from a transport. Owned by exactly one task.
#[async_trait]
pub trait EntityReader: Send {
    /// Read the next entity, or `Ok(None)` at a clean or unrecoverable end of stream.
    async fn fetch(&mut self) -> Result<Option<Entity>>;
}

/// Writes framed messages to a transport. Implementations are cheap to share behind a mutex.
#[async_trait]
pub trait EntityWriter: Send {
    async fn dispatch(&mut self, entity: &Entity) -> Result<()>;

    /// Half-close the write side. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Content-Length framing: `Name: Value\r\n` headers terminated by a blank line, followed by
/// exactly `Content-Length` bytes of body. Mirrors the LSP wire format.
pub struct ContentLengthReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> ContentLengthReader<R> {
    pub fn new(inner: R) -> Self {
        ContentLengthReader { inner: BufReader::new(inner) }
    }
}

#[async_trait]
impl<R: AsyncRead + Send + Unpin> EntityReader for ContentLengthReader<R> {
    async fn fetch(&mut self) -> Result<Option<Entity>> {
        let Some(content_length) = read_headers(&mut self.inner).await? else {
            return Ok(None);
        };

        let mut body = vec![0u8; content_length];
        match tokio::io::AsyncReadExt::read_exact(&mut self.inner, &mut body).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("stream ended mid-frame after headers but before full body");
                return Ok(None);
            }
            Err(e) => return Err(EndpointError::Io(e)),
        }

        Ok(Some(decode(&body)))
    }
}

/// Reads headers up to the blank line and returns the parsed `Content-Length`, or `None` at a
/// clean end of stream / unrecoverable framing failure.
async fn read_headers<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<usize>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None); // clean EOF before any header arrived
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        match trimmed.split_once(':') {
            Some((name, value)) if name.eq_ignore_ascii_case("content-length") => {
                match value.trim().parse::<usize>() {
                    Ok(n) => content_length = Some(n),
                    Err(_) => {
                        tracing::warn!(value = value.trim(), "non-integer Content-Length header");
                        return Ok(None);
                    }
                }
            }
            Some(_) => {
                // unknown header, tolerated and ignored
            }
            None => {
                tracing::debug!(line = trimmed, "header line without a colon, skipped");
            }
        }
    }

    match content_length {
        Some(n) => Ok(Some(n)),
        None => {
            tracing::warn!("message headers had no Content-Length");
            Ok(None)
        }
    }
}

pub struct ContentLengthWriter<W> {
    inner: W,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> ContentLengthWriter<W> {
    pub fn new(inner: W) -> Self {
        ContentLengthWriter { inner, closed: false }
    }
}

#[async_trait]
impl<W: AsyncWrite + Send + Unpin> EntityWriter for ContentLengthWriter<W> {
    async fn dispatch(&mut self, entity: &Entity) -> Result<()> {
        if self.closed {
            return Err(EndpointError::Closed);
        }
        let body = encode(entity);
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.inner.write_all(header.as_bytes()).await?;
        self.inner.write_all(&body).await?;
        self.inner.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.inner.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Id, Params};
    use tokio::io::duplex;

    #[tokio::test]
    async fn round_trips_a_request_through_the_wire() {
        let (client, server) = duplex(4096);
        let (client_read, mut client_write) = tokio::io::split(client);
        let (server_read, _server_write) = tokio::io::split(server);

        let mut writer = ContentLengthWriter::new(&mut client_write);
        let entity = Entity::request(1, "sum", Params::Positional(vec![serde_json::json!(19)]));
        writer.dispatch(&entity).await.unwrap();

        let mut reader = ContentLengthReader::new(server_read);
        let fetched = reader.fetch().await.unwrap().unwrap();
        match fetched {
            Entity::Request { id, method, .. } => {
                assert_eq!(id, Id::Number(1));
                assert_eq!(method, "sum");
            }
            other => panic!("unexpected entity: {other:?}"),
        }
        let _ = client_read;
    }

    #[tokio::test]
    async fn tolerates_unknown_headers_and_headers_without_colon() {
        let (client, server) = duplex(4096);
        let (_client_read, mut client_write) = tokio::io::split(client);
        let (server_read, _server_write) = tokio::io::split(server);

        let body = br#"{"jsonrpc":"2.0","method":"ping"}"#;
        let raw = format!(
            "X-Custom: whatever\r\nheaderwithoutcolon\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        client_write.write_all(raw.as_bytes()).await.unwrap();
        client_write.write_all(body).await.unwrap();
        client_write.flush().await.unwrap();

        let mut reader = ContentLengthReader::new(server_read);
        let fetched = reader.fetch().await.unwrap().unwrap();
        assert!(matches!(fetched, Entity::Notification { .. }));
    }

    #[tokio::test]
    async fn non_integer_content_length_yields_end_of_stream() {
        let (client, server) = duplex(4096);
        let (_client_read, mut client_write) = tokio::io::split(client);
        let (server_read, _server_write) = tokio::io::split(server);

        client_write.write_all(b"Content-Length: hi\r\n\r\n").await.unwrap();
        client_write.flush().await.unwrap();
        drop(client_write);

        let mut reader = ContentLengthReader::new(server_read);
        let fetched = reader.fetch().await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn short_body_before_close_yields_end_of_stream() {
        let (client, server) = duplex(4096);
        let (_client_read, mut client_write) = tokio::io::split(client);
        let (server_read, _server_write) = tokio::io::split(server);

        client_write.write_all(b"Content-Length: 100\r\n\r\n{\"short\":true}").await.unwrap();
        client_write.flush().await.unwrap();
        drop(client_write);

        let mut reader = ContentLengthReader::new(server_read);
        let fetched = reader.fetch().await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn clean_close_with_no_bytes_yields_end_of_stream() {
        let (client, server) = duplex(4096);
        let (_client_read, client_write) = tokio::io::split(client);
        let (server_read, _server_write) = tokio::io::split(server);
        drop(client_write);

        let mut reader = ContentLengthReader::new(server_read);
        let fetched = reader.fetch().await.unwrap();
        assert!(fetched.is_none());
    }
}

// Server-Sent Events plumbing for provider streams
//
// Backends stream `data: {...}` lines. `SseDecoder` turns raw body chunks into
// data payloads and `spawn_fragment_pump` drives a response body on its own
// task, forwarding text fragments to a bounded channel.

use futures::stream::StreamExt;
use tokio::sync::mpsc;

use super::FragmentStream;
use crate::errors::GatewayError;

const CHANNEL_CAPACITY: usize = 100;

/// What a backend-specific parser made of one `data:` payload
#[derive(Debug, Clone, PartialEq)]
pub enum SseAction {
    /// A text fragment to forward
    Text(String),
    /// The backend signalled the end of the stream
    Done,
    /// The backend reported an error inside the stream
    Error(String),
    /// Metadata or keep-alive with nothing to forward
    Skip,
}

/// Incremental `data:` line extractor
///
/// Chunks may split lines anywhere; incomplete lines stay buffered until the
/// next push.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and return the complete `data:` payloads it finished
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        payloads
    }
}

/// Drive `response` on a background task, parsing each payload with `parse`
///
/// The task stops as soon as the receiver is dropped, releasing the backend
/// connection. A body that ends before `SseAction::Done` yields a trailing
/// provider error so callers never mistake a truncated stream for a full one.
pub fn spawn_fragment_pump<F>(
    provider: &'static str,
    response: reqwest::Response,
    parse: F,
) -> FragmentStream
where
    F: Fn(&str) -> SseAction + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        tracing::debug!(provider, "[STREAM] Streaming task started");
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            let chunk = tokio::select! {
                _ = tx.closed() => {
                    tracing::debug!(provider, "[STREAM] Receiver dropped, closing backend stream");
                    return;
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for payload in decoder.push(&bytes) {
                        match parse(&payload) {
                            SseAction::Text(text) => {
                                if tx.send(Ok(text)).await.is_err() {
                                    return;
                                }
                            }
                            SseAction::Done => {
                                tracing::debug!(provider, "[STREAM] Stream complete");
                                return;
                            }
                            SseAction::Error(message) => {
                                tracing::warn!(provider, error = %message, "Backend reported stream error");
                                let _ = tx.send(Err(GatewayError::Provider(message))).await;
                                return;
                            }
                            SseAction::Skip => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(provider, "Stream error: {}", e);
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
                None => {
                    let _ = tx
                        .send(Err(GatewayError::provider(format!(
                            "{} stream ended before completion",
                            provider
                        ))))
                        .await;
                    return;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn parse_plain(payload: &str) -> SseAction {
        match payload {
            "[DONE]" => SseAction::Done,
            text => SseAction::Text(text.to_string()),
        }
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\ndata: {\"a\"").is_empty());
        let payloads = decoder.push(b":1}\n\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn test_decoder_strips_crlf_and_optional_space() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data:x\r\ndata: y\r\n: comment\r\n");
        assert_eq!(payloads, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_decoder_keeps_multibyte_text_across_chunks() {
        let mut decoder = SseDecoder::new();
        let text = "data: héllo\n".as_bytes();
        let (head, tail) = text.split_at(8);
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["héllo".to_string()]);
    }

    #[tokio::test]
    async fn test_dropping_receiver_releases_backend_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Backend sends one event on a chunked body and never finishes it
        let backend = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before sending a request");
                request.extend_from_slice(&buf[..n]);
            }

            let event = "data: Hel\n\n";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
                event.len(),
                event
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();

            // Wait for the client side to hang up
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return true,
                    Ok(_) => {}
                }
            }
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let response = client
            .get(format!("http://{}/stream", addr))
            .send()
            .await
            .unwrap();
        let mut rx = spawn_fragment_pump("test", response, parse_plain);

        assert_eq!(rx.recv().await.unwrap().unwrap(), "Hel");
        drop(rx);

        let closed = tokio::time::timeout(Duration::from_secs(5), backend)
            .await
            .expect("backend connection still open after receiver drop")
            .unwrap();
        assert!(closed);
        drop(client);
    }
}

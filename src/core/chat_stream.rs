use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatRequest;
use crate::core::message::Transcript;
use crate::core::stream_decoder::{StreamDecoder, StreamEvent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Token(String),
    Error(String),
    End,
}

pub type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;
pub type StreamReceiver = mpsc::UnboundedReceiver<(StreamMessage, u64)>;

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub(crate) fn format_api_error(status: Option<u16>, error_text: &str) -> String {
    let prefix = match status {
        Some(code) => format!("Request failed ({code})"),
        None => "Request failed".to_string(),
    };
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return prefix;
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("{prefix}: {summary}");
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{prefix}: {collapsed}")
}

fn send(tx: &StreamSender, message: StreamMessage, stream_id: u64) {
    if tx.send((message, stream_id)).is_err() {
        debug!(stream_id, "stream receiver dropped");
    }
}

/// Feeds a response body through a fresh [`StreamDecoder`] and forwards the
/// resulting messages in arrival order.
///
/// Always finishes with [`StreamMessage::End`] unless cancelled first.
pub async fn pump_stream<S, B, E>(
    body: S,
    tx: &StreamSender,
    stream_id: u64,
    cancel_token: &CancellationToken,
) where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = StreamDecoder::new();

    while let Some(chunk) = body.next().await {
        if cancel_token.is_cancelled() {
            debug!(stream_id, "stream cancelled mid-read");
            return;
        }

        let events = match chunk {
            Ok(bytes) => match decoder.ingest(bytes.as_ref()) {
                Ok(events) => events,
                Err(closed) => {
                    debug!(stream_id, error = %closed, "ignoring bytes after stream end");
                    break;
                }
            },
            Err(err) => vec![decoder.fail(err)],
        };

        for event in events {
            match event {
                StreamEvent::Token(text) => send(tx, StreamMessage::Token(text), stream_id),
                StreamEvent::Done => {
                    send(tx, StreamMessage::End, stream_id);
                    return;
                }
                StreamEvent::Failed(reason) => {
                    warn!(stream_id, error = %reason, "response stream failed");
                    send(tx, StreamMessage::Error(reason), stream_id);
                    send(tx, StreamMessage::End, stream_id);
                    return;
                }
            }
        }
    }

    if decoder.has_pending() {
        debug!(stream_id, "response ended inside an incomplete frame");
    }
    if !decoder.is_finished() {
        debug!(stream_id, "response ended without completion sentinel");
    }
    send(tx, StreamMessage::End, stream_id);
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub transcript: Transcript,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, StreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                endpoint,
                transcript,
                cancel_token,
                stream_id,
            } = params;

            let request = ChatRequest {
                messages: transcript.messages().to_vec(),
            };

            tokio::select! {
                _ = async {
                    debug!(stream_id, %endpoint, messages = request.messages.len(), "sending chat request");
                    match client
                        .post(&endpoint)
                        .header("Content-Type", "application/json")
                        .json(&request)
                        .send()
                        .await
                    {
                        Ok(response) => {
                            let status = response.status();
                            if !status.is_success() {
                                let error_text = response
                                    .text()
                                    .await
                                    .unwrap_or_else(|_| "<no body>".to_string());
                                let formatted_error =
                                    format_api_error(Some(status.as_u16()), &error_text);
                                warn!(stream_id, %status, "chat request rejected");
                                send(&tx_clone, StreamMessage::Error(formatted_error), stream_id);
                                send(&tx_clone, StreamMessage::End, stream_id);
                                return;
                            }

                            pump_stream(response.bytes_stream(), &tx_clone, stream_id, &cancel_token)
                                .await;
                        }
                        Err(e) => {
                            warn!(stream_id, error = %e, "chat request failed");
                            let formatted_error = format_api_error(None, &e.to_string());
                            send(&tx_clone, StreamMessage::Error(formatted_error), stream_id);
                            send(&tx_clone, StreamMessage::End, stream_id);
                        }
                    }
                } => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream task cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        send(&self.tx, message, stream_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ChatMessage;
    use futures_util::stream;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn drain(rx: &mut StreamReceiver) -> Vec<(StreamMessage, u64)> {
        let mut received = Vec::new();
        while let Ok(message) = rx.try_recv() {
            received.push(message);
        }
        received
    }

    fn chunks(parts: &[&'static str]) -> Vec<Result<&'static [u8], String>> {
        parts.iter().map(|part| Ok(part.as_bytes())).collect()
    }

    #[tokio::test]
    async fn pump_forwards_tokens_then_end() {
        let (service, mut rx) = ChatStreamService::new();
        let body = stream::iter(chunks(&[
            "data: Hel",
            "lo\n\ndata:  wor",
            "ld\n",
            "\ndata: [DONE]\n\ndata: ignored\n\n",
        ]));

        pump_stream(body, &service.tx, 3, &CancellationToken::new()).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                (StreamMessage::Token("Hello".into()), 3),
                (StreamMessage::Token(" world".into()), 3),
                (StreamMessage::End, 3),
            ]
        );
    }

    #[tokio::test]
    async fn pump_reports_source_errors_and_keeps_prior_tokens() {
        let (service, mut rx) = ChatStreamService::new();
        let body = stream::iter(vec![
            Ok(&b"data: partial\n\n"[..]),
            Err("connection reset".to_string()),
            Ok(&b"data: unreachable\n\n"[..]),
        ]);

        pump_stream(body, &service.tx, 1, &CancellationToken::new()).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                (StreamMessage::Token("partial".into()), 1),
                (StreamMessage::Error("connection reset".into()), 1),
                (StreamMessage::End, 1),
            ]
        );
    }

    #[tokio::test]
    async fn pump_ends_when_body_closes_without_sentinel() {
        let (service, mut rx) = ChatStreamService::new();
        let body = stream::iter(chunks(&["data: only\n\ndata: trunc"]));

        pump_stream(body, &service.tx, 5, &CancellationToken::new()).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                (StreamMessage::Token("only".into()), 5),
                (StreamMessage::End, 5)
            ]
        );
    }

    #[tokio::test]
    async fn pump_stops_silently_once_cancelled() {
        let (service, mut rx) = ChatStreamService::new();
        let token = CancellationToken::new();
        token.cancel();
        let body = stream::iter(chunks(&["data: never\n\n"]));

        pump_stream(body, &service.tx, 2, &token).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn format_api_error_prefers_json_summary() {
        let raw = r#"{"error":{"message":"model   overloaded","type":"server_error"}}"#;
        assert_eq!(
            format_api_error(Some(503), raw),
            "Request failed (503): model overloaded"
        );
    }

    #[test]
    fn format_api_error_handles_plain_and_empty_bodies() {
        assert_eq!(
            format_api_error(Some(500), "Internal\nServer Error"),
            "Request failed (500): Internal Server Error"
        );
        assert_eq!(format_api_error(None, "   "), "Request failed");
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut request = Vec::new();
        let mut buffer = [0_u8; 4096];
        loop {
            let read = socket.read(&mut buffer).await.expect("read request");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);

            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    #[tokio::test]
    async fn spawn_stream_posts_transcript_and_streams_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
                )
                .await
                .expect("write head");
            for part in ["data: Turkey", " sub\n\ndata: \n", "\ndata: $8\n\ndata: [DONE]\n\n"] {
                socket.write_all(part.as_bytes()).await.expect("write body");
                socket.flush().await.expect("flush");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            request
        });

        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            client: reqwest::Client::new(),
            endpoint: format!("http://{address}/query_chatbot"),
            transcript: Transcript::from(vec![ChatMessage::user("Price of a turkey sub?")]),
            cancel_token: CancellationToken::new(),
            stream_id: 7,
        });

        let mut received = Vec::new();
        while let Some((message, id)) =
            tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.expect("timely message")
        {
            assert_eq!(id, 7);
            let done = message == StreamMessage::End;
            received.push(message);
            if done {
                break;
            }
        }

        assert_eq!(
            received,
            vec![
                StreamMessage::Token("Turkey sub".into()),
                StreamMessage::Token("\n".into()),
                StreamMessage::Token("$8".into()),
                StreamMessage::End,
            ]
        );

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /query_chatbot"));
        assert!(request.contains(r#"{"messages":[{"role":"user","content":"Price of a turkey sub?"}]}"#));
    }

    #[tokio::test]
    async fn spawn_stream_reports_rejected_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            read_request(&mut socket).await;
            let body = r#"{"error":{"message":"bad request"}}"#;
            let response = format!(
                "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
        });

        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            client: reqwest::Client::new(),
            endpoint: format!("http://{address}/query_chatbot"),
            transcript: Transcript::new(),
            cancel_token: CancellationToken::new(),
            stream_id: 1,
        });

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timely message");
        assert_eq!(
            first,
            Some((StreamMessage::Error("Request failed (400): bad request".into()), 1))
        );
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timely message");
        assert_eq!(second, Some((StreamMessage::End, 1)));
    }
}

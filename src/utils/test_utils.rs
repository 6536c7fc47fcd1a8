use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::core::completion::{ClientConfig, CompletionClient, RetryPolicy};
use crate::core::message::Message;
use crate::core::transcript::Transcript;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test-model";

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Read the request but never answer it.
    pub stall: bool,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            stall: false,
        }
    }

    pub fn reply(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": text}]}}
            ]
        });
        Self::new(200, body.to_string())
    }

    pub fn rate_limited() -> Self {
        Self::new(
            429,
            r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#,
        )
    }

    pub fn stall() -> Self {
        Self {
            stall: true,
            ..Self::new(200, "")
        }
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

type CapturedRequests = Arc<Mutex<Vec<CapturedRequest>>>;

/// In-process HTTP server that answers each connection with the next
/// scripted response and records what it received.
pub struct MockServer {
    pub base_url: String,
    requests: CapturedRequests,
    received: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let requests: CapturedRequests = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Notify::new());

        let requests_for_server = Arc::clone(&requests);
        let received_for_server = Arc::clone(&received);
        let task = tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let Ok(captured) = read_http_request(&mut stream).await else {
                    continue;
                };
                requests_for_server.lock().await.push(captured);
                received_for_server.notify_one();

                if response.stall {
                    // Hold the connection open so the client keeps waiting.
                    tokio::spawn(async move {
                        let _stream = stream;
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    });
                } else {
                    let _ = write_http_response(&mut stream, &response).await;
                }
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            received,
            task,
        }
    }

    /// Accepts one request and never answers it.
    pub async fn stalled() -> Self {
        Self::start(vec![MockResponse::stall()]).await
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().await.clone()
    }

    /// Wait until the server has read at least one more request.
    pub async fn wait_for_request(&self) {
        self.received.notified().await;
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(TEST_API_KEY)
            .with_model(TEST_MODEL)
            .with_base_url(self.base_url.clone())
            .with_retry(fast_retry())
    }

    pub fn client(&self) -> CompletionClient {
        CompletionClient::new(self.client_config())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(20),
    }
}

pub fn create_test_transcript() -> Transcript {
    Transcript::from_messages([
        Message::user("Hello"),
        Message::assistant("Hi there!"),
        Message::user("How are you?"),
    ])
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

async fn write_http_response(
    stream: &mut TcpStream,
    response: &MockResponse,
) -> std::io::Result<()> {
    let reason = match response.status {
        200 => "OK",
        400 => "Bad Request",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.body.len(),
        response.body
    );
    stream.write_all(raw.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

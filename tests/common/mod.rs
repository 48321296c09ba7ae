#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use whole_relationship::assessment::data::sample_assessment;
use whole_relationship::config::InsightConfig;
use whole_relationship::dashboard::DashboardView;
use whole_relationship::insight::InsightService;
use whole_relationship::network::http_api::{self, read_request, ApiState};
use whole_relationship::protocol::InsightRequest;

/// A stand-in for the Messages API. Answers each request with the next
/// canned `(status, body)`; the last one repeats once the list runs out.
pub struct FakeUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FakeUpstream {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        Self::launch(responses, Some(Duration::ZERO)).await
    }

    /// Like `start`, but holds every reply for `delay`.
    pub async fn delayed(responses: Vec<(u16, String)>, delay: Duration) -> Self {
        Self::launch(responses, Some(delay)).await
    }

    /// Accepts connections and reads requests but never answers.
    pub async fn hanging() -> Self {
        Self::launch(Vec::new(), None).await
    }

    async fn launch(responses: Vec<(u16, String)>, reply_after: Option<Duration>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let responses = Arc::new(responses);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let responses = Arc::clone(&responses);
                tokio::spawn(async move {
                    if read_request(&mut stream).await.is_err() {
                        return;
                    }
                    let Some(delay) = reply_after else {
                        // keep the connection open until the client gives up
                        let mut sink = [0u8; 64];
                        while let Ok(n) = stream.read(&mut sink).await {
                            if n == 0 {
                                break;
                            }
                        }
                        return;
                    };
                    tokio::time::sleep(delay).await;
                    let (status, body) = responses
                        .get(index)
                        .or_else(|| responses.last())
                        .cloned()
                        .unwrap_or((500, String::new()));
                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn text_reply(text: &str) -> (u16, String) {
    let body = serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
    });
    (200, body.to_string())
}

pub fn insight_config(base_url: &str, api_key: Option<&str>) -> InsightConfig {
    InsightConfig {
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        retry_delay: Duration::from_millis(1),
        ..InsightConfig::default()
    }
}

/// Start the API server on an ephemeral port.
pub async fn spawn_server(config: InsightConfig) -> SocketAddr {
    let assessment = sample_assessment().unwrap();
    let state = Arc::new(ApiState {
        dashboard: DashboardView::build(&assessment).unwrap(),
        generator: Arc::new(InsightService::new(config).unwrap()),
    });
    let listener = http_api::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(http_api::serve(listener, state));
    addr
}

/// Send a raw request and return `(status, body)`.
pub async fn send(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        addr,
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

pub fn insight_body(dimension_id: u32) -> String {
    let assessment = sample_assessment().unwrap();
    let request = InsightRequest {
        dimension: assessment.dimension(dimension_id).unwrap().clone(),
        all_dimensions: assessment.dimensions().to_vec(),
        overall_score: assessment.overall_score(),
    };
    serde_json::to_string(&request).unwrap()
}

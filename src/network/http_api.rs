use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::assessment::validate_dimensions;
use crate::dashboard::DashboardView;
use crate::insight::InsightGenerator;
use crate::protocol::{ErrorResponse, HealthResponse, InsightRequest, InsightResponse};

const MAX_HEADER_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared, read-only state behind every connection.
pub struct ApiState {
    pub dashboard: DashboardView,
    pub generator: Arc<dyn InsightGenerator>,
}

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed request: {0}")]
    Malformed(&'static str),
    #[error("request too large")]
    TooLarge,
}

#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Read one HTTP/1.1 request: request line, headers, and a body of
/// `Content-Length` bytes. Chunked bodies are not supported.
pub async fn read_request<S>(stream: &mut S) -> Result<HttpRequest, RequestError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(RequestError::TooLarge);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Malformed("connection closed before headers ended"));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end])
        .map_err(|_| RequestError::Malformed("headers are not UTF-8"))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or(RequestError::Malformed("missing method"))?
        .to_string();
    let target = parts.next().ok_or(RequestError::Malformed("missing path"))?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| RequestError::Malformed("invalid Content-Length"))?;
            }
        }
    }
    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::TooLarge);
    }

    let mut body = buf.split_off(header_end + 4);
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Malformed("body shorter than Content-Length"));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest { method, path, body })
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self {
                    status: 500,
                    body: r#"{"error":"internal error","unavailable":false}"#.to_string(),
                }
            }
        }
    }

    fn error(status: u16, error: ErrorResponse) -> Self {
        Self::json(status, &error)
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
            Access-Control-Allow-Origin: *\r\n\
            Access-Control-Allow-Methods: POST, GET, OPTIONS\r\n\
            Access-Control-Allow-Headers: Content-Type\r\n\
            Connection: close\r\n",
            self.status,
            self.reason(),
        );
        if self.status != 204 {
            head.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n",
                self.body.len()
            ));
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

// ── Routing ────────────────────────────────────────────────────────

pub async fn route(state: &ApiState, request: &HttpRequest) -> HttpResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => HttpResponse::no_content(),
        ("GET", "/api/health") => HttpResponse::json(
            200,
            &HealthResponse {
                status: "ok".to_string(),
                insights_enabled: state.generator.is_enabled(),
            },
        ),
        ("GET", "/api/assessment") => HttpResponse::json(200, &state.dashboard),
        ("POST", "/api/insight") => handle_insight(state, &request.body).await,
        _ => HttpResponse::error(404, ErrorResponse::invalid("not found")),
    }
}

async fn handle_insight(state: &ApiState, body: &[u8]) -> HttpResponse {
    let request: InsightRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            debug!("Rejected insight request: {}", e);
            return HttpResponse::error(400, ErrorResponse::invalid(format!("invalid request: {}", e)));
        }
    };
    if let Err(e) = validate_dimensions(&request.all_dimensions) {
        debug!("Rejected insight request: {}", e);
        return HttpResponse::error(400, ErrorResponse::invalid(format!("invalid allDimensions: {}", e)));
    }
    if !request.all_dimensions.iter().any(|d| d.id == request.dimension.id) {
        return HttpResponse::error(
            400,
            ErrorResponse::invalid("dimension is not one of allDimensions"),
        );
    }

    match state
        .generator
        .generate(&request.dimension, &request.all_dimensions, request.overall_score)
        .await
    {
        Ok(insight) => HttpResponse::json(200, &InsightResponse { insight }),
        Err(e) => {
            warn!("Insight unavailable for {}: {}", request.dimension.name, e);
            HttpResponse::error(500, ErrorResponse::insight_unavailable())
        }
    }
}

// ── Server ─────────────────────────────────────────────────────────

pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, state: Arc<ApiState>) {
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("HTTP API accept error: {}", e);
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let response = match read_request(&mut stream).await {
                Ok(request) => {
                    debug!("{} {} from {}", request.method, request.path, addr);
                    route(&state, &request).await
                }
                Err(RequestError::Io(e)) => {
                    debug!("Connection from {} dropped: {}", addr, e);
                    return;
                }
                Err(RequestError::TooLarge) => {
                    HttpResponse::error(413, ErrorResponse::invalid("request too large"))
                }
                Err(e) => HttpResponse::error(400, ErrorResponse::invalid(e.to_string())),
            };
            if let Err(e) = stream.write_all(&response.to_bytes()).await {
                debug!("Failed to write response to {}: {}", addr, e);
            }
            let _ = stream.shutdown().await;
        });
    }
}

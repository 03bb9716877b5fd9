use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response};
use tracing::{debug, info, warn};

use crate::brief::{parse_vibes, CreativeBrief};
use crate::errors::{VibeError, VibeResult};
use crate::studio::Studio;
use crate::wire::{ExpandRequest, ExpandResponse, GenerateRequest, GenerateResponse};

const MAX_BODY_BYTES: u64 = 1 << 20;

/// A status code and JSON body, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, format!("failed to encode response: {e}")),
        }
    }

    fn error(status: u16, message: String) -> Self {
        Self { status, body: json!({ "error": message }) }
    }

    fn from_err(action: &str, err: &VibeError) -> Self {
        let message = match err {
            VibeError::Provider(_) => format!("Failed to {action}: {err}"),
            _ => err.to_string(),
        };
        Self::error(err.status_code(), message)
    }
}

/// Dispatches one request. `path` may carry a query string.
pub async fn route(studio: &Studio, method: &Method, path: &str, body: &[u8]) -> Reply {
    let path = path.split('?').next().unwrap_or_default();
    match (method, path) {
        (Method::Post, "/generate") => match generate(studio, body).await {
            Ok(r) => Reply::ok(&r),
            Err(e) => Reply::from_err("generate vibes", &e),
        },
        (Method::Post, "/expand-territory") => match expand(studio, body).await {
            Ok(r) => Reply::ok(&r),
            Err(e) => Reply::from_err("expand territory", &e),
        },
        (Method::Get, "/health") => Reply { status: 200, body: json!({ "status": "ok" }) },
        (_, "/generate" | "/expand-territory" | "/health") => {
            Reply::error(405, format!("method {method} not allowed on {path}"))
        }
        _ => Reply::error(404, format!("no route for {path}")),
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> VibeResult<T> {
    serde_json::from_slice(body).map_err(|e| VibeError::InvalidInput(format!("malformed request body: {e}")))
}

async fn generate(studio: &Studio, body: &[u8]) -> VibeResult<GenerateResponse> {
    let req: GenerateRequest = decode(body)?;
    let kind = req.provider_kind()?;
    let brief = CreativeBrief::new(
        &req.product,
        &req.direction,
        parse_vibes(&req.vibes),
        req.target_audience.as_deref(),
    )?;
    let generated_vibes = studio.generate(brief, kind).await?;
    Ok(GenerateResponse { generated_vibes })
}

async fn expand(studio: &Studio, body: &[u8]) -> VibeResult<ExpandResponse> {
    let req: ExpandRequest = decode(body)?;
    let expanded = studio.expand(req).await?;
    Ok(ExpandResponse {
        expansion: expanded.entry.expansion,
        user_context: expanded.entry.user_context,
    })
}

/// Blocking `tiny_http` accept loop that hands each request to the tokio
/// runtime.
pub struct Server {
    http: Arc<tiny_http::Server>,
    studio: Arc<Studio>,
}

/// Stops a running [`Server`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<tiny_http::Server>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.unblock();
    }
}

impl Server {
    pub fn bind(addr: &str, studio: Arc<Studio>) -> anyhow::Result<Self> {
        let http = tiny_http::Server::http(addr).map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
        Ok(Self { http: Arc::new(http), studio })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.http.clone())
    }

    /// Serves until [`ShutdownHandle::shutdown`] is called.
    pub async fn serve(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || self.run(rt)).await?;
        Ok(())
    }

    fn run(self, rt: tokio::runtime::Handle) {
        if let Some(addr) = self.local_addr() {
            info!(%addr, "listening");
        }
        for mut request in self.http.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();
            let mut body = Vec::new();
            if let Err(e) = request.as_reader().take(MAX_BODY_BYTES).read_to_end(&mut body) {
                warn!(error = %e, %url, "failed to read request body");
                respond(request, Reply::error(400, "unreadable request body".into()));
                continue;
            }
            let studio = self.studio.clone();
            rt.spawn(async move {
                let reply = route(&studio, &method, &url, &body).await;
                debug!(%method, %url, status = reply.status, "request handled");
                respond(request, reply);
            });
        }
        info!("server stopped");
    }
}

fn respond(request: Request, reply: Reply) {
    let mut response = Response::from_string(reply.body.to_string()).with_status_code(reply.status);
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(h);
    }
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to write response");
    }
}

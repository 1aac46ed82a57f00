//! Shared fixtures for unit tests: a scripted reputation source and a
//! throwaway HTTP server on 127.0.0.1.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::models::reputation::ReputationRecord;
use crate::protection::reputation::{LookupError, ReputationSource};

// ---------------------------------------------------------------------------
// StubReputation
// ---------------------------------------------------------------------------

enum Outcome {
    Record(ReputationRecord),
    Fail(fn() -> LookupError),
}

/// Reputation source that always returns the same outcome and records the
/// IPs it was asked about.
pub struct StubReputation {
    outcome: Outcome,
    calls: AtomicUsize,
    last_ip: Mutex<Option<String>>,
}

impl StubReputation {
    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_ip: Mutex::new(None),
        }
    }

    pub fn record(record: ReputationRecord) -> Self {
        Self::with(Outcome::Record(record))
    }

    pub fn json(body: &str) -> Self {
        Self::record(serde_json::from_str(body).expect("valid reputation json"))
    }

    pub fn failing(make: fn() -> LookupError) -> Self {
        Self::with(Outcome::Fail(make))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_ip(&self) -> Option<String> {
        self.last_ip.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReputationSource for StubReputation {
    async fn lookup(&self, ip: &str) -> Result<ReputationRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ip.lock().unwrap() = Some(ip.to_string());
        match &self.outcome {
            Outcome::Record(record) => Ok(record.clone()),
            Outcome::Fail(make) => Err(make()),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// ---------------------------------------------------------------------------
// Test HTTP server
// ---------------------------------------------------------------------------

/// Fixed response served for every request.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

/// What the test server saw.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path_and_query: String,
    pub accept: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct TestServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Accepts connections and never answers, so clients run into their own
/// timeouts. Sockets stay open until the returned handle is aborted.
pub async fn spawn_silent_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    (addr, handle)
}

pub async fn spawn_http_server(canned: CannedResponse) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Arc<Mutex<Vec<SeenRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let canned = Arc::new(canned);

    let seen_task = Arc::clone(&seen);
    let handle = tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let seen = Arc::clone(&seen_task);
            let canned = Arc::clone(&canned);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let seen = Arc::clone(&seen);
                    let canned = Arc::clone(&canned);
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body
                            .collect()
                            .await
                            .map(|c| c.to_bytes())
                            .unwrap_or_default();
                        seen.lock().unwrap().push(SeenRequest {
                            method: parts.method.to_string(),
                            path_and_query: parts
                                .uri
                                .path_and_query()
                                .map(|pq| pq.to_string())
                                .unwrap_or_default(),
                            accept: parts
                                .headers
                                .get("accept")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string),
                            headers: parts.headers.clone(),
                            body,
                        });

                        let resp = Response::builder()
                            .status(canned.status)
                            .header("Content-Type", canned.content_type)
                            .body(Full::new(Bytes::from(canned.body.clone())))
                            .unwrap();
                        Ok::<_, Infallible>(resp)
                    }
                });

                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    TestServer { addr, seen, handle }
}

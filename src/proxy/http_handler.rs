use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, CONNECTION, TRANSFER_ENCODING};
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, error, warn};

use crate::config::settings::Settings;
use crate::models::decision::Decision;
use crate::models::request::IncomingRequest;
use crate::protection::classifier::RequestClassifier;

use super::render;

/// Hop-by-hop headers that are never forwarded to the origin.
const SKIP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "x-forwarded-for",
];

/// Core HTTP request handler.
///
/// For every incoming request the handler:
///
/// 1. Builds an [`IncomingRequest`] from the headers and peer address.
/// 2. Runs the [`RequestClassifier`].
/// 3. Renders a block page or redirect, or forwards the request to the
///    configured origin on pass-through.
pub struct HttpHandler {
    classifier: Arc<RequestClassifier>,
    upstream_client: HyperClient<HttpConnector, Full<Bytes>>,
    upstream_addr: String,
    response_timeout: Duration,
    trust_peer_address: bool,
}

impl HttpHandler {
    pub fn new(classifier: Arc<RequestClassifier>, settings: &Settings) -> Self {
        let upstream_client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(128)
            .build_http();

        Self {
            classifier,
            upstream_client,
            upstream_addr: settings.upstream.address.clone(),
            response_timeout: Duration::from_millis(settings.upstream.response_timeout_ms),
            trust_peer_address: settings.client_ip.trust_peer_address,
        }
    }

    /// Process a single inbound HTTP request end-to-end.
    pub async fn handle<B>(&self, req: Request<B>, peer_ip: IpAddr) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let trusted_ip = self.trust_peer_address.then(|| peer_ip.to_string());
        let incoming = IncomingRequest::from_headers(req.headers(), trusted_ip);

        debug!(
            peer_ip = %peer_ip,
            method = %req.method(),
            path = %req.uri().path(),
            "Incoming request"
        );

        let decision = self.classifier.classify(&incoming).await;

        let rendered = match &decision {
            Decision::Block(reason) => render::block_page(reason.message()),
            Decision::Redirect { location, status } => render::redirect(location, *status),
            Decision::PassThrough => return self.forward_to_origin(req, peer_ip).await,
        };

        match rendered {
            Ok(resp) => resp,
            Err(err) => {
                error!(error = %err, decision = %decision, "Failed to render decision - passing through");
                self.forward_to_origin(req, peer_ip).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Origin forwarding (connection-pooled via hyper client)
    // -----------------------------------------------------------------------

    async fn forward_to_origin<B>(&self, req: Request<B>, peer_ip: IpAddr) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                warn!(peer_ip = %peer_ip, "Failed to read request body: {}", err);
                return render::bad_request();
            }
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = format!("http://{}{}", self.upstream_addr, path_and_query);

        let mut builder = Request::builder().method(parts.method.clone()).uri(&uri);

        for (name, value) in parts.headers.iter() {
            if SKIP_HEADERS.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name, value);
        }

        let forwarded_for = match parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
        {
            Some(existing) if !existing.is_empty() => format!("{}, {}", existing, peer_ip),
            _ => peer_ip.to_string(),
        };
        builder = builder.header("x-forwarded-for", forwarded_for);

        let upstream_req = match builder.body(Full::new(body_bytes)) {
            Ok(r) => r,
            Err(err) => {
                error!("Failed to build upstream request: {}", err);
                return render::bad_gateway();
            }
        };

        let upstream_resp = match tokio::time::timeout(
            self.response_timeout,
            self.upstream_client.request(upstream_req),
        )
        .await
        {
            Ok(Ok(r)) => r,
            Ok(Err(err)) => {
                error!(upstream = %self.upstream_addr, error = %err, "Origin request failed");
                return render::bad_gateway();
            }
            Err(_) => {
                error!(upstream = %self.upstream_addr, "Origin request timed out");
                return render::bad_gateway();
            }
        };

        // Convert Response<Incoming> to Response<Full<Bytes>>
        let (mut parts, incoming_body) = upstream_resp.into_parts();
        let body_bytes = match incoming_body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!("Failed to read origin response body: {}", err);
                return render::bad_gateway();
            }
        };

        // The body is re-framed as a single buffer.
        parts.headers.remove(TRANSFER_ENCODING);
        parts.headers.remove(CONNECTION);
        if let Ok(len) = HeaderValue::from_str(&body_bytes.len().to_string()) {
            parts.headers.insert(hyper::header::CONTENT_LENGTH, len);
        }

        Response::from_parts(parts, Full::new(body_bytes))
    }
}

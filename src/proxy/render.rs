use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};

// ---------------------------------------------------------------------------
// Canned responses
// ---------------------------------------------------------------------------

/// `403 Forbidden` denial page with `message` escaped into the body.
pub fn block_page(message: &str) -> Result<Response<Full<Bytes>>, http::Error> {
    let html = format!(
        r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Access Denied</title>
  <style>
    body{{font-family:Arial,sans-serif;background:#111;color:#eee;display:grid;place-items:center;min-height:100vh}}
    .card{{padding:2rem;background:#1c1c1c;border-radius:12px;max-width:600px}}
    h1{{margin:0 0 1rem}}
    p{{margin:0.25rem 0}}
    code{{background:#333;padding:0.2rem 0.4rem;border-radius:4px}}
  </style>
</head>
<body>
  <div class="card">
    <h1>403 • Access Denied</h1>
    <p>{message}</p>
    <p>If this is unexpected, please try again without VPN/Proxy or from a normal ISP connection.</p>
  </div>
</body>
</html>"##,
        message = escape_html(message),
    );

    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CACHE_CONTROL, "no-store")
        .body(Full::new(Bytes::from(html)))
}

/// Redirect to `location` with the given 3xx status.
pub fn redirect(location: &str, status: u16) -> Result<Response<Full<Bytes>>, http::Error> {
    Response::builder()
        .status(status)
        .header(LOCATION, location)
        .header(CACHE_CONTROL, "no-store")
        .body(Full::new(Bytes::new()))
}

/// Return a `502 Bad Gateway` response.
pub fn bad_gateway() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(
        b"<!DOCTYPE html><html><head><title>502 Bad Gateway</title></head>\
          <body><h1>502 Bad Gateway</h1>\
          <p>The upstream server is not available. Please try again later.</p></body></html>",
    )));
    *resp.status_mut() = StatusCode::BAD_GATEWAY;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

/// Return a `400 Bad Request` response.
pub fn bad_request() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(
        b"<!DOCTYPE html><html><head><title>400 Bad Request</title></head>\
          <body><h1>400 Bad Request</h1>\
          <p>The request body could not be read.</p></body></html>",
    )));
    *resp.status_mut() = StatusCode::BAD_REQUEST;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

/// Escape `&`, `<`, `>` and `"` for HTML text. `&` goes first so entities
/// produced by the later replacements are not escaped twice.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

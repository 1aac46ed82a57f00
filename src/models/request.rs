use std::collections::HashMap;

use http::HeaderMap;

/// Request-scoped view of an inbound request, limited to the signals the
/// classifier reads.
///
/// Header names are stored lowercased; when a header appears more than once
/// the first value wins.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Lowercased header name -> first value.
    headers: HashMap<String, String>,

    /// Client address supplied by the host (TCP peer), when trusted.
    pub trusted_ip: Option<String>,
}

impl IncomingRequest {
    /// Build from a hyper/http header map. Values carrying non-ASCII bytes
    /// are decoded lossily rather than dropped.
    pub fn from_headers(headers: &HeaderMap, trusted_ip: Option<String>) -> Self {
        let mut map = HashMap::with_capacity(headers.keys_len());
        for (name, value) in headers {
            map.entry(name.as_str().to_string())
                .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        Self {
            headers: map,
            trusted_ip,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(v) => Some(v.as_str()),
            None => self
                .headers
                .get(&name.to_ascii_lowercase())
                .map(String::as_str),
        }
    }

    /// Lowercased user-agent, empty when the header is absent.
    pub fn user_agent_lower(&self) -> String {
        self.header("user-agent").unwrap_or("").to_lowercase()
    }
}

#[cfg(test)]
impl IncomingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
        self
    }

    pub fn with_trusted_ip(mut self, ip: &str) -> Self {
        self.trusted_ip = Some(ip.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = IncomingRequest::new().with_header("X-Real-IP", "1.2.3.4");
        assert_eq!(req.header("x-real-ip"), Some("1.2.3.4"));
        assert_eq!(req.header("X-REAL-IP"), Some("1.2.3.4"));
        assert_eq!(req.header("x-forwarded-for"), None);
    }

    #[test]
    fn test_first_value_wins() {
        let mut headers = HeaderMap::new();
        headers.append("x-real-ip", HeaderValue::from_static("1.1.1.1"));
        headers.append("x-real-ip", HeaderValue::from_static("2.2.2.2"));
        let req = IncomingRequest::from_headers(&headers, None);
        assert_eq!(req.header("x-real-ip"), Some("1.1.1.1"));
    }

    #[test]
    fn test_non_ascii_values_are_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "user-agent",
            HeaderValue::from_bytes("curl/8.4.0 (café)".as_bytes()).unwrap(),
        );
        // Latin-1 byte that is not valid UTF-8 on its own.
        headers.insert("x-real-ip", HeaderValue::from_bytes(b"1.2.3.4\xe9").unwrap());

        let req = IncomingRequest::from_headers(&headers, None);
        assert_eq!(req.user_agent_lower(), "curl/8.4.0 (café)");
        assert!(req.header("x-real-ip").unwrap().starts_with("1.2.3.4"));
    }

    #[test]
    fn test_user_agent_lowercased_or_empty() {
        let req = IncomingRequest::new().with_header("User-Agent", "Mozilla/5.0 Googlebot/2.1");
        assert_eq!(req.user_agent_lower(), "mozilla/5.0 googlebot/2.1");
        assert_eq!(IncomingRequest::new().user_agent_lower(), "");
    }
}

use crate::models::request::IncomingRequest;

/// Determine a best-effort client IP string.
///
/// Precedence: host-supplied trusted IP, left-most `X-Forwarded-For`
/// entry, `CF-Connecting-IP`, `X-Real-IP`. Values are trimmed but not
/// validated. A non-empty `X-Forwarded-For` is final: when its left-most
/// entry is blank nothing resolves and later headers are not consulted.
pub fn resolve_client_ip(req: &IncomingRequest) -> Option<String> {
    if let Some(ip) = non_empty(req.trusted_ip.as_deref()) {
        return Some(ip);
    }

    if let Some(xff) = req.header("x-forwarded-for").filter(|v| !v.is_empty()) {
        return non_empty(xff.split(',').next());
    }

    ["cf-connecting-ip", "x-real-ip"]
        .iter()
        .find_map(|name| non_empty(req.header(name)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_ip_wins() {
        let req = IncomingRequest::new()
            .with_trusted_ip("203.0.113.9")
            .with_header("X-Forwarded-For", "9.9.9.9");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_empty_trusted_ip_falls_through() {
        let req = IncomingRequest::new()
            .with_trusted_ip("")
            .with_header("X-Real-IP", "8.8.4.4");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("8.8.4.4"));
    }

    #[test]
    fn test_first_forwarded_for_entry() {
        let req = IncomingRequest::new().with_header("X-Forwarded-For", "9.9.9.9, 10.0.0.1");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("9.9.9.9"));

        let req = IncomingRequest::new().with_header("X-Forwarded-For", "  9.9.9.9  ");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("9.9.9.9"));
    }

    #[test]
    fn test_header_precedence() {
        let req = IncomingRequest::new()
            .with_header("X-Real-IP", "3.3.3.3")
            .with_header("CF-Connecting-IP", "2.2.2.2");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("2.2.2.2"));

        let req = IncomingRequest::new().with_header("X-Real-IP", "3.3.3.3");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("3.3.3.3"));
    }

    #[test]
    fn test_malformed_values_pass_unvalidated() {
        let req = IncomingRequest::new().with_header("X-Forwarded-For", "not-an-ip, 1.1.1.1");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("not-an-ip"));
    }

    #[test]
    fn test_nothing_resolvable() {
        assert_eq!(resolve_client_ip(&IncomingRequest::new()), None);

        let req = IncomingRequest::new()
            .with_header("X-Forwarded-For", "")
            .with_header("X-Real-IP", "");
        assert_eq!(resolve_client_ip(&req), None);
    }

    #[test]
    fn test_blank_first_forwarded_for_entry_stops_resolution() {
        let req = IncomingRequest::new()
            .with_header("X-Forwarded-For", " , 10.0.0.1")
            .with_header("CF-Connecting-IP", "2.2.2.2")
            .with_header("X-Real-IP", "3.3.3.3");
        assert_eq!(resolve_client_ip(&req), None);
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let req = IncomingRequest::new()
            .with_header("X-Forwarded-For", "")
            .with_header("CF-Connecting-IP", "2.2.2.2");
        assert_eq!(resolve_client_ip(&req).as_deref(), Some("2.2.2.2"));
    }
}

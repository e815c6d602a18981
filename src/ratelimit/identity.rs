use axum::http::HeaderMap;

/// Shared bucket for requests that carry no client address.
pub const UNKNOWN_IDENTITY: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Derive the rate-limit identity from proxy headers.
///
/// `X-Forwarded-For` wins over `X-Real-IP`; only its first hop (the
/// original client) is used. Returns `None` when neither header carries
/// an address.
pub fn client_identity(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get(REAL_IP)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded.or_else(real_ip).map(str::to_string)
}

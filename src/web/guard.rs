//! Admission checks run in front of every management route:
//! rate limiting first, then the transport check. Also hosts the layer
//! that picks error verbosity from the deployment mode.

use crate::error::{AppError, AppResult, ErrorDetail};
use crate::web::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Middleware: reject over-quota callers, then plain-HTTP callers in production.
pub async fn admission(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.limiter.admit_request(request.headers())?;
    require_https(request.headers(), state.production)?;
    Ok(next.run(request).await)
}

/// Middleware: show detailed error text outside production.
///
/// Error responses leave the handlers with the generic message; the
/// detail only reaches the client when `state.production` is false.
pub async fn error_verbosity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(detail) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if state.production {
        return response;
    }
    detail.into_response(response.status())
}

/// Production requests must arrive over HTTPS, as reported by the
/// terminating proxy. Everything passes outside production.
pub fn require_https(headers: &HeaderMap, production: bool) -> AppResult<()> {
    if !production {
        return Ok(());
    }

    let proto = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("http");

    if proto.eq_ignore_ascii_case("https") {
        Ok(())
    } else {
        warn!("Rejected management request over {}", proto);
        Err(AppError::InsecureTransport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_proto(proto: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_PROTO, HeaderValue::from_static(proto));
        headers
    }

    #[test]
    fn test_development_allows_anything() {
        assert!(require_https(&HeaderMap::new(), false).is_ok());
        assert!(require_https(&with_proto("http"), false).is_ok());
    }

    #[test]
    fn test_production_requires_https() {
        assert!(require_https(&with_proto("https"), true).is_ok());
        assert!(require_https(&with_proto("https, http"), true).is_ok());
        assert!(matches!(
            require_https(&with_proto("http"), true),
            Err(AppError::InsecureTransport)
        ));
        assert!(matches!(
            require_https(&HeaderMap::new(), true),
            Err(AppError::InsecureTransport)
        ));
    }
}

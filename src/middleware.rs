use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::Request;
use rocket::{Data, Response};
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Request ID that is attached to every request for tracking
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }

    /// Reuses an id handed in by a proxy when it looks like one of ours.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => RequestId(id.to_string()),
            _ => RequestId::new(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Fairing that adds request ID to all requests and logs request/response information
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::from_header(request.headers().get_one(REQUEST_ID_HEADER));

        request.local_cache(|| Some(request_id.clone()));

        info!(
            request_id = %request_id.0,
            method = %request.method(),
            uri = %request.uri(),
            "incoming request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let status = response.status();
        let method = request.method();
        let uri = request.uri();

        response.set_header(Header::new(REQUEST_ID_HEADER, request_id.clone()));

        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));
        response.set_header(Header::new("X-Frame-Options", "DENY"));
        response.set_header(Header::new("Referrer-Policy", "same-origin"));
        response.set_header(Header::new("Cache-Control", "no-store"));

        if status.class().is_server_error() || status.class().is_client_error() {
            warn!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = %status.code,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = %status.code,
                "request completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_creation() {
        let request_id = RequestId::new();
        assert!(Uuid::parse_str(&request_id.0).is_ok());
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new().0, RequestId::default().0);
    }

    #[test]
    fn test_forwarded_request_id_is_kept() {
        let request_id = RequestId::from_header(Some("edge-1234"));
        assert_eq!(request_id.0, "edge-1234");
    }

    #[test]
    fn test_suspicious_request_id_is_replaced() {
        for value in [None, Some(""), Some("id with spaces"), Some("x\nInjected: 1")] {
            let request_id = RequestId::from_header(value);
            assert!(Uuid::parse_str(&request_id.0).is_ok(), "{value:?} should be replaced");
        }

        let too_long = "a".repeat(65);
        assert!(Uuid::parse_str(&RequestId::from_header(Some(&too_long)).0).is_ok());
    }
}

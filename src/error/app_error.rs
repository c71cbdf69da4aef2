use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Internal server error")]
    SessionDecode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Internal server error")]
    InvalidRow(String),
    #[error("Login failed")]
    OAuth(String),
    #[error("Login failed")]
    Upstream {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Login failed")]
    EmailNotAllowed(String),
    #[error("Internal server error")]
    MissingState(&'static str),
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn upstream(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Upstream {
            message: message.into(),
            source,
        }
    }

    pub fn session_decode(source: serde_json::Error) -> Self {
        Self::SessionDecode { source }
    }

    /// Failures of the OAuth exchange all end on the login error page.
    pub fn is_login_failure(&self) -> bool {
        matches!(self, AppError::OAuth(_) | AppError::Upstream { .. } | AppError::EmailNotAllowed(_))
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::SessionDecode { .. } => Status::InternalServerError,
            AppError::InvalidRow(_) => Status::InternalServerError,
            AppError::OAuth(_) => Status::Unauthorized,
            AppError::Upstream { .. } => Status::BadGateway,
            AppError::EmailNotAllowed(_) => Status::Forbidden,
            AppError::MissingState(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        // Extract request context for better error logging
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let user_id = req
            .local_cache(|| None::<crate::auth::CurrentUser>)
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        let status = Status::from(&self);
        if status.class().is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let body = serde_json::json!({ "error": self.to_string() }).to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized"),
            ("404", "Not Found"),
            ("409", "Conflict"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict("Resource already exists".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use rocket::http::Status;

    #[test]
    fn client_errors_keep_their_message() {
        let error = AppError::BadRequest("summary required".to_string());
        assert_eq!(Status::from(&error), Status::BadRequest);
        assert_eq!(error.to_string(), "summary required");

        let error = AppError::NotFound("ticket not found".to_string());
        assert_eq!(Status::from(&error), Status::NotFound);
        assert_eq!(error.to_string(), "ticket not found");
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = AppError::db("Failed to load ticket", sqlx::Error::PoolTimedOut);
        assert_eq!(Status::from(&error), Status::InternalServerError);
        assert_eq!(error.to_string(), "Internal server error");

        let decode = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = AppError::session_decode(decode);
        assert_eq!(error.to_string(), "Internal server error");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn login_failures_are_classified() {
        assert!(AppError::OAuth("missing code".to_string()).is_login_failure());
        assert!(AppError::EmailNotAllowed("eve@example.com".to_string()).is_login_failure());
        assert!(!AppError::Unauthorized.is_login_failure());
    }
}

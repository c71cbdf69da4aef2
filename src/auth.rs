use crate::database::Store;
use crate::database::session::SessionStore;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::user::User;
use rocket::http::{Cookie, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use tracing::warn;

pub const SESSION_COOKIE: &str = "connect.sid";

/// The signed-in user, resolved from the session cookie for the current request only.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

impl CurrentUser {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or(&self.email)
    }
}

pub fn session_cookie(token: String, secure: bool, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(rocket::time::Duration::seconds(ttl_secs))
        .build()
}

/// Builds a cookie matching the one set at login so the browser drops it.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

async fn resolve_user(store: &Store, token: &str) -> Result<Option<User>, AppError> {
    let session = match store.get_session(token).await {
        Ok(Some(session)) => session,
        Ok(None) => return Ok(None),
        Err(AppError::SessionDecode { source }) => {
            warn!(error = %source, "discarding session with malformed payload");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    store.get_user_by_id(session.user_id).await
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(cookie) = req.cookies().get_private(SESSION_COOKIE) else {
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        let Some(store) = req.rocket().state::<Store>() else {
            return Outcome::Error((Status::InternalServerError, AppError::MissingState("store")));
        };

        match resolve_user(store, cookie.value()).await {
            Ok(Some(user)) => {
                let current_user = CurrentUser::from(user);
                req.local_cache(|| Some(current_user.clone()));
                Outcome::Success(current_user)
            }
            Ok(None) => Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Err(err) => Outcome::Error((Status::from(&err), err)),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Session cookie issued after signing in through GET /auth/google.".to_string()),
            data: SecuritySchemeData::ApiKey {
                name: SESSION_COOKIE.to_string(),
                location: "cookie".to_string(),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - Authentication required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}

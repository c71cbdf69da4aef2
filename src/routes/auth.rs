use crate::auth::{SESSION_COOKIE, expired_session_cookie, session_cookie};
use crate::config::Config;
use crate::database::Store;
use crate::routes::page::LOGIN_PATH;
use crate::service::auth::AuthService;
use crate::service::oauth::GoogleOAuth;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::{State, get};
use tracing::{error, warn};

pub const LOGIN_ERROR_PATH: &str = "/login?error=unauthorized";

/// Sends the browser to the provider's consent screen.
#[get("/auth/google")]
pub fn google_login(config: &State<Config>, http: &State<reqwest::Client>) -> Redirect {
    match GoogleOAuth::new(http, &config.oauth).authorization_url() {
        Ok(url) => Redirect::found(url),
        Err(e) => {
            warn!(error = ?e, "cannot start OAuth login");
            Redirect::found(LOGIN_ERROR_PATH)
        }
    }
}

#[get("/auth/google/callback?<code>&<error>")]
pub async fn google_callback(
    code: Option<String>,
    error: Option<String>,
    store: &State<Store>,
    config: &State<Config>,
    http: &State<reqwest::Client>,
    cookies: &CookieJar<'_>,
) -> Redirect {
    if let Some(provider_error) = error {
        warn!(provider_error = %provider_error, "provider refused the login");
        return Redirect::found(LOGIN_ERROR_PATH);
    }

    let service = AuthService {
        store: store.inner(),
        config: config.inner(),
        http: http.inner(),
    };

    match service.complete_login(code.as_deref()).await {
        Ok(outcome) => {
            cookies.add_private(session_cookie(outcome.session_token, config.session.cookie_secure, config.session.ttl_secs));
            Redirect::found("/")
        }
        Err(e) if e.is_login_failure() => {
            warn!(error = ?e, "login rejected");
            Redirect::found(LOGIN_ERROR_PATH)
        }
        Err(e) => {
            error!(error = ?e, "login failed");
            Redirect::found(LOGIN_ERROR_PATH)
        }
    }
}

#[get("/logout")]
pub async fn logout(store: &State<Store>, config: &State<Config>, http: &State<reqwest::Client>, cookies: &CookieJar<'_>) -> Redirect {
    let token = cookies.get_private(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    let service = AuthService {
        store: store.inner(),
        config: config.inner(),
        http: http.inner(),
    };
    service.logout(token.as_deref()).await;

    cookies.remove_private(expired_session_cookie());
    Redirect::found(LOGIN_PATH)
}

pub fn routes() -> Vec<rocket::Route> {
    rocket::routes![google_login, google_callback, logout]
}

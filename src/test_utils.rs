use crate::auth::session_cookie;
use crate::config::{Config, DEFAULT_SESSION_TTL_SECS, DatabaseConfig, OAuthConfig};
use crate::database::Store;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionStore;
use crate::database::sqlite_repository::SqliteRepository;
use crate::database::user::UserRepository;
use crate::db::{connect_postgres, connect_sqlite};
use crate::models::session::SessionData;
use crate::models::ticket::NewTicket;
use crate::models::user::ExternalProfile;
use crate::service::auth::generate_session_token;
use rocket::http::Cookie;
use rocket::local::asynchronous::Client;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory database, no gateway, cookies usable over plain HTTP.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.logging.level = "warn".to_string();
    config.session.secret = "test-session-secret".to_string();
    config.session.cookie_secure = false;
    config.gateway.url = String::new();
    config
}

/// OAuth endpoints pointing at a mock server.
pub fn oauth_config(base_url: &str) -> OAuthConfig {
    OAuthConfig {
        client_id: "client-123".to_string(),
        client_secret: "client-secret".to_string(),
        callback_url: "http://localhost/auth/google/callback".to_string(),
        allowed_emails: String::new(),
        authorize_url: format!("{base_url}/authorize"),
        token_url: format!("{base_url}/token"),
        userinfo_url: format!("{base_url}/userinfo"),
        timeout_secs: 2,
    }
}

pub fn test_config_with_oauth(base_url: &str, allowed_emails: &str) -> Config {
    let mut config = test_config();
    config.oauth = OAuthConfig {
        allowed_emails: allowed_emails.to_string(),
        ..oauth_config(base_url)
    };
    config
}

pub async fn test_client_with(config: Config) -> Client {
    Client::tracked(crate::build_rocket(config)).await.expect("valid rocket instance")
}

pub async fn test_client() -> Client {
    test_client_with(test_config()).await
}

pub async fn sqlite_repository() -> SqliteRepository {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    connect_sqlite(&config).await.expect("in-memory database")
}

/// Only used by tests marked `#[ignore = "requires database"]`.
pub async fn postgres_repository() -> PostgresRepository {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must point at a Postgres database");
    let config = DatabaseConfig {
        url,
        ..DatabaseConfig::default()
    };
    connect_postgres(&config).await.expect("postgres database")
}

pub fn profile(external_id: &str, email: &str) -> ExternalProfile {
    ExternalProfile {
        external_id: external_id.to_string(),
        email: email.to_string(),
        name: None,
        avatar_url: Some(format!("https://avatars.example.com/{external_id}.png")),
    }
}

pub fn new_ticket(summary: &str) -> NewTicket {
    NewTicket {
        summary: summary.to_string(),
        customer_phone: None,
        order_number: None,
        external_id: None,
    }
}

/// Token and userinfo endpoints for a provider that accepts any code.
pub async fn mock_google(server: &MockServer, sub: &str, email: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "at-123", "token_type": "Bearer"})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sub": sub, "email": email, "name": "Test User"})))
        .mount(server)
        .await;
}

pub struct TestSession {
    pub user_id: i64,
    pub token: String,
    pub store: Store,
}

impl TestSession {
    pub fn cookie(&self) -> Cookie<'static> {
        session_cookie(self.token.clone(), false, DEFAULT_SESSION_TTL_SECS)
    }
}

/// Creates the user and a live session directly in the client's store.
pub async fn sign_in(client: &Client, external_id: &str, email: &str) -> TestSession {
    let store = client.rocket().state::<Store>().expect("store is managed").clone();
    let user = store.get_or_create_user(&profile(external_id, email)).await.expect("user created");

    let token = generate_session_token();
    store
        .set_session(&token, &SessionData { user_id: user.id }, DEFAULT_SESSION_TTL_SECS)
        .await
        .expect("session stored");

    TestSession {
        user_id: user.id,
        token,
        store,
    }
}

use base64::{Engine as _, engine::general_purpose};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Seven days, the lifetime of a login session.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
    pub gateway: GatewayConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:` URLs select the local file backend, anything else is treated as Postgres.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    /// Comma-separated, case-insensitive. Empty allows every authenticated account.
    pub allowed_emails: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_secure: bool,
    pub ttl_secs: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub enable_swagger: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/team-dashboard.db".to_string(),
            max_connections: 16,
            min_connections: 1,
            acquire_timeout: 5,
            run_migrations: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3851,
            address: "0.0.0.0".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
            allowed_emails: String::new(),
            authorize_url: GOOGLE_AUTHORIZE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_secure: true,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3850".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { enable_swagger: true }
    }
}

impl OAuthConfig {
    /// Client id and redirect URI are enough to send the user to the provider.
    pub fn can_initiate(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.callback_url.trim().is_empty()
    }

    /// Completing the exchange additionally needs the client secret.
    pub fn can_exchange(&self) -> bool {
        self.can_initiate() && !self.client_secret.trim().is_empty()
    }

    pub fn allowed_email_list(&self) -> Vec<String> {
        self.allowed_emails
            .split(',')
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect()
    }

    pub fn is_email_allowed(&self, email: Option<&str>) -> bool {
        let allowed = self.allowed_email_list();
        if allowed.is_empty() {
            return true;
        }

        let candidate = email.unwrap_or_default().trim().to_lowercase();
        allowed.iter().any(|entry| *entry == candidate)
    }
}

impl SessionConfig {
    /// Rocket's private cookies need 256 bits of key material; the configured
    /// secret is stretched through SHA-256 and handed over base64-encoded.
    pub fn rocket_secret_key(&self) -> Option<String> {
        if self.secret.is_empty() {
            return None;
        }

        let digest = Sha256::digest(self.secret.as_bytes());
        Some(general_purpose::STANDARD.encode(digest))
    }
}

fn legacy_env(name: &'static str, key: &'static str) -> Env {
    Env::raw().only(&[name]).map(move |_| key.into())
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Dashboard.toml (base configuration file)
    /// 3. Environment variables prefixed with DASHBOARD_ (e.g. DASHBOARD_OAUTH__CLIENT_ID)
    /// 4. The unprefixed variable names older deployments were configured with
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("Dashboard.toml").nested())
            .merge(Env::prefixed("DASHBOARD_").split("__"))
            .merge(legacy_env("DATABASE_URL", "database.url"))
            .merge(legacy_env("PORT", "server.port"))
            .merge(legacy_env("GOOGLE_CLIENT_ID", "oauth.client_id"))
            .merge(legacy_env("GOOGLE_CLIENT_SECRET", "oauth.client_secret"))
            .merge(legacy_env("GOOGLE_CALLBACK_URL", "oauth.callback_url"))
            .merge(legacy_env("ALLOWED_GOOGLE_EMAILS", "oauth.allowed_emails"))
            .merge(legacy_env("SESSION_SECRET", "session.secret"))
            .merge(legacy_env("OPENCLAW_DASHBOARD_URL", "gateway.url"))
    }
}

use crate::Config;
use crate::database::Store;
use crate::database::session::SessionStore;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::session::SessionData;
use crate::service::oauth::GoogleOAuth;
use rand::RngCore;
use tracing::{info, warn};

/// A freshly signed-in user and the session token to hand back in the cookie.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user_id: i64,
    pub session_token: String,
}

pub struct AuthService<'a> {
    pub store: &'a Store,
    pub config: &'a Config,
    pub http: &'a reqwest::Client,
}

/// 256 bits of randomness, hex encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl<'a> AuthService<'a> {
    pub fn oauth(&self) -> GoogleOAuth<'_> {
        GoogleOAuth::new(self.http, &self.config.oauth)
    }

    /// Runs the callback half of the login: code exchange, profile lookup,
    /// allow-list check, user upsert and session creation. Nothing is written
    /// unless every provider step succeeded and the email is allowed.
    pub async fn complete_login(&self, code: Option<&str>) -> Result<LoginOutcome, AppError> {
        if !self.config.oauth.can_exchange() {
            return Err(AppError::OAuth("OAuth client is not fully configured".to_string()));
        }

        let code = code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::OAuth("missing authorization code".to_string()))?;

        let oauth = self.oauth();
        let access_token = oauth.exchange_code(code).await?;
        let profile = oauth.fetch_profile(&access_token).await?;

        if !self.config.oauth.is_email_allowed(Some(&profile.email)) {
            return Err(AppError::EmailNotAllowed(profile.email));
        }

        let user = self.store.get_or_create_user(&profile).await?;
        let session_token = generate_session_token();
        self.store
            .set_session(&session_token, &SessionData { user_id: user.id }, self.config.session.ttl_secs)
            .await?;

        info!(user_id = user.id, "user signed in");

        Ok(LoginOutcome {
            user_id: user.id,
            session_token,
        })
    }

    /// Logging out never fails from the caller's point of view.
    pub async fn logout(&self, session_token: Option<&str>) {
        let Some(token) = session_token else {
            return;
        };

        if let Err(e) = self.store.destroy_session(token).await {
            warn!(error = ?e, "failed to destroy session on logout");
        }
    }
}

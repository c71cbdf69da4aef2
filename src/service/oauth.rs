use crate::config::OAuthConfig;
use crate::error::app_error::AppError;
use crate::models::user::ExternalProfile;
use serde::Deserialize;
use std::time::Duration;

const SCOPE: &str = "openid profile email";

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl UserInfo {
    fn into_profile(self) -> Result<ExternalProfile, AppError> {
        let email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::OAuth("profile has no email address".to_string()))?;
        let name = self.name.filter(|name| !name.trim().is_empty()).unwrap_or_else(|| email.clone());

        Ok(ExternalProfile {
            external_id: self.sub,
            email,
            name: Some(name),
            avatar_url: self.picture.filter(|url| !url.is_empty()),
        })
    }
}

/// Authorization-code flow against Google (or any provider with the same endpoints).
pub struct GoogleOAuth<'a> {
    http: &'a reqwest::Client,
    config: &'a OAuthConfig,
}

impl<'a> GoogleOAuth<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a OAuthConfig) -> Self {
        Self { http, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    pub fn authorization_url(&self) -> Result<String, AppError> {
        if !self.config.can_initiate() {
            return Err(AppError::OAuth("client id or callback URL missing".to_string()));
        }

        Ok(format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}",
            self.config.authorize_url,
            urlencoding::encode(self.config.client_id.trim()),
            urlencoding::encode(self.config.callback_url.trim()),
            urlencoding::encode(SCOPE),
        ))
    }

    /// Trades the authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.trim()),
            ("client_secret", self.config.client_secret.trim()),
            ("redirect_uri", self.config.callback_url.trim()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .timeout(self.timeout())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::upstream("token request failed", e))?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!("token endpoint returned {}", response.status())));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::upstream("token response unreadable", e))?;

        Ok(token.access_token)
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AppError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .timeout(self.timeout())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream("userinfo request failed", e))?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!("userinfo endpoint returned {}", response.status())));
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| AppError::upstream("userinfo response unreadable", e))?;

        info.into_profile()
    }
}

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::client::{DEFAULT_API_TIMEOUT, api_http};

const DEFAULT_BASE_URL: &str = "https://www.seedr.cc";
const DEFAULT_CLIENT_ID: &str = "seedr_chrome";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("login rejected with {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("login response carried no access token")]
    MissingToken,
    #[error("client setup failed: {0}")]
    Client(#[from] crate::SeedrError),
}

#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    base_url: Url,
    client_id: String,
}

impl AuthClient {
    pub fn new() -> Result<Self, AuthError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AuthError> {
        Ok(Self {
            http: api_http(DEFAULT_API_TIMEOUT)?,
            base_url: Url::parse(base_url)?,
            client_id: DEFAULT_CLIENT_ID.to_string(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AuthError> {
        self.http = api_http(timeout)?;
        Ok(self)
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Exchanges account credentials for an access token (password grant).
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken, AuthError> {
        let url = self.base_url.join("/oauth_test/token.php")?;
        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("type", "login"),
            ("username", username),
            ("password", password),
        ];

        let response = self.http.post(url).form(&form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api { status, body });
        }
        let token: TokenResponse = response.json().await?;
        match token.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(AccessToken {
                access_token,
                token_type: token.token_type,
                expires_in: token.expires_in,
                refresh_token: token.refresh_token,
            }),
            _ => Err(AuthError::MissingToken),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

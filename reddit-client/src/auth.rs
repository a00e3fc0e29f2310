use oauth2::basic::{BasicClient, BasicErrorResponseType};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, RequestTokenError, StandardErrorResponse, TokenResponse,
    TokenUrl,
};
use reqwest::header::{HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};
use subweave_core::{ConfigError, CoreError, RedditApiError, RedditCredentials};
use tokio::sync::Mutex;
use tracing::{debug, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are replaced this long before they would expire.
const TOKEN_REFRESH_WINDOW: Duration = Duration::from_secs(60);
/// Applied when the token response omits `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

type TokenRequestError = RequestTokenError<
    oauth2::reqwest::Error<reqwest::Error>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

/// Application-only OAuth2 settings for the client-credentials grant.
#[derive(Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }

    pub fn from_credentials(credentials: &RedditCredentials) -> Self {
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.user_agent.clone(),
        )
    }
}

impl fmt::Debug for RedditOAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditOAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Observable authentication state of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { expires_at: SystemTime },
    TokenExpired { expired_at: SystemTime },
}

/// An application-only access token and its validity window.
#[derive(Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    pub fn needs_refresh(&self) -> bool {
        SystemTime::now() + TOKEN_REFRESH_WINDOW >= self.expires_at
    }
}

impl fmt::Debug for RedditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditToken")
            .field("access_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Exchanges application credentials for access tokens and keeps the
/// current token fresh.
pub struct RedditAuthenticator {
    oauth: BasicClient,
    user_agent: HeaderValue,
    token: Mutex<Option<RedditToken>>,
}

impl RedditAuthenticator {
    pub fn new(config: &RedditOAuth2Config) -> Result<Self, CoreError> {
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|_| {
            CoreError::Config(ConfigError::InvalidValue {
                field: "REDDIT_USER_AGENT".to_string(),
                value: config.user_agent.clone(),
            })
        })?;

        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|error| {
            CoreError::Internal {
                message: format!("invalid authorization URL: {error}"),
            }
        })?;
        let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|error| {
            CoreError::Internal {
                message: format!("invalid token URL: {error}"),
            }
        })?;

        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth,
            user_agent,
            token: Mutex::new(None),
        })
    }

    /// Perform the client-credentials exchange and store the new token.
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        let token = self.exchange_token().await?;
        *self.token.lock().await = Some(token);
        Ok(())
    }

    /// Return a fresh access token, re-exchanging credentials when the
    /// stored token is missing or close to expiry.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
            debug!("access token within refresh window, re-exchanging credentials");
        }

        let token = self.exchange_token().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    pub async fn is_authenticated(&self) -> bool {
        match self.token.lock().await.as_ref() {
            Some(token) => !token.is_expired(),
            None => false,
        }
    }

    pub async fn needs_refresh(&self) -> bool {
        match self.token.lock().await.as_ref() {
            Some(token) => token.needs_refresh(),
            None => false,
        }
    }

    pub async fn auth_state(&self) -> AuthState {
        match self.token.lock().await.as_ref() {
            None => AuthState::NotAuthenticated,
            Some(token) if token.is_expired() => AuthState::TokenExpired {
                expired_at: token.expires_at,
            },
            Some(token) => AuthState::Authenticated {
                expires_at: token.expires_at,
            },
        }
    }

    pub async fn set_token(&self, token: RedditToken) {
        *self.token.lock().await = Some(token);
    }

    async fn exchange_token(&self) -> Result<RedditToken, CoreError> {
        debug!("requesting application-only token from Reddit");
        let user_agent = self.user_agent.clone();

        let response = self
            .oauth
            .exchange_client_credentials()
            .request_async(move |mut request| {
                // Reddit rejects token requests without a descriptive user agent.
                request.headers.insert(USER_AGENT, user_agent);
                async_http_client(request)
            })
            .await
            .map_err(map_token_error)?;

        let expires_in = response.expires_in().unwrap_or(DEFAULT_TOKEN_TTL);
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_default();

        info!(
            "obtained application-only token, valid for {}s",
            expires_in.as_secs()
        );

        Ok(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
            scope,
        })
    }
}

fn map_token_error(error: TokenRequestError) -> CoreError {
    match error {
        RequestTokenError::ServerResponse(response) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: response.error().to_string(),
            })
        }
        RequestTokenError::Request(source) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("token endpoint unreachable: {source}"),
            })
        }
        RequestTokenError::Parse(_, body) if body_reports_unauthorized(&body) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "invalid client credentials".to_string(),
            })
        }
        RequestTokenError::Parse(source, _) => {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("token response did not decode: {source}"),
            })
        }
        RequestTokenError::Other(message) => {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason: message })
        }
    }
}

// Bad basic-auth credentials produce `{"message": "Unauthorized", "error": 401}`,
// which is not a standard OAuth error body and surfaces as a parse failure.
fn body_reports_unauthorized(body: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(serde_json::Value::as_u64))
        == Some(401)
}

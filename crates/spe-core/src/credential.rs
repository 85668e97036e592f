//! Bearer-token providers for Microsoft Graph.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    config::{Config, ConfigError, CredentialSource},
    graph::GraphError,
};

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// A bearer token and the instant it stops being valid.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether the token is usable at `now` with the refresh margin applied.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now + REFRESH_MARGIN
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies a bearer token for each Graph request.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token valid for at least the refresh margin.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Authentication`] when a token cannot be obtained.
    async fn token(&self) -> Result<AccessToken, GraphError>;
}

/// A fixed, operator-supplied token. It is never refreshed.
pub struct StaticTokenCredential {
    secret: String,
}

impl StaticTokenCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken, GraphError> {
        // Far enough out that it always counts as fresh.
        let expires_at = Instant::now() + REFRESH_MARGIN + Duration::from_secs(3600);
        Ok(AccessToken::new(self.secret.clone(), expires_at))
    }
}

/// OAuth2 client-credentials flow against Azure AD, with an in-process
/// token cache.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

impl ClientSecretCredential {
    pub fn new(
        http: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/'),
                urlencoding::encode(tenant_id)
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> Result<AccessToken, GraphError> {
        debug!(token_url = %self.token_url, "Requesting Graph access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let requested_at = Instant::now();
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GraphError::Authentication(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|err| err.error_description.or(err.error))
                .unwrap_or(body);
            return Err(GraphError::Authentication(format!(
                "token endpoint returned {status}: {detail}"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GraphError::Authentication(format!("invalid token response: {e}")))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));

        info!(expires_in_secs = lifetime.as_secs(), "Acquired Graph access token");
        Ok(AccessToken::new(token.access_token, requested_at + lifetime))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<AccessToken, GraphError> {
        // Held across the request so concurrent callers share one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Builds the credential described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredentials`] when the Azure AD settings are
/// incomplete.
pub fn credential_from_config(
    config: &Config,
    http: reqwest::Client,
) -> Result<Arc<dyn TokenCredential>, ConfigError> {
    let credential: Arc<dyn TokenCredential> = match config.azure_ad.credential_source()? {
        CredentialSource::AccessToken(token) => Arc::new(StaticTokenCredential::new(token)),
        CredentialSource::ClientSecret {
            authority_host,
            tenant_id,
            client_id,
            client_secret,
        } => Arc::new(ClientSecretCredential::new(
            http,
            &authority_host,
            &tenant_id,
            client_id,
            client_secret,
            config.graph.scope.clone(),
        )),
    };
    Ok(credential)
}

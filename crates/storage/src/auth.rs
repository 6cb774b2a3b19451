//! OAuth2 access tokens for the Sheets API.
//!
//! Two ways in: an inline credential JSON (the contents of a downloaded key
//! file, usually passed through `GOOGLE_CREDENTIALS`), or ambient discovery
//! following the usual application-default order: `GOOGLE_APPLICATION_CREDENTIALS`,
//! then gcloud's well-known file, then the GCE metadata server.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialStrategy {
    /// A credential JSON document given directly
    Inline(String),
    /// Application-default discovery
    Ambient,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credentials are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read credentials file {path}: {source}")]
    File { path: PathBuf, source: std::io::Error },
    #[error("signing the token assertion failed: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint answered {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// A key file, as downloaded from the cloud console or written by gcloud.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl Credentials {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|source| AuthError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ServiceAccountKey {
    /// RS256-signed JWT for the jwt-bearer grant.
    pub fn assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Picks the key file ambient discovery would use, if any.
///
/// A non-empty `env_path` wins even when the file does not exist; reading it
/// then fails loudly.
pub fn discover_credentials_path(env_path: Option<PathBuf>, well_known: Option<PathBuf>) -> Option<PathBuf> {
    env_path
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| well_known.filter(|p| p.is_file()))
}

/// gcloud's `application_default_credentials.json` location.
pub fn well_known_credentials_file() -> Option<PathBuf> {
    #[cfg(windows)]
    let base = dirs::config_dir();
    #[cfg(not(windows))]
    let base = dirs::home_dir().map(|h| h.join(".config"));

    base.map(|dir| dir.join("gcloud").join("application_default_credentials.json"))
}

/// Hands out bearer tokens, refreshing shortly before they expire.
pub struct Authenticator {
    http: Client,
    strategy: CredentialStrategy,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl Authenticator {
    pub fn new(http: Client, strategy: CredentialStrategy) -> Self {
        Self {
            http,
            strategy,
            scope: SHEETS_SCOPE.to_string(),
            cache: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let response = self.fetch().await?;
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(3600));
        *cache = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(response.access_token)
    }

    async fn fetch(&self) -> Result<TokenResponse, AuthError> {
        match &self.strategy {
            CredentialStrategy::Inline(json) => {
                debug!("using inline credentials");
                self.exchange(&Credentials::from_json(json)?).await
            }
            CredentialStrategy::Ambient => {
                let env_path = std::env::var_os(CREDENTIALS_ENV).map(PathBuf::from);
                match discover_credentials_path(env_path, well_known_credentials_file()) {
                    Some(path) => {
                        info!(path = %path.display(), "using credentials file");
                        self.exchange(&Credentials::from_file(&path).await?).await
                    }
                    None => {
                        info!("no credentials file found, asking the metadata server");
                        self.metadata_token().await
                    }
                }
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        let request = match credentials {
            Credentials::ServiceAccount(key) => {
                debug!(account = %key.client_email, "jwt-bearer grant");
                let assertion = key.assertion(&self.scope, Utc::now())?;
                self.http
                    .post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            }
            Credentials::AuthorizedUser(user) => {
                debug!("refresh-token grant");
                self.http.post(GOOGLE_TOKEN_URI).form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", user.client_id.as_str()),
                    ("client_secret", user.client_secret.as_str()),
                    ("refresh_token", user.refresh_token.as_str()),
                ])
            }
        };

        read_token(request.send().await?).await
    }

    async fn metadata_token(&self) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", self.scope.as_str())])
            .send()
            .await?;
        read_token(response).await
    }
}

async fn read_token(response: reqwest::Response) -> Result<TokenResponse, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected { status, body });
    }
    Ok(response.json::<TokenResponse>().await?)
}

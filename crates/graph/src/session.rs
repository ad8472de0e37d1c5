//! Session providers and the permission scope gate.
//!
//! Sign-in itself is delegated to the identity platform; a session only has
//! to hand out bearer tokens, report which permissions they carry and try to
//! obtain missing ones.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::token::decode_access_token;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::GraphError;

/// Scope requested for app-only Graph tokens.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Clock skew tolerated when checking token expiry.
const TOKEN_LEEWAY_SECS: u64 = 60;

/// Source of Graph bearer tokens.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// A currently valid bearer token.
    async fn access_token(&self) -> Result<String, GraphError>;

    /// Permission scopes carried by the current token.
    async fn granted_scopes(&self) -> Result<Vec<String>, GraphError>;

    /// Attempts to obtain a token carrying `scopes`.
    async fn reauthenticate(&self, scopes: &[&str]) -> Result<(), GraphError>;
}

/// Required scopes absent from `granted`, compared case-insensitively.
pub fn missing_scopes(granted: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|scope| !granted.iter().any(|g| g.eq_ignore_ascii_case(scope)))
        .map(|scope| scope.to_string())
        .collect()
}

/// Makes sure the session holds every scope in `required`.
///
/// Missing scopes trigger one re-authentication requesting all of
/// `required`. Scopes still missing afterwards fail with
/// [`GraphError::MissingScopes`]; a failed re-authentication propagates as is.
pub async fn ensure_scopes(
    session: &dyn SessionProvider,
    required: &[&str],
) -> Result<(), GraphError> {
    let granted = session.granted_scopes().await?;
    let missing = missing_scopes(&granted, required);
    if missing.is_empty() {
        return Ok(());
    }

    warn!(
        missing = %missing.join(", "),
        "Session lacks required scopes, re-authenticating"
    );
    session.reauthenticate(required).await?;

    let granted = session.granted_scopes().await?;
    let missing = missing_scopes(&granted, required);
    if missing.is_empty() {
        info!("Required scopes granted after re-authentication");
        Ok(())
    } else {
        Err(GraphError::MissingScopes(missing))
    }
}

/// Scopes carried by `token`, logging who it was issued to and until when.
fn token_scopes(token: &str) -> Result<Vec<String>, GraphError> {
    let claims = decode_access_token(token, TOKEN_LEEWAY_SECS)?;
    debug!(
        app_only = claims.is_app_only(),
        expires_at = ?claims.expires_at(),
        "Inspected access token"
    );
    Ok(claims.scopes())
}

// ============================================================================
// Static token
// ============================================================================

/// A bearer token acquired outside this process (e.g. by the Azure CLI).
pub struct StaticTokenSession {
    token: String,
}

impl StaticTokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenSession")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl SessionProvider for StaticTokenSession {
    async fn access_token(&self) -> Result<String, GraphError> {
        decode_access_token(&self.token, TOKEN_LEEWAY_SECS)?;
        Ok(self.token.clone())
    }

    async fn granted_scopes(&self) -> Result<Vec<String>, GraphError> {
        token_scopes(&self.token)
    }

    async fn reauthenticate(&self, scopes: &[&str]) -> Result<(), GraphError> {
        Err(GraphError::Authentication(format!(
            "a static access token cannot be re-issued; acquire one with scopes: {}",
            scopes.join(", ")
        )))
    }
}

// ============================================================================
// Client credentials
// ============================================================================

/// App registration used for the OAuth2 client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Identity platform authority, e.g. `https://login.microsoftonline.com`
    pub authority_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("authority_url", &self.authority_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientCredentials {
    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

/// Cached access token with expiry tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Identity platform token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[allow(dead_code)]
    token_type: String,
}

/// Identity platform error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// App-only session using the OAuth2 client-credentials grant.
pub struct ClientCredentialsSession {
    client: Client,
    credentials: ClientCredentials,
    token_cache: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsSession {
    pub fn new(credentials: ClientCredentials, timeout: Duration) -> Result<Self, GraphError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
            token_cache: RwLock::new(None),
        })
    }

    /// Requests a new token from the identity platform.
    async fn fetch_access_token(&self) -> Result<CachedToken, GraphError> {
        debug!(tenant_id = %self.credentials.tenant_id, "Requesting client-credentials token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_DEFAULT_SCOPE),
        ];

        let response = self
            .client
            .post(self.credentials.token_url())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("HTTP {}: {}", status, body),
            };
            return Err(GraphError::Authentication(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Authentication(format!("Invalid token response: {}", e)))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl SessionProvider for ClientCredentialsSession {
    async fn access_token(&self) -> Result<String, GraphError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(ref token) = *cache {
                // Return cached token if still valid (with 60s buffer)
                if token.expires_at > Instant::now() + Duration::from_secs(TOKEN_LEEWAY_SECS) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let token = self.fetch_access_token().await?;
        let access_token = token.access_token.clone();
        *self.token_cache.write().await = Some(token);
        Ok(access_token)
    }

    async fn granted_scopes(&self) -> Result<Vec<String>, GraphError> {
        let token = self.access_token().await?;
        token_scopes(&token)
    }

    async fn reauthenticate(&self, scopes: &[&str]) -> Result<(), GraphError> {
        info!(
            scopes = %scopes.join(", "),
            "Requesting a fresh client-credentials token"
        );
        let token = self.fetch_access_token().await?;
        *self.token_cache.write().await = Some(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Session whose granted scopes change after each re-authentication.
    struct ScriptedSession {
        grants: Mutex<Vec<Vec<String>>>,
        reauth_calls: AtomicUsize,
        reauth_fails: bool,
    }

    impl ScriptedSession {
        fn new(grants: Vec<Vec<&str>>, reauth_fails: bool) -> Self {
            Self {
                grants: Mutex::new(
                    grants
                        .into_iter()
                        .map(|g| g.into_iter().map(str::to_string).collect())
                        .collect(),
                ),
                reauth_calls: AtomicUsize::new(0),
                reauth_fails,
            }
        }
    }

    #[async_trait]
    impl SessionProvider for ScriptedSession {
        async fn access_token(&self) -> Result<String, GraphError> {
            Ok("token".to_string())
        }

        async fn granted_scopes(&self) -> Result<Vec<String>, GraphError> {
            let grants = self.grants.lock().unwrap();
            let index = self.reauth_calls.load(Ordering::SeqCst).min(grants.len() - 1);
            Ok(grants[index].clone())
        }

        async fn reauthenticate(&self, _scopes: &[&str]) -> Result<(), GraphError> {
            self.reauth_calls.fetch_add(1, Ordering::SeqCst);
            if self.reauth_fails {
                Err(GraphError::Authentication("consent declined".to_string()))
            } else {
                Ok(())
            }
        }
    }

    const REQUIRED: [&str; 2] = ["TeamworkDevice.Read.All", "User.Read.All"];

    #[test]
    fn test_missing_scopes_case_insensitive() {
        let granted = vec!["teamworkdevice.read.all".to_string()];
        assert_eq!(missing_scopes(&granted, &REQUIRED), vec!["User.Read.All"]);
        assert!(missing_scopes(&[], &[]).is_empty());
    }

    #[tokio::test]
    async fn test_scopes_present_no_reauth() {
        let session = ScriptedSession::new(vec![REQUIRED.to_vec()], false);
        ensure_scopes(&session, &REQUIRED).await.unwrap();
        assert_eq!(session.reauth_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reauth_grants_missing_scopes() {
        let session = ScriptedSession::new(vec![vec!["User.Read.All"], REQUIRED.to_vec()], false);
        ensure_scopes(&session, &REQUIRED).await.unwrap();
        assert_eq!(session.reauth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_still_missing_after_reauth() {
        let session = ScriptedSession::new(vec![vec![], vec!["User.Read.All"]], false);
        let result = ensure_scopes(&session, &REQUIRED).await;
        match result {
            Err(GraphError::MissingScopes(missing)) => {
                assert_eq!(missing, vec!["TeamworkDevice.Read.All"])
            }
            other => panic!("Expected MissingScopes, got {:?}", other),
        }
        assert_eq!(session.reauth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reauth_failure_propagates() {
        let session = ScriptedSession::new(vec![vec![]], true);
        let result = ensure_scopes(&session, &REQUIRED).await;
        assert!(matches!(result, Err(GraphError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_static_session_cannot_reauthenticate() {
        let session = StaticTokenSession::new("abc");
        let result = session.reauthenticate(&REQUIRED).await;
        match result {
            Err(GraphError::Authentication(msg)) => assert!(msg.contains("User.Read.All")),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_session_reads_application_roles() {
        let exp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({ "exp": exp, "roles": ["TeamworkDevice.Read.All", "User.Read.All"] }),
            &jsonwebtoken::EncodingKey::from_secret(b"session-tests"),
        )
        .unwrap();

        let session = StaticTokenSession::new(token);
        assert_eq!(session.granted_scopes().await.unwrap(), REQUIRED.to_vec());
        ensure_scopes(&session, &REQUIRED).await.unwrap();
    }

    #[tokio::test]
    async fn test_static_session_rejects_malformed_token() {
        let session = StaticTokenSession::new("not-a-jwt");
        assert!(matches!(
            session.access_token().await,
            Err(GraphError::Authentication(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = ClientCredentials {
            authority_url: "https://login.microsoftonline.com".to_string(),
            tenant_id: "contoso.onmicrosoft.com".to_string(),
            client_id: "client".to_string(),
            client_secret: "super-secret".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));

        let session = StaticTokenSession::new("eyJ-secret");
        assert!(!format!("{:?}", session).contains("eyJ-secret"));
    }

    #[test]
    fn test_token_url() {
        let credentials = ClientCredentials {
            authority_url: "https://login.microsoftonline.com/".to_string(),
            tenant_id: "contoso.onmicrosoft.com".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
        };
        assert_eq!(
            credentials.token_url(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
    }
}

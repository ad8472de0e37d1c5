//! Microsoft Graph client.
//!
//! Device and user lookups go through the JSON `$batch` endpoint. The only
//! direct calls are the single-device user lookup and `@odata.nextLink`
//! continuation pages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::models::{BatchRequest, BatchResponse, GraphUser, MAX_BATCH_REQUESTS};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::envelope::{BatchRequestEnvelope, BatchResponseEnvelope};
use crate::error::GraphError;
use crate::metrics::{record_batch_dispatch, RequestTimer};
use crate::session::SessionProvider;

/// Header Graph echoes back for request correlation.
const CLIENT_REQUEST_ID: &str = "client-request-id";

/// Operations the inventory services need from Microsoft Graph.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Submits up to [`MAX_BATCH_REQUESTS`] sub-requests in one `$batch` call.
    ///
    /// Sub-request failures are reported through each response's status;
    /// only transport failures and a non-success envelope status are errors.
    async fn send_batch(&self, requests: &[BatchRequest]) -> Result<Vec<BatchResponse>, GraphError>;

    /// Fetches one user directly, outside any batch.
    ///
    /// Returns `None` when Graph answers with a non-success status.
    async fn get_user(&self, user_id: &str) -> Result<Option<GraphUser>, GraphError>;

    /// Fetches an `@odata.nextLink` continuation page.
    ///
    /// Returns `None` when Graph answers with a non-success status.
    async fn get_page(&self, next_link: &str) -> Result<Option<Value>, GraphError>;
}

/// Endpoint settings for [`GraphClient`].
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    /// Graph root, e.g. `https://graph.microsoft.com`
    pub base_url: String,
    /// API version carrying the teamwork device endpoints
    pub batch_version: String,
    /// API version used for direct user lookups
    pub user_version: String,
    pub timeout_secs: u64,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com".to_string(),
            batch_version: "beta".to_string(),
            user_version: "v1.0".to_string(),
            timeout_secs: 60,
        }
    }
}

/// reqwest-backed [`GraphApi`].
pub struct GraphClient {
    client: Client,
    config: GraphClientConfig,
    session: Arc<dyn SessionProvider>,
}

impl GraphClient {
    pub fn new(
        config: GraphClientConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn batch_url(&self) -> String {
        format!("{}/{}/$batch", self.base_url(), self.config.batch_version)
    }

    /// Whether `link` points at the configured Graph origin: same scheme,
    /// host and port, and no userinfo.
    fn is_graph_link(&self, link: &str) -> bool {
        let (Ok(base), Ok(link)) = (Url::parse(self.base_url()), Url::parse(link)) else {
            return false;
        };
        link.scheme() == base.scheme()
            && link.host_str() == base.host_str()
            && link.port_or_known_default() == base.port_or_known_default()
            && link.username().is_empty()
            && link.password().is_none()
    }

    fn user_url(&self, user_id: &str) -> String {
        format!(
            "{}/{}/users/{}",
            self.base_url(),
            self.config.user_version,
            user_id
        )
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn send_batch(&self, requests: &[BatchRequest]) -> Result<Vec<BatchResponse>, GraphError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        if requests.len() > MAX_BATCH_REQUESTS {
            return Err(GraphError::BatchTooLarge {
                size: requests.len(),
                max: MAX_BATCH_REQUESTS,
            });
        }

        let token = self.session.access_token().await?;
        let request_id = Uuid::new_v4();

        debug!(
            sub_requests = requests.len(),
            client_request_id = %request_id,
            "Sending Graph batch"
        );

        let timer = RequestTimer::new("batch");
        let response = self
            .client
            .post(self.batch_url())
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID, request_id.to_string())
            .json(&BatchRequestEnvelope { requests })
            .send()
            .await;
        timer.record();
        record_batch_dispatch(requests.len());

        let response = response?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                client_request_id = %request_id,
                "Graph batch request failed"
            );
            return Err(GraphError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: BatchResponseEnvelope = response
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(format!("Invalid batch response: {}", e)))?;

        debug!(
            responses = envelope.responses.len(),
            client_request_id = %request_id,
            "Graph batch completed"
        );

        Ok(envelope.responses)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<GraphUser>, GraphError> {
        let token = self.session.access_token().await?;

        let timer = RequestTimer::new("get_user");
        let response = self
            .client
            .get(self.user_url(user_id))
            .bearer_auth(token)
            .send()
            .await;
        timer.record();

        let response = response?;
        match response.status() {
            StatusCode::OK => {
                let user = response.json().await.map_err(|e| {
                    GraphError::InvalidResponse(format!("Invalid user response: {}", e))
                })?;
                Ok(Some(user))
            }
            status => {
                warn!(user_id = %user_id, status = %status, "Graph user lookup failed");
                Ok(None)
            }
        }
    }

    async fn get_page(&self, next_link: &str) -> Result<Option<Value>, GraphError> {
        if !self.is_graph_link(next_link) {
            return Err(GraphError::InvalidResponse(format!(
                "Refusing to follow continuation link outside {}",
                self.base_url()
            )));
        }

        let token = self.session.access_token().await?;

        let timer = RequestTimer::new("page");
        let response = self.client.get(next_link).bearer_auth(token).send().await;
        timer.record();

        let response = response?;
        match response.status() {
            StatusCode::OK => {
                let page = response.json().await.map_err(|e| {
                    GraphError::InvalidResponse(format!("Invalid page response: {}", e))
                })?;
                Ok(Some(page))
            }
            status => {
                warn!(status = %status, "Graph continuation page unavailable");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StaticTokenSession;

    fn client(base_url: &str) -> GraphClient {
        GraphClient::new(
            GraphClientConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            },
            Arc::new(StaticTokenSession::new("unused")),
        )
        .unwrap()
    }

    #[test]
    fn test_batch_url() {
        assert_eq!(
            client("https://graph.microsoft.com/").batch_url(),
            "https://graph.microsoft.com/beta/$batch"
        );
    }

    #[test]
    fn test_user_url() {
        assert_eq!(
            client("https://graph.microsoft.com").user_url("u-1"),
            "https://graph.microsoft.com/v1.0/users/u-1"
        );
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let responses = client("http://127.0.0.1:9").send_batch(&[]).await.unwrap();
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let requests: Vec<BatchRequest> = (0..21)
            .map(|i| BatchRequest::get(format!("u{}", i), format!("/users/u{}", i)))
            .collect();
        let result = client("http://127.0.0.1:9").send_batch(&requests).await;
        assert!(matches!(
            result,
            Err(GraphError::BatchTooLarge { size: 21, max: 20 })
        ));
    }

    #[test]
    fn test_graph_links_accepted() {
        let client = client("https://graph.microsoft.com");
        assert!(client.is_graph_link("https://graph.microsoft.com/beta/teamwork/devices?$skiptoken=x"));
        assert!(client.is_graph_link("https://graph.microsoft.com:443/beta/teamwork/devices"));
    }

    #[test]
    fn test_lookalike_links_rejected() {
        let client = client("https://graph.microsoft.com");
        for link in [
            "https://graph.microsoft.com@evil.example.com/beta/teamwork/devices",
            "https://graph.microsoft.com:x@evil.example.com/beta/teamwork/devices",
            "https://graph.microsoft.com.evil.example.com/beta/teamwork/devices",
            "https://user@graph.microsoft.com/beta/teamwork/devices",
            "http://graph.microsoft.com/beta/teamwork/devices",
            "https://graph.microsoft.com:8443/beta/teamwork/devices",
            "/beta/teamwork/devices",
        ] {
            assert!(!client.is_graph_link(link), "accepted {}", link);
        }
    }

    #[tokio::test]
    async fn test_userinfo_next_link_rejected() {
        let result = client("https://graph.microsoft.com")
            .get_page("https://graph.microsoft.com@evil.example.com/beta/teamwork/devices")
            .await;
        assert!(matches!(result, Err(GraphError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_foreign_next_link_rejected() {
        let result = client("https://graph.microsoft.com")
            .get_page("https://evil.example.com/beta/teamwork/devices?$skiptoken=x")
            .await;
        assert!(matches!(result, Err(GraphError::InvalidResponse(_))));
    }
}

//! HTTP client for the console backend
//!
//! Provides an authenticated client for the console REST API. Besides the
//! endpoint helpers used by the MCP tools it implements the two collaborator
//! traits of the core services: [`ConfigurationStore`] and
//! [`PipelineStatusSource`].

pub mod auth;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use urlencoding::encode;

pub use auth::{Credentials, TokenCache, TokenResponse};

use crate::domain::{
    ConfigToSave, ConfigurationRef, DeployRequest, DeployTriggerResponse, MarketplaceItem,
    PipelineId, PipelineStatus, RetrievedConfiguration, SaveResponse,
};
use crate::errors::{ConsoleError, Result};
use crate::services::{ConfigurationStore, PipelineStatusSource};

/// Path of the client credentials token endpoint
pub const TOKEN_PATH: &str = "/api/m2m/oauth/token";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the console (e.g., "https://console.example.com")
    pub base_url: String,

    pub credentials: Credentials,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Enable verbose request/response logging
    pub verbose: bool,
}

/// Authenticated HTTP client for the console API
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    client: Client,
    config: ClientConfig,
    tokens: Arc<TokenCache>,
}

impl ConsoleClient {
    /// Create a client with a token cache of its own
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_token_cache(config, Arc::new(TokenCache::new()))
    }

    /// Create a client sharing an existing token cache
    pub fn with_token_cache(mut config: ClientConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder().timeout(Duration::from_secs(config.timeout)).build()?;

        Ok(Self { client, config, tokens })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Bearer token for the next request, fetching one when the cache is cold
    pub async fn access_token(&self) -> Result<String> {
        match &self.config.credentials {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::ClientCredentials { client_id, client_secret } => {
                if let Some(token) = self.tokens.get().await {
                    return Ok(token);
                }
                let _refresh = self.tokens.lock_refresh().await;
                if let Some(token) = self.tokens.get().await {
                    return Ok(token);
                }
                let token = self.fetch_token(client_id, client_secret).await?;
                self.tokens.store(&token).await;
                Ok(token.access_token)
            }
        }
    }

    async fn fetch_token(&self, client_id: &str, client_secret: &str) -> Result<TokenResponse> {
        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);
        debug!(%url, client_id, "Requesting access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsoleError::auth(format!(
                "token request failed with status {}: {}",
                status.as_u16(),
                error_message(status, &body)
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ConsoleError::serialization(e, "decoding token response"))
    }

    /// Build an authenticated request
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("{} {}", method, url);

        let token = self.access_token().await?;
        Ok(self.client.request(method, &url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && matches!(self.config.credentials, Credentials::ClientCredentials { .. })
        {
            warn!("Console rejected the access token, dropping it from the cache");
            self.tokens.invalidate().await;
        }

        Ok(response)
    }

    /// Send a GET request and deserialize the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path).await?;
        let response = self.send(request).await?;

        self.handle_response(path, response).await
    }

    /// Send a POST request with JSON body and deserialize the response
    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R> {
        if self.config.verbose {
            let body_json = serde_json::to_string_pretty(body)
                .unwrap_or_else(|_| "<unable to serialize>".to_string());
            trace!("Request body:\n{}", body_json);
        }

        let request = self.request(Method::POST, path).await?.json(body);
        let response = self.send(request).await?;

        self.handle_response(path, response).await
    }

    /// Send a GET request and return the raw response body
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let request = self.request(Method::GET, path).await?;
        let response = self.send(request).await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(ConsoleError::http(status.as_u16(), error_message(status, &body)));
        }
        Ok(body)
    }

    /// Check the status and deserialize a JSON body
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
    ) -> Result<T> {
        let status = response.status();
        debug!("Response status: {}", status);

        let body = response.text().await?;
        if self.config.verbose {
            trace!("Response body:\n{}", body);
        }

        if !status.is_success() {
            return Err(ConsoleError::http(status.as_u16(), error_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| ConsoleError::serialization(e, format!("decoding response of {}", path)))
    }

    // === Tenants & projects ===

    pub async fn list_tenants(&self) -> Result<Value> {
        self.get_json("/api/backend/tenants/").await
    }

    pub async fn list_projects(&self, tenant_id: Option<&str>) -> Result<Value> {
        let path = match tenant_id {
            Some(tenant) => format!("/api/backend/projects/?tenantIds={}", encode(tenant)),
            None => "/api/backend/projects/".to_string(),
        };
        self.get_json(&path).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/backend/projects/{}/", encode(project_id))).await
    }

    pub async fn list_revisions(&self, project_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/backend/projects/{}/revisions", encode(project_id))).await
    }

    // === Marketplace ===

    pub async fn list_marketplace(
        &self,
        tenant_id: Option<&str>,
        item_type: Option<&str>,
    ) -> Result<Vec<MarketplaceItem>> {
        let mut query = Vec::new();
        if let Some(tenant) = tenant_id {
            query.push(format!("tenantId={}", encode(tenant)));
        }
        if let Some(types) = item_type {
            query.push(format!("types={}", encode(types)));
        }

        let mut path = "/api/backend/marketplace/".to_string();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        self.get_json(&path).await
    }

    /// Fetch the detail of a marketplace item, at `version` or its latest one
    pub async fn get_marketplace_item(
        &self,
        tenant_id: &str,
        item_id: &str,
        version: Option<&str>,
    ) -> Result<MarketplaceItem> {
        let mut path = format!(
            "/api/backend/marketplace/tenants/{}/resources/{}",
            encode(tenant_id),
            encode(item_id)
        );
        if let Some(version) = version {
            path.push_str(&format!("/versions/{}", encode(version)));
        }
        self.get_json(&path).await
    }

    // === Deploy ===

    /// Start a deploy pipeline; the pipeline runs on independently of this client
    pub async fn trigger_deploy(
        &self,
        project_id: &str,
        request: &DeployRequest,
    ) -> Result<DeployTriggerResponse> {
        let path = format!("/api/deploy/projects/{}/trigger/pipeline/", encode(project_id));
        self.post_json(&path, request).await
    }

    // === Runtime ===

    pub async fn list_pods(&self, project_id: &str, environment: &str) -> Result<Value> {
        let path = format!(
            "/api/projects/{}/environments/{}/kubernetes/pods/describe/",
            encode(project_id),
            encode(environment)
        );
        self.get_json(&path).await
    }

    pub async fn pod_logs(
        &self,
        project_id: &str,
        environment: &str,
        pod: &str,
        container: &str,
        tail_lines: Option<u32>,
    ) -> Result<String> {
        let mut path = format!(
            "/api/projects/{}/environments/{}/kubernetes/pods/{}/containers/{}/logs",
            encode(project_id),
            encode(environment),
            encode(pod),
            encode(container)
        );
        if let Some(lines) = tail_lines {
            path.push_str(&format!("?tailLines={}", lines));
        }
        self.get_text(&path).await
    }

    fn configuration_path(project_id: &str, reference: &ConfigurationRef) -> String {
        format!(
            "/api/backend/projects/{}/{}/{}/configuration",
            encode(project_id),
            reference.path_segment(),
            encode(reference.name())
        )
    }
}

#[async_trait]
impl ConfigurationStore for ConsoleClient {
    async fn get_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
    ) -> Result<RetrievedConfiguration> {
        self.get_json(&Self::configuration_path(project_id, reference)).await
    }

    async fn save_configuration(
        &self,
        project_id: &str,
        reference: &ConfigurationRef,
        payload: &ConfigToSave,
    ) -> Result<SaveResponse> {
        self.post_json(&Self::configuration_path(project_id, reference), payload).await
    }
}

#[async_trait]
impl PipelineStatusSource for ConsoleClient {
    async fn get_pipeline_status(
        &self,
        project_id: &str,
        pipeline_id: &PipelineId,
        environment: Option<&str>,
    ) -> Result<PipelineStatus> {
        let mut path = format!(
            "/api/deploy/projects/{}/pipelines/{}/status/",
            encode(project_id),
            encode(&pipeline_id.to_string())
        );
        if let Some(env) = environment {
            path.push_str(&format!("?environment={}", encode(env)));
        }
        self.get_json(&path).await
    }
}

/// Human-readable message of an error response.
///
/// Uses the body's `message` field, then its `error` field, and falls back to
/// a generic text naming the status.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("unknown error with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, credentials: Credentials) -> ConsoleClient {
        ConsoleClient::new(ClientConfig {
            base_url: format!("{}/", server.uri()),
            credentials,
            timeout: 5,
            verbose: true,
        })
        .unwrap()
    }

    fn token_client(server: &MockServer) -> ConsoleClient {
        client_for(server, Credentials::Token("static-token".to_string()))
    }

    #[test]
    fn test_error_message_extraction() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(status, r#"{"message":"bad project"}"#), "bad project");
        assert_eq!(error_message(status, r#"{"error":"Forbidden"}"#), "Forbidden");
        assert_eq!(
            error_message(status, r#"{"message":"first","error":"second"}"#),
            "first"
        );
        assert_eq!(error_message(status, "<html>"), "unknown error with status 400");
        assert_eq!(error_message(status, r#"{"message":42}"#), "unknown error with status 400");
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/backend/tenants/"))
            .and(header("authorization", "Bearer static-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"tenantId": "t1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let tenants = token_client(&server).list_tenants().await.unwrap();
        assert_eq!(tenants[0]["tenantId"], "t1");
    }

    #[tokio::test]
    async fn test_http_error_carries_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/backend/projects/missing/"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "project not found"})),
            )
            .mount(&server)
            .await;

        let err = token_client(&server).get_project("missing").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "project not found");
    }

    #[tokio::test]
    async fn test_projects_filtered_by_tenant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/backend/projects/"))
            .and(query_param("tenantIds", "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        token_client(&server).list_projects(Some("acme")).await.unwrap();
    }

    #[tokio::test]
    async fn test_client_credentials_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=svc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "issued-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/backend/tenants/"))
            .and(header("authorization", "Bearer issued-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(
            &server,
            Credentials::ClientCredentials {
                client_id: "svc".to_string(),
                client_secret: "secret".to_string(),
            },
        );
        client.list_tenants().await.unwrap();
        client.list_tenants().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_token_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "issued-token", "expires_in": 3600}))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(
            &server,
            Credentials::ClientCredentials {
                client_id: "svc".to_string(),
                client_secret: "secret".to_string(),
            },
        );
        let other = client.clone();
        let (first, second, third) =
            tokio::join!(client.access_token(), other.access_token(), client.access_token());

        assert_eq!(first.unwrap(), "issued-token");
        assert_eq!(second.unwrap(), "issued-token");
        assert_eq!(third.unwrap(), "issued-token");
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalidated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "issued-token",
                "expires_in": 3600
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/backend/tenants/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
            .mount(&server)
            .await;

        let client = client_for(
            &server,
            Credentials::ClientCredentials {
                client_id: "svc".to_string(),
                client_secret: "secret".to_string(),
            },
        );
        let err = client.list_tenants().await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
        client.list_tenants().await.unwrap_err();
    }

    #[tokio::test]
    async fn test_failed_token_request_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
            .mount(&server)
            .await;

        let client = client_for(
            &server,
            Credentials::ClientCredentials {
                client_id: "svc".to_string(),
                client_secret: "wrong".to_string(),
            },
        );
        let err = client.list_tenants().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Auth(_)));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_configuration_store_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/backend/projects/p1/environments/dev/configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commitId": "c-1",
                "services": {"api": {"name": "api"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/backend/projects/p1/environments/dev/configuration"))
            .and(body_string_contains("\"previousSave\":\"c-1\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "save-2"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = token_client(&server);
        let reference = ConfigurationRef::Environment("dev".to_string());
        let current = client.get_configuration("p1", &reference).await.unwrap();
        assert_eq!(current.commit_id.as_deref(), Some("c-1"));

        let payload = ConfigToSave {
            title: "test".to_string(),
            previous_save: current.commit_id.clone(),
            config: current.config.clone(),
            fast_data_config: None,
            microfrontend_plugins_config: None,
            extensions_config: None,
            deleted_elements: serde_json::Map::new(),
        };
        let saved = client.save_configuration("p1", &reference, &payload).await.unwrap();
        assert_eq!(saved.id, "save-2");
    }

    #[tokio::test]
    async fn test_pipeline_status_with_environment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/deploy/projects/p1/pipelines/77/status/"))
            .and(query_param("environment", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 77, "status": "running"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let status = token_client(&server)
            .get_pipeline_status("p1", &PipelineId::Number(77), Some("prod"))
            .await
            .unwrap();
        assert_eq!(status.status, "running");
        assert!(!status.is_terminal());
    }

    #[tokio::test]
    async fn test_trigger_deploy_posts_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deploy/projects/p1/trigger/pipeline/"))
            .and(body_string_contains("\"deployType\":\"smart_deploy\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 991,
                "url": "https://ci.example.com/pipelines/991"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = token_client(&server)
            .trigger_deploy("p1", &DeployRequest::smart_deploy("dev", "main", "revisions"))
            .await
            .unwrap();
        assert_eq!(response.id, PipelineId::Number(991));
    }

    #[tokio::test]
    async fn test_pod_logs_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1/environments/dev/kubernetes/pods/api-0/containers/api/logs"))
            .and(query_param("tailLines", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_string("line 1\nline 2\n"))
            .expect(1)
            .mount(&server)
            .await;

        let logs = token_client(&server)
            .pod_logs("p1", "dev", "api-0", "api", Some(50))
            .await
            .unwrap();
        assert_eq!(logs.lines().count(), 2);
    }
}

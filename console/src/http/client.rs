//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::{ConsoleError, ConsoleResult};

const USER_AGENT: &str = "deployhub-console";

/// Upstream API a client talks to. Decides how missing credentials and
/// failed responses are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GitHub,
    Vercel,
}

impl Upstream {
    fn missing_token(&self) -> ConsoleError {
        match self {
            Upstream::GitHub => {
                ConsoleError::ConfigError("GitHub not connected: set GITHUB_TOKEN".to_string())
            }
            Upstream::Vercel => ConsoleError::ConfigError("VERCEL_TOKEN not configured".to_string()),
        }
    }

    fn status_error(&self, status: reqwest::StatusCode, body: String) -> ConsoleError {
        match self {
            Upstream::GitHub => ConsoleError::SourceHostError(format!("{}: {}", status, body)),
            Upstream::Vercel => ConsoleError::ProviderError(format!(
                "Vercel API error ({}): {}",
                status.as_u16(),
                body
            )),
        }
    }
}

/// Bearer-authenticated JSON client for one upstream API
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
    upstream: Upstream,
}

impl HttpClient {
    /// Create a new HTTP client. A missing token is only reported when a
    /// request is made.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        upstream: Upstream,
    ) -> ConsoleResult<Self> {
        Url::parse(base_url).map_err(|e| {
            ConsoleError::ConfigError(format!("invalid API base URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            upstream,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> ConsoleResult<RequestBuilder> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| self.upstream.missing_token())?;
        Ok(request.header(
            header::AUTHORIZATION,
            format!("Bearer {}", token.expose_secret()),
        ))
    }

    async fn read<T: DeserializeOwned>(&self, method: &str, response: Response) -> ConsoleResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(self.upstream.status_error(status, body));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ConsoleResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.authorize(self.client.get(&url).query(query))?;
        let response = request.send().await?;
        self.read("GET", response).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ConsoleResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self.authorize(self.client.post(&url).json(body))?;
        let response = request.send().await?;
        self.read("POST", response).await
    }
}

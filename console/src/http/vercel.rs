//! Vercel deployments API client

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ConsoleResult;
use crate::http::client::{HttpClient, Upstream};
use crate::utils::provider_project_name;

/// Build state reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadyState {
    #[default]
    Queued,
    Building,
    Ready,
    Error,
    Canceled,
    /// Any state the console does not act on (INITIALIZING, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub message: Option<String>,
}

/// A deployment as the provider describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDeployment {
    pub id: String,

    /// Assigned address, without scheme
    pub url: String,

    #[serde(default)]
    pub ready_state: ReadyState,

    #[serde(default)]
    pub error: Option<ProviderError>,
}

impl ProviderDeployment {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }
}

/// External deployment platform
#[async_trait]
pub trait DeployProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_deployment(
        &self,
        repository_id: u64,
        branch: &str,
        name: &str,
    ) -> ConsoleResult<ProviderDeployment>;

    async fn get_deployment(&self, id: &str) -> ConsoleResult<ProviderDeployment>;
}

pub struct VercelClient {
    http: HttpClient,
}

impl VercelClient {
    pub fn new(base_url: &str, token: Option<SecretString>) -> ConsoleResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, token, Upstream::Vercel)?,
        })
    }
}

#[async_trait]
impl DeployProvider for VercelClient {
    fn name(&self) -> &'static str {
        "vercel"
    }

    async fn create_deployment(
        &self,
        repository_id: u64,
        branch: &str,
        name: &str,
    ) -> ConsoleResult<ProviderDeployment> {
        let body = json!({
            "name": provider_project_name(name),
            "gitSource": {
                "type": "github",
                "repoId": repository_id,
                "ref": branch,
            },
            "projectSettings": {
                "framework": null,
                "buildCommand": null,
                "installCommand": null,
                "outputDirectory": null,
                "devCommand": null,
                "commandForIgnoringBuildStep": "",
            },
        });
        self.http.post("/v13/deployments", &body).await
    }

    async fn get_deployment(&self, id: &str) -> ConsoleResult<ProviderDeployment> {
        let path = format!("/v13/deployments/{}", id);
        self.http.get(&path, &[]).await
    }
}

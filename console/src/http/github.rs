//! GitHub API client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleResult;
use crate::http::client::{HttpClient, Upstream};
use crate::models::RepositoryRef;

/// Repository of the connected account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Source-hosting lookups the console needs
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Numeric identifier of a repository
    async fn repository_id(&self, repository: &RepositoryRef) -> ConsoleResult<u64>;

    /// Latest commit hash of a branch
    async fn branch_head(&self, repository: &RepositoryRef, branch: &str) -> ConsoleResult<String>;

    /// Repositories of the connected account, most recently updated first
    async fn list_repositories(&self) -> ConsoleResult<Vec<Repository>>;

    async fn list_branches(&self, repository: &RepositoryRef) -> ConsoleResult<Vec<Branch>>;
}

pub struct GitHubClient {
    http: HttpClient,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<SecretString>) -> ConsoleResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, token, Upstream::GitHub)?,
        })
    }

    pub fn into_shared(self) -> Arc<dyn SourceHost> {
        Arc::new(self)
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn repository_id(&self, repository: &RepositoryRef) -> ConsoleResult<u64> {
        let path = format!("/repos/{}/{}", repository.owner, repository.name);
        let repo: Repository = self.http.get(&path, &[]).await?;
        Ok(repo.id)
    }

    async fn branch_head(&self, repository: &RepositoryRef, branch: &str) -> ConsoleResult<String> {
        let path = format!(
            "/repos/{}/{}/branches/{}",
            repository.owner, repository.name, branch
        );
        let branch: Branch = self.http.get(&path, &[]).await?;
        Ok(branch.commit.sha)
    }

    async fn list_repositories(&self) -> ConsoleResult<Vec<Repository>> {
        self.http
            .get(
                "/user/repos",
                &[("sort", "updated"), ("per_page", "50")],
            )
            .await
    }

    async fn list_branches(&self, repository: &RepositoryRef) -> ConsoleResult<Vec<Branch>> {
        let path = format!("/repos/{}/{}/branches", repository.owner, repository.name);
        self.http.get(&path, &[("per_page", "100")]).await
    }
}

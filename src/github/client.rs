use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::time::Duration;

use super::models::*;
use super::RepoRef;
use crate::application::ports::RepositorySource;
use crate::config::{GitHubConfig, Secret};
use crate::error::{GradingError, UpstreamError};

const SERVICE: &str = "GitHub";
const USER_AGENT: &str = "startup-grader";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    token: Secret,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create GitHub HTTP client")?;
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", config.api_url))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url, accept: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token.expose()))
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let response = request
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        UpstreamError::check(SERVICE, response).await
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, UpstreamError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })
    }

    /// Get repository metadata
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, UpstreamError> {
        let url = self.url(["repos", owner, repo]);
        self.send_json(self.get(url, ACCEPT_JSON)).await
    }

    /// Get repository tree, recursively
    pub async fn get_tree(&self, owner: &str, repo: &str, sha: &str) -> Result<Tree, UpstreamError> {
        let url = self.url(["repos", owner, repo, "git", "trees", sha]);
        self.send_json(self.get(url, ACCEPT_JSON).query(&[("recursive", "1")]))
            .await
    }

    /// Get raw file contents at a ref
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> Result<String, UpstreamError> {
        let segments = ["repos", owner, repo, "contents"]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));
        let url = self.url(segments);

        self.send(self.get(url, ACCEPT_RAW).query(&[("ref", reference)]))
            .await?
            .text()
            .await
            .map_err(UpstreamError::transport(SERVICE))
    }

    /// Get README as raw text; `None` when the repository has no README
    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<Option<String>, UpstreamError> {
        let url = self.url(["repos", owner, repo, "readme"]);
        let response = self
            .get(url, ACCEPT_RAW)
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = UpstreamError::check(SERVICE, response)
            .await?
            .text()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        Ok(Some(text))
    }

    /// Search public repositories
    pub async fn search_repositories(
        &self,
        query: &str,
        per_page: u8,
    ) -> Result<Vec<Repository>, UpstreamError> {
        let url = self.url(["search", "repositories"]);
        let per_page = per_page.to_string();
        let result: SearchRepositories = self
            .send_json(
                self.get(url, ACCEPT_JSON)
                    .query(&[("q", query), ("per_page", per_page.as_str())]),
            )
            .await?;
        Ok(result.items)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn repository(&self, repo: &RepoRef) -> Result<Repository, GradingError> {
        Ok(self.get_repository(&repo.owner, &repo.repo).await?)
    }

    async fn tree(&self, repo: &RepoRef, reference: &str) -> Result<Tree, GradingError> {
        Ok(self.get_tree(&repo.owner, &repo.repo, reference).await?)
    }

    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<String, GradingError> {
        Ok(self
            .get_file_content(&repo.owner, &repo.repo, path, reference)
            .await?)
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, GradingError> {
        Ok(self.get_readme(&repo.owner, &repo.repo).await?)
    }

    async fn search(&self, query: &str, per_page: u8) -> Result<Vec<Repository>, GradingError> {
        Ok(self.search_repositories(query, per_page).await?)
    }
}

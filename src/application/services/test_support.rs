//! In-memory port implementations for service and router tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ports::{
    CompletionRequest, ContentExtractor, LanguageModel, RepositorySource, SearchHit, Transcriber,
    WebSearch,
};
use crate::error::GradingError;
use crate::github::{RepoRef, Repository, Tree, TreeItem};
use crate::infrastructure::logging::BoundaryLogger;
use crate::models::Upload;

pub fn logger() -> Arc<BoundaryLogger> {
    Arc::new(BoundaryLogger::new())
}

pub fn repository(full_name: &str, description: &str) -> Repository {
    let name = full_name.rsplit('/').next().unwrap_or(full_name).to_string();
    Repository {
        id: 1,
        name,
        full_name: full_name.to_string(),
        html_url: format!("https://github.com/{}", full_name),
        default_branch: "main".into(),
        description: Some(description.to_string()).filter(|d| !d.is_empty()),
        language: Some("Rust".into()),
        stargazers_count: 3,
    }
}

/// Language model that answers by the first route whose key appears in the
/// system prompt
pub struct RoutedModel {
    routes: Vec<(&'static str, Result<String, &'static str>)>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl RoutedModel {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, key: &'static str, reply: impl Into<String>) -> Self {
        self.routes.push((key, Ok(reply.into())));
        self
    }

    /// Replies to `key` with an upstream failure
    pub fn fail(mut self, key: &'static str) -> Self {
        self.routes.push((key, Err("model unavailable")));
        self
    }

    pub fn calls_to(&self, key: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.system.as_deref().unwrap_or_default().contains(key))
            .count()
    }
}

#[async_trait]
impl LanguageModel for RoutedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GradingError> {
        let system = request.system.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(request);
        match self.routes.iter().find(|(key, _)| system.contains(key)) {
            Some((_, Ok(reply))) => Ok(reply.clone()),
            Some((_, Err(msg))) => Err(GradingError::UpstreamUnavailable(msg.to_string())),
            None => Err(GradingError::Internal(format!("no route for: {}", system))),
        }
    }
}

/// Transcriber whose upstream always rejects the upload
pub struct RejectingTranscriber(pub fn() -> GradingError);

#[async_trait]
impl Transcriber for RejectingTranscriber {
    async fn transcribe(&self, _upload: &Upload) -> Result<String, GradingError> {
        Err((self.0)())
    }
}

/// Extractor that yields the same text for any upload
pub struct FixedExtractor(pub Option<&'static str>);

#[async_trait]
impl ContentExtractor for FixedExtractor {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn extract(&self, _upload: &Upload) -> Result<Option<String>, GradingError> {
        Ok(self.0.map(str::to_string))
    }
}

/// Repository host backed by maps; `repository: None` fails metadata lookups
#[derive(Default)]
pub struct StubSource {
    pub repository: Option<Repository>,
    pub files: HashMap<String, String>,
    pub readmes: HashMap<String, String>,
    pub search_results: Vec<Repository>,
    pub search_fails: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn with_repository(repository: Repository) -> Self {
        Self {
            repository: Some(repository),
            ..Default::default()
        }
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn readme(mut self, full_name: &str, content: &str) -> Self {
        self.readmes.insert(full_name.to_string(), content.to_string());
        self
    }

    pub fn search_result(mut self, repository: Repository) -> Self {
        self.search_results.push(repository);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RepositorySource for StubSource {
    async fn repository(&self, _repo: &RepoRef) -> Result<Repository, GradingError> {
        self.enter().await;
        self.repository
            .clone()
            .ok_or_else(|| GradingError::UpstreamUnavailable("GitHub returned 404".into()))
    }

    async fn tree(&self, _repo: &RepoRef, reference: &str) -> Result<Tree, GradingError> {
        self.enter().await;
        let mut paths: Vec<&String> = self.files.keys().collect();
        paths.sort();
        Ok(Tree {
            sha: reference.to_string(),
            tree: paths
                .into_iter()
                .map(|path| TreeItem {
                    path: path.clone(),
                    item_type: "blob".into(),
                    sha: "0".repeat(40),
                    size: Some(self.files[path].len() as u64),
                })
                .collect(),
            truncated: false,
        })
    }

    async fn file_content(
        &self,
        _repo: &RepoRef,
        path: &str,
        _reference: &str,
    ) -> Result<String, GradingError> {
        self.enter().await;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| GradingError::UpstreamUnavailable(format!("missing {}", path)))
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, GradingError> {
        self.enter().await;
        Ok(self.readmes.get(&repo.full_name()).cloned())
    }

    async fn search(&self, _query: &str, per_page: u8) -> Result<Vec<Repository>, GradingError> {
        self.enter().await;
        if self.search_fails {
            return Err(GradingError::UpstreamUnavailable("GitHub search returned 503".into()));
        }
        Ok(self.search_results.iter().take(per_page as usize).cloned().collect())
    }
}

pub struct StubSearch {
    pub hits: Vec<SearchHit>,
    pub fails: bool,
}

impl StubSearch {
    pub fn hits(hits: Vec<SearchHit>) -> Self {
        Self { hits, fails: false }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fails: true,
        }
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, GradingError> {
        if self.fails {
            return Err(GradingError::UpstreamUnavailable("SearchAPI returned 500".into()));
        }
        Ok(self.hits.clone())
    }
}

pub fn hit(title: &str, link: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        link: link.to_string(),
        snippet: Some(snippet.to_string()),
        description: None,
    }
}

use async_trait::async_trait;

use crate::error::GradingError;
use crate::github::{RepoRef, Repository, Tree};

/// Trait for source-hosting API operations used by the evaluators
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Repository metadata (default branch, description, language)
    async fn repository(&self, repo: &RepoRef) -> Result<Repository, GradingError>;

    /// Recursive file tree at the given branch or commit
    async fn tree(&self, repo: &RepoRef, reference: &str) -> Result<Tree, GradingError>;

    /// Raw content of a single file
    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: &str,
    ) -> Result<String, GradingError>;

    /// README text, `None` if the repository has none
    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, GradingError>;

    /// Repository search by free-text query
    async fn search(&self, query: &str, per_page: u8) -> Result<Vec<Repository>, GradingError>;
}

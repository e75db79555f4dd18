use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GradingError;

/// One organic web search result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SearchHit {
    /// Title, snippet and description joined for similarity scoring
    pub fn text(&self) -> String {
        [Some(self.title.as_str()), self.snippet.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(". ")
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, GradingError>;
}

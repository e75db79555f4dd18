use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::ports::{CompletionRequest, LanguageModel, RepositorySource};
use crate::error::GradingError;
use crate::github::{excerpt, ExcerptSelector, RepoRef};
use crate::infrastructure::logging::{BoundaryLogger, Timer};
use crate::llm::reply;
use crate::models::{Criteria, GithubGrade};

const MAX_TECH_STACK: usize = 5;

const SYSTEM_PROMPT: &str = "You review the source code repository of an early-stage startup \
as a senior software engineer. Grade each criterion from 0 to 100 (one decimal allowed) and justify \
each grade in one or two sentences. Respond with a single JSON object and nothing else.";

const REPLY_SCHEMA: &str = r#"{
  "criteria": {
    "structure":     { "grade": number, "explanation": string },
    "code_quality":  { "grade": number, "explanation": string },
    "security":      { "grade": number, "explanation": string },
    "documentation": { "grade": number, "explanation": string },
    "efficiency":    { "grade": number, "explanation": string },
    "tech_stack":    { "grade": number, "explanation": string }
  },
  "tech_stack": [string],  // at most 5 primary technologies
  "summary": string
}"#;

/// Structured review the model returns for a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryReview {
    pub criteria: Criteria,
    pub tech_stack: Vec<String>,
    pub summary: String,
}

impl RepositoryReview {
    pub fn parse(text: &str) -> Result<Self, GradingError> {
        let mut review: RepositoryReview = reply::decode(text)?;
        review.tech_stack = normalize_tech_stack(review.tech_stack);
        review.summary = review.summary.trim().to_string();
        Ok(review)
    }

    /// One line per criterion with its grade and explanation
    pub fn breakdown(&self) -> String {
        self.criteria
            .iter()
            .map(|(label, c)| format!("{} ({}): {}", label, c.grade, c.explanation.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_grade(self) -> GithubGrade {
        GithubGrade {
            grade: self.criteria.overall(),
            description: self.breakdown(),
            tech_stack: self.tech_stack,
            summary: self.summary,
            criteria: self.criteria,
        }
    }
}

/// Trim, drop blanks, de-duplicate ignoring case, keep the first five
fn normalize_tech_stack(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for item in raw {
        let item = item.trim().to_string();
        let key = item.to_lowercase();
        if item.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(item);
        if out.len() == MAX_TECH_STACK {
            break;
        }
    }
    out
}

/// GithubEvaluator - 저장소 구조와 코드를 발췌해 LLM으로 채점
pub struct GithubEvaluator {
    source: Arc<dyn RepositorySource>,
    model: Arc<dyn LanguageModel>,
    selector: ExcerptSelector,
    max_excerpt_files: usize,
    logger: Arc<BoundaryLogger>,
}

impl GithubEvaluator {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        model: Arc<dyn LanguageModel>,
        max_excerpt_files: usize,
        logger: Arc<BoundaryLogger>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            source,
            model,
            selector: ExcerptSelector::new()?,
            max_excerpt_files,
            logger,
        })
    }

    pub async fn evaluate_repository(
        &self,
        trace_id: &str,
        repo: &RepoRef,
    ) -> Result<GithubGrade, GradingError> {
        let timer = Timer::start();
        self.logger
            .service_entry(trace_id, "StartupService", "GithubEvaluator", "evaluate_repository", &repo.full_name());

        let result = self.evaluate_inner(trace_id, repo).await;
        match &result {
            Ok(grade) => self.logger.service_exit(
                trace_id,
                "StartupService",
                "GithubEvaluator",
                "evaluate_repository",
                timer.elapsed_ms(),
                &format!("grade={}", grade.grade),
            ),
            Err(e) => self.logger.service_error(
                trace_id,
                "StartupService",
                "GithubEvaluator",
                "evaluate_repository",
                e,
            ),
        }
        result
    }

    async fn evaluate_inner(&self, trace_id: &str, repo: &RepoRef) -> Result<GithubGrade, GradingError> {
        // 1. Metadata and tree
        self.logger.external_call(trace_id, "GithubEvaluator", "GitHub", "repository_tree");
        let ext_timer = Timer::start();
        let repository = self.source.repository(repo).await?;
        let tree = self.source.tree(repo, &repository.default_branch).await?;
        self.logger
            .external_done(trace_id, "GithubEvaluator", "GitHub", "repository_tree", ext_timer.elapsed_ms());

        let paths = tree.blob_paths();
        if tree.truncated {
            tracing::warn!(trace_id = %trace_id, repo = %repo, "Repository tree was truncated by GitHub");
        }

        // 2. Key files, fetched concurrently
        let selected = self.selector.select(&paths, self.max_excerpt_files);
        let source = self.source.as_ref();
        let branch = repository.default_branch.as_str();
        let fetches = selected.iter().map(|path| async move {
            let content = source.file_content(repo, path, branch).await;
            (path, content)
        });

        let mut files = Vec::with_capacity(selected.len());
        for (path, content) in join_all(fetches).await {
            match content {
                Ok(text) => files.push((path.clone(), text)),
                Err(e @ GradingError::UpstreamAuth(_)) => return Err(e),
                Err(e) => self
                    .logger
                    .external_skipped(trace_id, "GithubEvaluator", "GitHub", path, &e),
            }
        }

        // 3. Grade
        let excerpt = excerpt::render(&repository, &paths, &files);
        let prompt = format!(
            "Evaluate the repository below.\n\nRespond with JSON in exactly this shape:\n{}\n\n{}",
            REPLY_SCHEMA, excerpt
        );

        self.logger.external_call(trace_id, "GithubEvaluator", "OpenAI", "complete");
        let ext_timer = Timer::start();
        let text = self
            .model
            .complete(
                CompletionRequest::new(prompt)
                    .with_system(SYSTEM_PROMPT)
                    .expect_json()
                    .temperature(0.2),
            )
            .await?;
        self.logger
            .external_done(trace_id, "GithubEvaluator", "OpenAI", "complete", ext_timer.elapsed_ms());

        Ok(RepositoryReview::parse(&text)?.into_grade())
    }
}

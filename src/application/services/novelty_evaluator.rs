use futures::future::{join_all, try_join_all};
use std::sync::Arc;

use crate::application::ports::{CompletionRequest, LanguageModel, RepositorySource, WebSearch};
use crate::error::GradingError;
use crate::github::RepoRef;
use crate::infrastructure::logging::{BoundaryLogger, Timer};
use crate::models::{Grade, GradeWithDescription};
use crate::similarity::best_match;
use crate::text::clip;

/// Matches at or above this similarity are explained by the model
pub const SIMILARITY_THRESHOLD: f64 = 0.4;

const MAX_KEYWORDS: usize = 5;
const README_EXCERPT_BYTES: usize = 4 * 1024;
const MAX_QUERY_BYTES: usize = 256;

const KEYWORDS_SYSTEM_PROMPT: &str = "You turn a startup description into search keywords. \
Reply with exactly five keywords (or a five word title) separated by spaces and nothing else.";

const SIMILARITY_SYSTEM_PROMPT: &str = "You compare a startup idea with an existing project \
found online. In two or three sentences, explain what the two have in common.";

/// Something found online that the submission is compared against
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    link: String,
    text: String,
}

#[derive(Debug)]
struct SourceOutcome {
    label: &'static str,
    score: Grade,
    closest: Option<(Candidate, f64)>,
}

impl SourceOutcome {
    fn score(label: &'static str, description: &str, candidates: Vec<Candidate>) -> Self {
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        match best_match(description, &texts) {
            Some((idx, similarity)) => Self {
                label,
                score: Grade::saturating((1.0 - similarity) * 100.0),
                closest: candidates.into_iter().nth(idx).map(|c| (c, similarity)),
            },
            None => Self {
                label,
                score: Grade::MAX,
                closest: None,
            },
        }
    }

    fn similar(&self) -> Option<&Candidate> {
        self.closest
            .as_ref()
            .filter(|(_, similarity)| *similarity >= SIMILARITY_THRESHOLD)
            .map(|(candidate, _)| candidate)
    }
}

/// Up to five cleaned words from the model's reply, or the start of the
/// description when the reply has none
pub fn keywords_from_reply(reply: &str, description: &str) -> String {
    let words = |text: &str| -> Vec<String> {
        text.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| !w.is_empty())
            .take(MAX_KEYWORDS)
            .collect()
    };

    let mut keywords = words(reply);
    if keywords.is_empty() {
        keywords = words(description);
    }
    keywords.join(" ")
}

/// NoveltyEvaluator - GitHub 검색과 웹 검색 결과와의 유사도로 독창성을 채점
pub struct NoveltyEvaluator {
    source: Arc<dyn RepositorySource>,
    web: Option<Arc<dyn WebSearch>>,
    model: Arc<dyn LanguageModel>,
    results: u8,
    logger: Arc<BoundaryLogger>,
}

impl NoveltyEvaluator {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        web: Option<Arc<dyn WebSearch>>,
        model: Arc<dyn LanguageModel>,
        results: u8,
        logger: Arc<BoundaryLogger>,
    ) -> Self {
        Self {
            source,
            web,
            model,
            results,
            logger,
        }
    }

    pub async fn grade_novelty(
        &self,
        trace_id: &str,
        description: &str,
        own_repo: &RepoRef,
    ) -> Result<GradeWithDescription, GradingError> {
        let timer = Timer::start();
        self.logger
            .service_entry(trace_id, "StartupService", "NoveltyEvaluator", "grade_novelty", &own_repo.full_name());

        let result = self.grade_inner(trace_id, description, own_repo).await;
        match &result {
            Ok(grade) => self.logger.service_exit(
                trace_id,
                "StartupService",
                "NoveltyEvaluator",
                "grade_novelty",
                timer.elapsed_ms(),
                &format!("grade={}", grade.grade),
            ),
            Err(e) => self
                .logger
                .service_error(trace_id, "StartupService", "NoveltyEvaluator", "grade_novelty", e),
        }
        result
    }

    async fn grade_inner(
        &self,
        trace_id: &str,
        description: &str,
        own_repo: &RepoRef,
    ) -> Result<GradeWithDescription, GradingError> {
        let keywords = self.keywords(trace_id, description).await?;

        let (github, web) = tokio::join!(
            self.github_candidates(trace_id, &keywords, own_repo),
            self.web_candidates(trace_id, description),
        );

        let mut outcomes = Vec::with_capacity(2);
        for (label, system, candidates) in [("GitHub", "GitHub", Some(github)), ("the web", "SearchAPI", web)] {
            match candidates {
                None => {}
                Some(Ok(candidates)) => outcomes.push(SourceOutcome::score(label, description, candidates)),
                Some(Err(e)) => self
                    .logger
                    .external_skipped(trace_id, "NoveltyEvaluator", system, "search", &e),
            }
        }

        if outcomes.is_empty() {
            return Err(GradingError::UpstreamUnavailable(
                "every similarity source failed".into(),
            ));
        }

        let descriptions = try_join_all(
            outcomes
                .iter()
                .map(|outcome| self.describe(trace_id, description, outcome)),
        )
        .await?;

        let scores: Vec<Grade> = outcomes.iter().map(|o| o.score).collect();
        let grade = Grade::mean(&scores)
            .ok_or_else(|| GradingError::Internal("no novelty source was scored".into()))?;

        Ok(GradeWithDescription {
            grade,
            description: descriptions.join("\n"),
        })
    }

    async fn keywords(&self, trace_id: &str, description: &str) -> Result<String, GradingError> {
        self.logger
            .external_call(trace_id, "NoveltyEvaluator", "OpenAI", "keywords");
        let ext_timer = Timer::start();
        let reply = self
            .model
            .complete(
                CompletionRequest::new(description)
                    .with_system(KEYWORDS_SYSTEM_PROMPT)
                    .max_tokens(32),
            )
            .await?;
        self.logger.external_done(
            trace_id,
            "NoveltyEvaluator",
            "OpenAI",
            "keywords",
            ext_timer.elapsed_ms(),
        );
        Ok(keywords_from_reply(&reply, description))
    }

    async fn github_candidates(
        &self,
        trace_id: &str,
        keywords: &str,
        own_repo: &RepoRef,
    ) -> Result<Vec<Candidate>, GradingError> {
        self.logger
            .external_call(trace_id, "NoveltyEvaluator", "GitHub", "search_repositories");
        let ext_timer = Timer::start();

        let repositories: Vec<_> = self
            .source
            .search(keywords, self.results)
            .await?
            .into_iter()
            .filter(|r| !own_repo.matches_full_name(&r.full_name))
            .collect();

        // A missing or unreadable README only narrows what is compared
        let readmes = join_all(repositories.iter().map(|r| async move {
            match RepoRef::from_full_name(&r.full_name) {
                Some(repo) => self.source.readme(&repo).await.ok().flatten(),
                None => None,
            }
        }))
        .await;

        self.logger.external_done(
            trace_id,
            "NoveltyEvaluator",
            "GitHub",
            "search_repositories",
            ext_timer.elapsed_ms(),
        );

        Ok(repositories
            .into_iter()
            .zip(readmes)
            .map(|(repository, readme)| {
                let text = [
                    repository.description.as_deref().unwrap_or_default(),
                    readme.as_deref().map(|r| clip(r, README_EXCERPT_BYTES)).unwrap_or_default(),
                ]
                .iter()
                .filter(|part| !part.trim().is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n\n");

                Candidate {
                    name: repository.full_name,
                    link: repository.html_url,
                    text,
                }
            })
            .collect())
    }

    /// `None` when no web search backend is configured
    async fn web_candidates(
        &self,
        trace_id: &str,
        description: &str,
    ) -> Option<Result<Vec<Candidate>, GradingError>> {
        let web = self.web.as_ref()?;

        self.logger
            .external_call(trace_id, "NoveltyEvaluator", "SearchAPI", "search");
        let ext_timer = Timer::start();
        let result = web.search(clip(description, MAX_QUERY_BYTES)).await;
        if result.is_ok() {
            self.logger.external_done(
                trace_id,
                "NoveltyEvaluator",
                "SearchAPI",
                "search",
                ext_timer.elapsed_ms(),
            );
        }

        Some(result.map(|hits| {
            hits.into_iter()
                .map(|hit| Candidate {
                    text: hit.text(),
                    name: hit.title,
                    link: hit.link,
                })
                .collect()
        }))
    }

    async fn describe(
        &self,
        trace_id: &str,
        description: &str,
        outcome: &SourceOutcome,
    ) -> Result<String, GradingError> {
        let Some(candidate) = outcome.similar() else {
            return Ok(format!(
                "No closely similar project was found on {}, for a novelty score of {} out of 100.",
                outcome.label, outcome.score
            ));
        };

        let prompt = format!(
            "Startup description:\n{}\n\nExisting project \"{}\":\n{}",
            description, candidate.name, candidate.text
        );

        self.logger
            .external_call(trace_id, "NoveltyEvaluator", "OpenAI", "explain_similarity");
        let ext_timer = Timer::start();
        let explanation = self
            .model
            .complete(
                CompletionRequest::new(prompt)
                    .with_system(SIMILARITY_SYSTEM_PROMPT)
                    .max_tokens(300),
            )
            .await?;
        self.logger.external_done(
            trace_id,
            "NoveltyEvaluator",
            "OpenAI",
            "explain_similarity",
            ext_timer.elapsed_ms(),
        );

        Ok(format!(
            "Similar project found on {}: {} ({}), novelty score {} out of 100. {}",
            outcome.label,
            candidate.name,
            candidate.link,
            outcome.score,
            explanation.trim()
        ))
    }
}

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::ports::{ContentExtractor, LanguageModel, RepositorySource, Transcriber, WebSearch};
use crate::application::services::{
    GithubEvaluator, NoveltyEvaluator, PresentationEvaluator, StartupService,
};
use crate::config::AppConfig;
use crate::github::GitHubClient;
use crate::infrastructure::extraction::{PdfTextExtractor, VideoTranscriptExtractor};
use crate::infrastructure::logging::BoundaryLogger;
use crate::infrastructure::search::SearchApiClient;
use crate::llm::OpenAiClient;

/// AppContext - 서비스 기반 DI 컨테이너
///
/// 외부 클라이언트(GitHub, OpenAI, SearchAPI)를 설정에서 생성하고
/// Trait 포트를 통해 평가 서비스에 주입합니다.
#[derive(Clone)]
pub struct AppContext {
    // Services (Application Layer)
    pub startup_service: Arc<StartupService>,

    // Infrastructure
    pub logger: Arc<BoundaryLogger>,

    // Config
    pub max_upload_bytes: usize,
}

impl AppContext {
    /// Create a new AppContext with all dependencies wired up
    pub fn new(config: &AppConfig) -> Result<Self> {
        let limits = &config.limits;

        // 1. External clients
        let github: Arc<dyn RepositorySource> =
            Arc::new(GitHubClient::new(&config.github, limits.upstream_timeout)?);
        let openai = Arc::new(OpenAiClient::new(&config.openai, limits.upstream_timeout)?);
        let web = SearchApiClient::from_config(&config.search, limits.upstream_timeout, limits.novelty_results)?
            .map(|client| Arc::new(client) as Arc<dyn WebSearch>);

        if web.is_none() {
            info!("SEARCH_API_KEY not set, novelty is graded against GitHub only");
        }
        info!(model = openai.model(), "Language model configured");

        let model: Arc<dyn LanguageModel> = openai.clone();
        let transcriber: Arc<dyn Transcriber> = openai;

        // 2. Content extractors
        let video: Arc<dyn ContentExtractor> = Arc::new(VideoTranscriptExtractor::new(transcriber));
        let slides: Arc<dyn ContentExtractor> = Arc::new(PdfTextExtractor::new());

        // 3. Services with dependency injection
        let logger = Arc::new(BoundaryLogger::new());

        let github_evaluator = Arc::new(GithubEvaluator::new(
            github.clone(),
            model.clone(),
            limits.max_excerpt_files,
            logger.clone(),
        )?);
        let presentation_evaluator = Arc::new(PresentationEvaluator::new(
            video,
            slides,
            model.clone(),
            logger.clone(),
        ));
        let novelty_evaluator = Arc::new(NoveltyEvaluator::new(
            github,
            web,
            model,
            limits.novelty_results,
            logger.clone(),
        ));

        let startup_service = Arc::new(StartupService::new(
            github_evaluator,
            presentation_evaluator,
            novelty_evaluator,
            limits.evaluator_timeout,
            logger.clone(),
        ));

        Ok(Self::from_service(startup_service, logger, limits.max_upload_bytes))
    }

    pub fn from_service(
        startup_service: Arc<StartupService>,
        logger: Arc<BoundaryLogger>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            startup_service,
            logger,
            max_upload_bytes,
        }
    }
}

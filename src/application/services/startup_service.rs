use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::describe::ensure_description;
use super::{GithubEvaluator, NoveltyEvaluator, PresentationEvaluator};
use crate::error::GradingError;
use crate::infrastructure::logging::{BoundaryLogger, Timer};
use crate::models::{Aspect, GradeWithDescription, StartupGradingResponse, StartupSubmission};

/// StartupService - 세 평가기를 동시에 실행하고 결과를 하나의 응답으로 조립
///
/// 책임:
/// - 평가기별 타임아웃 적용
/// - 하나라도 실패하면 요청 전체 실패 (부분 결과 없음)
/// - 빈 설명 보정
pub struct StartupService {
    github: Arc<GithubEvaluator>,
    presentation: Arc<PresentationEvaluator>,
    novelty: Arc<NoveltyEvaluator>,
    evaluator_timeout: Duration,
    logger: Arc<BoundaryLogger>,
}

impl StartupService {
    pub fn new(
        github: Arc<GithubEvaluator>,
        presentation: Arc<PresentationEvaluator>,
        novelty: Arc<NoveltyEvaluator>,
        evaluator_timeout: Duration,
        logger: Arc<BoundaryLogger>,
    ) -> Self {
        Self {
            github,
            presentation,
            novelty,
            evaluator_timeout,
            logger,
        }
    }

    /// 제출물 채점
    pub async fn create_and_grade(
        &self,
        trace_id: &str,
        submission: StartupSubmission,
    ) -> Result<StartupGradingResponse, GradingError> {
        let timer = Timer::start();
        self.logger
            .service_entry(trace_id, "API", "StartupService", "create_and_grade", &submission);

        let result = tokio::try_join!(
            self.bounded(
                Aspect::Github,
                self.github.evaluate_repository(trace_id, &submission.repo),
            ),
            self.bounded(
                Aspect::Presentation,
                self.presentation.grade_presentation(
                    trace_id,
                    submission.presentation_video.as_ref(),
                    submission.presentation_pdf.as_ref(),
                ),
            ),
            self.bounded(
                Aspect::Novelty,
                self.novelty
                    .grade_novelty(trace_id, &submission.description, &submission.repo),
            ),
        );

        let (mut github, presentation, novelty) = match result {
            Ok(grades) => grades,
            Err(e) => {
                self.logger
                    .service_error(trace_id, "API", "StartupService", "create_and_grade", &e);
                return Err(e);
            }
        };

        github.description = ensure_description(Aspect::Github, github.grade, github.description);
        let presentation = finish(Aspect::Presentation, presentation);
        let novelty = finish(Aspect::Novelty, novelty);

        let response = StartupGradingResponse {
            submission_id: Uuid::new_v4(),
            name: submission.name,
            github_url: submission.github_url,
            graded_at: Utc::now(),
            github,
            presentation,
            novelty,
        };

        self.logger.service_exit(
            trace_id,
            "API",
            "StartupService",
            "create_and_grade",
            timer.elapsed_ms(),
            &format!(
                "github={} presentation={} novelty={}",
                response.github.grade, response.presentation.grade, response.novelty.grade
            ),
        );
        Ok(response)
    }

    async fn bounded<T>(
        &self,
        aspect: Aspect,
        evaluation: impl Future<Output = Result<T, GradingError>>,
    ) -> Result<T, GradingError> {
        tokio::time::timeout(self.evaluator_timeout, evaluation)
            .await
            .map_err(|_| {
                GradingError::UpstreamUnavailable(format!(
                    "{} evaluation timed out after {}s",
                    aspect,
                    self.evaluator_timeout.as_secs_f64()
                ))
            })?
    }
}

fn finish(aspect: Aspect, grade: GradeWithDescription) -> GradeWithDescription {
    GradeWithDescription {
        description: ensure_description(aspect, grade.grade, grade.description),
        grade: grade.grade,
    }
}

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::ports::{CompletionRequest, ContentExtractor, LanguageModel};
use crate::error::GradingError;
use crate::infrastructure::logging::{BoundaryLogger, Timer};
use crate::llm::reply;
use crate::models::{Grade, GradeWithDescription, Upload};

const SLIDES_SYSTEM_PROMPT: &str = r#"You review the slide deck of a startup presentation. You are given the text of the slides.
Judge the deck on:
- Simplicity: are the slides clear, concise and focused on one main idea each?
- Structure: is the narrative ordered logically, without clutter?
- Supporting material: are figures, numbers and examples used to back the message?
- Professionalism: is the vocabulary mature and the tone consistent?
- Overall impression.
Give an overall score from 0.0 to 100.0 (be specific, e.g. 87.3) and the three main issues.
Respond with JSON only, in exactly this shape:
{ "score": number, "main_issues": [string, string, string] }"#;

const PITCH_SYSTEM_PROMPT: &str = r#"You evaluate the spoken pitch of a startup from its transcript.
Score each criterion from 0 to 10 with a brief explanation:
1. clarity_of_message: is the idea, problem and solution clearly articulated?
2. value_proposition: is what makes the solution unique, and its value to users, explained?
3. structure_and_flow: is there a clear beginning, middle and end with smooth transitions?
4. engagement_and_persuasiveness: does the language hold attention and make a strong case?
5. relevance_to_tech_industry: does it address a current technology problem or opportunity?
6. scalability_and_growth_potential: does it cover market size and room to scale?
Then give overall_score from 0 to 100 and a short summary.
Respond with JSON only, in exactly this shape:
{
  "clarity_of_message": {"score": number, "explanation": string},
  "value_proposition": {"score": number, "explanation": string},
  "structure_and_flow": {"score": number, "explanation": string},
  "engagement_and_persuasiveness": {"score": number, "explanation": string},
  "relevance_to_tech_industry": {"score": number, "explanation": string},
  "scalability_and_growth_potential": {"score": number, "explanation": string},
  "overall_score": number,
  "summary": string
}"#;

const MAX_ISSUES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideReview {
    pub score: Grade,
    pub main_issues: Vec<String>,
}

impl SlideReview {
    pub fn parse(text: &str) -> Result<Self, GradingError> {
        let mut review: SlideReview = reply::decode(text)?;
        review.main_issues = review
            .main_issues
            .into_iter()
            .map(|issue| issue.trim().to_string())
            .filter(|issue| !issue.is_empty())
            .take(MAX_ISSUES)
            .collect();
        Ok(review)
    }

    fn describe(&self) -> String {
        if self.main_issues.is_empty() {
            return format!("Slides ({}): no major issues noted.", self.score);
        }
        format!("Slides ({}): main issues: {}.", self.score, self.main_issues.join("; "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchCriterion {
    pub score: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchReview {
    pub clarity_of_message: PitchCriterion,
    pub value_proposition: PitchCriterion,
    pub structure_and_flow: PitchCriterion,
    pub engagement_and_persuasiveness: PitchCriterion,
    pub relevance_to_tech_industry: PitchCriterion,
    pub scalability_and_growth_potential: PitchCriterion,
    pub overall_score: Grade,
    pub summary: String,
}

impl PitchReview {
    pub fn parse(text: &str) -> Result<Self, GradingError> {
        let review: PitchReview = reply::decode(text)?;
        for (name, criterion) in review.criteria() {
            if !(0.0..=10.0).contains(&criterion.score) {
                return Err(GradingError::Parse(format!(
                    "pitch criterion {} scored {} outside 0-10",
                    name, criterion.score
                )));
            }
        }
        Ok(review)
    }

    fn criteria(&self) -> [(&'static str, &PitchCriterion); 6] {
        [
            ("clarity_of_message", &self.clarity_of_message),
            ("value_proposition", &self.value_proposition),
            ("structure_and_flow", &self.structure_and_flow),
            ("engagement_and_persuasiveness", &self.engagement_and_persuasiveness),
            ("relevance_to_tech_industry", &self.relevance_to_tech_industry),
            ("scalability_and_growth_potential", &self.scalability_and_growth_potential),
        ]
    }

    fn describe(&self) -> String {
        format!("Pitch ({}): {}", self.overall_score, self.summary.trim())
    }
}

/// PresentationEvaluator - 발표 영상(전사)과 슬라이드 PDF(텍스트)를 채점
pub struct PresentationEvaluator {
    video: Arc<dyn ContentExtractor>,
    slides: Arc<dyn ContentExtractor>,
    model: Arc<dyn LanguageModel>,
    logger: Arc<BoundaryLogger>,
}

impl PresentationEvaluator {
    pub fn new(
        video: Arc<dyn ContentExtractor>,
        slides: Arc<dyn ContentExtractor>,
        model: Arc<dyn LanguageModel>,
        logger: Arc<BoundaryLogger>,
    ) -> Self {
        Self {
            video,
            slides,
            model,
            logger,
        }
    }

    pub async fn grade_presentation(
        &self,
        trace_id: &str,
        video: Option<&Upload>,
        pdf: Option<&Upload>,
    ) -> Result<GradeWithDescription, GradingError> {
        let timer = Timer::start();
        let params = (video.map(Upload::len), pdf.map(Upload::len));
        self.logger
            .service_entry(trace_id, "StartupService", "PresentationEvaluator", "grade_presentation", &params);

        let result = self.grade_inner(trace_id, video, pdf).await;
        match &result {
            Ok(grade) => self.logger.service_exit(
                trace_id,
                "StartupService",
                "PresentationEvaluator",
                "grade_presentation",
                timer.elapsed_ms(),
                &format!("grade={}", grade.grade),
            ),
            Err(e) => self.logger.service_error(
                trace_id,
                "StartupService",
                "PresentationEvaluator",
                "grade_presentation",
                e,
            ),
        }
        result
    }

    async fn grade_inner(
        &self,
        trace_id: &str,
        video: Option<&Upload>,
        pdf: Option<&Upload>,
    ) -> Result<GradeWithDescription, GradingError> {
        let (transcript, slide_text) = tokio::try_join!(
            self.extract(trace_id, self.video.as_ref(), video),
            self.extract(trace_id, self.slides.as_ref(), pdf),
        )?;

        if transcript.is_none() && slide_text.is_none() {
            return Err(GradingError::Extraction(
                "neither the video nor the PDF produced any text".into(),
            ));
        }

        let (pitch, slides) = tokio::try_join!(
            async {
                match &transcript {
                    Some(text) => self.review_pitch(trace_id, text).await.map(Some),
                    None => Ok(None),
                }
            },
            async {
                match &slide_text {
                    Some(text) => self.review_slides(trace_id, text).await.map(Some),
                    None => Ok(None),
                }
            },
        )?;

        let mut grades = Vec::with_capacity(2);
        let mut parts = Vec::with_capacity(2);
        if let Some(pitch) = &pitch {
            grades.push(pitch.overall_score);
            parts.push(pitch.describe());
        }
        if let Some(slides) = &slides {
            grades.push(slides.score);
            parts.push(slides.describe());
        }

        let grade = Grade::mean(&grades)
            .ok_or_else(|| GradingError::Internal("no presentation component was graded".into()))?;

        Ok(GradeWithDescription {
            grade,
            description: parts.join("\n\n"),
        })
    }

    async fn extract(
        &self,
        trace_id: &str,
        extractor: &dyn ContentExtractor,
        upload: Option<&Upload>,
    ) -> Result<Option<String>, GradingError> {
        let Some(upload) = upload.filter(|u| !u.is_empty()) else {
            return Ok(None);
        };

        self.logger
            .external_call(trace_id, "PresentationEvaluator", extractor.name(), "extract");
        let ext_timer = Timer::start();
        match extractor.extract(upload).await {
            Ok(text) => {
                self.logger.external_done(
                    trace_id,
                    "PresentationEvaluator",
                    extractor.name(),
                    "extract",
                    ext_timer.elapsed_ms(),
                );
                Ok(text.filter(|t| !t.trim().is_empty()))
            }
            Err(e @ GradingError::UpstreamAuth(_)) => {
                self.logger
                    .external_error(trace_id, "PresentationEvaluator", extractor.name(), "extract", &e);
                Err(e)
            }
            // The other upload may still be gradable
            Err(e) => {
                self.logger
                    .external_skipped(trace_id, "PresentationEvaluator", extractor.name(), "extract", &e);
                Ok(None)
            }
        }
    }

    async fn review_slides(&self, trace_id: &str, text: &str) -> Result<SlideReview, GradingError> {
        self.logger
            .external_call(trace_id, "PresentationEvaluator", "OpenAI", "review_slides");
        let ext_timer = Timer::start();
        let reply = self
            .model
            .complete(
                CompletionRequest::new(format!("Slide text:\n\n{}", text))
                    .with_system(SLIDES_SYSTEM_PROMPT)
                    .expect_json()
                    .temperature(0.2),
            )
            .await?;
        self.logger.external_done(
            trace_id,
            "PresentationEvaluator",
            "OpenAI",
            "review_slides",
            ext_timer.elapsed_ms(),
        );
        SlideReview::parse(&reply)
    }

    async fn review_pitch(&self, trace_id: &str, transcript: &str) -> Result<PitchReview, GradingError> {
        self.logger
            .external_call(trace_id, "PresentationEvaluator", "OpenAI", "review_pitch");
        let ext_timer = Timer::start();
        let reply = self
            .model
            .complete(
                CompletionRequest::new(format!("Transcription:\n\n{}", transcript))
                    .with_system(PITCH_SYSTEM_PROMPT)
                    .expect_json()
                    .temperature(0.2),
            )
            .await?;
        self.logger.external_done(
            trace_id,
            "PresentationEvaluator",
            "OpenAI",
            "review_pitch",
            ext_timer.elapsed_ms(),
        );
        PitchReview::parse(&reply)
    }
}

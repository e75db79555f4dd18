use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    http::HeaderMap,
    Json,
};

use crate::error::GradingError;
use crate::github::RepoRef;
use crate::infrastructure::logging::{TraceContext, Timer};
use crate::models::{StartupGradingResponse, StartupSubmission, Upload};
use crate::state::AppContext;

const SUBMIT_PATH: &str = "/startups/submit";

/// POST /startups/submit
pub async fn submit_startup(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StartupGradingResponse>, GradingError> {
    let trace_id = TraceContext::extract_or_generate(&headers);
    let timer = Timer::start();

    let content_length = headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    ctx.logger.api_entry(
        &trace_id,
        "POST",
        SUBMIT_PATH,
        &format!("content_length={}", content_length),
    );

    let result = async {
        let multipart = multipart.map_err(|e| GradingError::InvalidInput(e.body_text()))?;
        let submission = SubmissionForm::read(multipart).await?.validate()?;
        ctx.startup_service.create_and_grade(&trace_id, submission).await
    }
    .await;

    match result {
        Ok(response) => {
            ctx.logger
                .api_exit(&trace_id, "POST", SUBMIT_PATH, timer.elapsed_ms(), 200);
            Ok(Json(response))
        }
        Err(e) => {
            ctx.logger
                .api_error(&trace_id, "POST", SUBMIT_PATH, timer.elapsed_ms(), &e);
            Err(e)
        }
    }
}

/// Raw multipart fields before validation
#[derive(Debug, Default)]
struct SubmissionForm {
    name: Option<String>,
    description: Option<String>,
    github_url: Option<String>,
    presentation_video: Option<Upload>,
    presentation_pdf: Option<Upload>,
}

impl SubmissionForm {
    async fn read(mut multipart: Multipart) -> Result<Self, GradingError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "name" => form.name = Some(field.text().await.map_err(malformed)?),
                "description" => form.description = Some(field.text().await.map_err(malformed)?),
                "github_url" => form.github_url = Some(field.text().await.map_err(malformed)?),
                "presentation_video" => form.presentation_video = Some(read_upload(field).await?),
                "presentation_pdf" => form.presentation_pdf = Some(read_upload(field).await?),
                // Unknown fields are ignored
                _ => {}
            }
        }

        Ok(form)
    }

    fn validate(self) -> Result<StartupSubmission, GradingError> {
        let name = required("name", self.name)?;
        let description = required("description", self.description)?;
        let github_url = required("github_url", self.github_url)?;
        let repo = RepoRef::parse(&github_url)
            .map_err(|e| GradingError::InvalidInput(format!("github_url: {}", e)))?;

        let presentation_video = self.presentation_video.filter(|u| !u.is_empty());
        let presentation_pdf = self.presentation_pdf.filter(|u| !u.is_empty());
        if presentation_video.is_none() && presentation_pdf.is_none() {
            return Err(GradingError::InvalidInput(
                "at least one of presentation_video or presentation_pdf is required".into(),
            ));
        }

        Ok(StartupSubmission {
            name,
            description,
            github_url,
            repo,
            presentation_video,
            presentation_pdf,
        })
    }
}

async fn read_upload(field: Field<'_>) -> Result<Upload, GradingError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(malformed)?;
    Ok(Upload::new(file_name, content_type, bytes.to_vec()))
}

fn required(field: &str, value: Option<String>) -> Result<String, GradingError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GradingError::InvalidInput(format!("{} is required", field))),
    }
}

fn malformed(err: axum::extract::multipart::MultipartError) -> GradingError {
    GradingError::InvalidInput(format!("malformed multipart body: {}", err.body_text()))
}

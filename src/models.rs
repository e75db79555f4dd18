use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::github::RepoRef;

/// Score in [0, 100] with one-decimal precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(f64);

impl Grade {
    pub const MAX: Grade = Grade(100.0);

    /// Rejects NaN and values outside [0, 100]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Some(Self(round1(value)))
        } else {
            None
        }
    }

    /// Clamps computed values into range; NaN becomes 0
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(round1(value.clamp(0.0, 100.0)))
    }

    pub fn mean(grades: &[Grade]) -> Option<Grade> {
        if grades.is_empty() {
            return None;
        }
        let total: f64 = grades.iter().map(|g| g.0).sum();
        Some(Self::saturating(total / grades.len() as f64))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Grade {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Grade::new(value).ok_or_else(|| format!("grade {} is outside 0-100", value))
    }
}

impl From<Grade> for f64 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Github,
    Presentation,
    Novelty,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Aspect::Github => "GitHub repository",
            Aspect::Presentation => "Presentation",
            Aspect::Novelty => "Novelty",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeWithDescription {
    pub grade: Grade,
    pub description: String,
}

/// An uploaded presentation file, buffered in memory
#[derive(Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: Option<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A validated submission, alive for the duration of one request
#[derive(Debug, Clone)]
pub struct StartupSubmission {
    pub name: String,
    pub description: String,
    pub github_url: String,
    pub repo: RepoRef,
    pub presentation_video: Option<Upload>,
    pub presentation_pdf: Option<Upload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub grade: Grade,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub structure: Criterion,
    pub code_quality: Criterion,
    pub security: Criterion,
    pub documentation: Criterion,
    pub efficiency: Criterion,
    pub tech_stack: Criterion,
}

impl Criteria {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Criterion)> {
        [
            ("Structure", &self.structure),
            ("Code quality", &self.code_quality),
            ("Security", &self.security),
            ("Documentation", &self.documentation),
            ("Efficiency", &self.efficiency),
            ("Tech stack", &self.tech_stack),
        ]
        .into_iter()
    }

    pub fn overall(&self) -> Grade {
        let grades: Vec<Grade> = self.iter().map(|(_, c)| c.grade).collect();
        Grade::mean(&grades).unwrap_or(Grade::saturating(0.0))
    }
}

/// GitHub grade plus the extended repository fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubGrade {
    pub grade: Grade,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub summary: String,
    pub criteria: Criteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupGradingResponse {
    pub submission_id: Uuid,
    pub name: String,
    pub github_url: String,
    pub graded_at: DateTime<Utc>,
    pub github: GithubGrade,
    pub presentation: GradeWithDescription,
    pub novelty: GradeWithDescription,
}

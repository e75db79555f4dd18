use crate::models::{Aspect, Grade};

fn band(grade: Grade) -> &'static str {
    match grade.value() {
        v if v >= 85.0 => "excellent",
        v if v >= 70.0 => "strong",
        v if v >= 50.0 => "moderate",
        v if v >= 30.0 => "weak",
        _ => "poor",
    }
}

/// Fallback description for an evaluator that produced none
pub fn describe_grade(aspect: Aspect, grade: Grade) -> String {
    format!("{} scored {} out of 100, which is {}.", aspect, grade, band(grade))
}

/// Keep a non-blank description, otherwise synthesize one
pub fn ensure_description(aspect: Aspect, grade: Grade, description: String) -> String {
    if description.trim().is_empty() {
        describe_grade(aspect, grade)
    } else {
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(v: f64) -> Grade {
        Grade::new(v).unwrap()
    }

    #[test]
    fn test_bands() {
        assert_eq!(
            describe_grade(Aspect::Novelty, grade(91.0)),
            "Novelty scored 91.0 out of 100, which is excellent."
        );
        assert!(describe_grade(Aspect::Github, grade(70.0)).ends_with("strong."));
        assert!(describe_grade(Aspect::Presentation, grade(49.9)).ends_with("weak."));
        assert!(describe_grade(Aspect::Presentation, grade(0.0)).ends_with("poor."));
    }

    #[test]
    fn test_ensure_description_keeps_text() {
        assert_eq!(ensure_description(Aspect::Github, grade(50.0), "Solid".into()), "Solid");
        assert_eq!(
            ensure_description(Aspect::Github, grade(50.0), "  ".into()),
            "GitHub repository scored 50.0 out of 100, which is moderate."
        );
    }
}

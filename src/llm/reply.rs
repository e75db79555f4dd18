use serde::de::DeserializeOwned;

use crate::error::GradingError;
use crate::text::ellipsize;

/// Locate the JSON object in a model reply
///
/// Models sometimes wrap JSON in ```json fences or add a sentence around it;
/// everything outside the outermost braces is dropped.
pub fn json_body(reply: &str) -> &str {
    let trimmed = reply.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Strict typed decode of a model reply
pub fn decode<T: DeserializeOwned>(reply: &str) -> Result<T, GradingError> {
    serde_json::from_str(json_body(reply)).map_err(|e| {
        GradingError::Parse(format!("{} in reply: {}", e, ellipsize(reply.trim(), 200)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        score: f64,
        summary: String,
    }

    #[test]
    fn test_plain_json() {
        let reply: Reply = decode(r#"{"score": 81.5, "summary": "solid"}"#).unwrap();
        assert_eq!(reply, Reply { score: 81.5, summary: "solid".into() });
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"score\": 40, \"summary\": \"weak\"}\n```";
        let reply: Reply = decode(text).unwrap();
        assert_eq!(reply.score, 40.0);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let err = decode::<Reply>(r#"{"score": 40}"#).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn test_prose_is_parse_error() {
        let err = decode::<Reply>("I cannot grade this repository.").unwrap_err();
        assert!(matches!(err, GradingError::Parse(_)));
    }
}

use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Judge severity. Unknown, missing or null values coming off the wire are read as `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Ordering key, most severe first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            other => {
                debug!("Unknown severity '{other}', treating as info");
                Severity::Info
            }
        }
    }
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(Severity::from).unwrap_or_default())
}

/// Edit a judge proposes for the first line of its annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    /// Text to replace; empty means the whole block.
    #[serde(default)]
    pub original: String,
    pub replacement: String,
}

/// One judge finding, anchored by 1-based review lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub judge_id: String,
    pub judge_name: String,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SuggestionPayload>,
}

/// Everything one review pass returns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("failed to read review payload: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed review payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("review payload must be an object or an array of annotations, got {0}")]
    Shape(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl ReviewPayload {
    /// Parses a payload; a bare JSON array is accepted as the annotation list.
    ///
    /// Annotations are read one at a time: a record that does not fit (missing
    /// id, negative line, wrong types) is logged and skipped, the rest survive.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let (review_id, records) = match serde_json::from_str::<Value>(json)? {
            Value::Array(records) => (None, records),
            Value::Object(mut fields) => {
                let review_id = fields
                    .remove("reviewId")
                    .and_then(|id| id.as_str().map(str::to_string));
                let records = match fields.remove("annotations") {
                    Some(Value::Array(records)) => records,
                    None | Some(Value::Null) => Vec::new(),
                    Some(other) => {
                        warn!("Ignoring annotations field of type {}", json_kind(&other));
                        Vec::new()
                    }
                };
                (review_id, records)
            }
            other => return Err(PayloadError::Shape(json_kind(&other))),
        };

        let annotations = records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| match serde_json::from_value::<Annotation>(record) {
                Ok(annotation) => Some(annotation),
                Err(err) => {
                    warn!("Skipping malformed annotation #{idx}: {err}");
                    None
                }
            })
            .collect();

        Ok(ReviewPayload {
            review_id,
            annotations,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, PayloadError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "reviewId": "pass-1",
        "annotations": [
            {
                "id": "a1",
                "judgeId": "fact_integrity_reviewer",
                "judgeName": "Fact Integrity Reviewer",
                "severity": "CRITICAL",
                "message": "Unsupported claim",
                "criterion": "accuracy",
                "startLine": 2,
                "endLine": 3,
                "suggestion": { "original": "always", "replacement": "often" }
            },
            {
                "id": "a2",
                "judgeId": "style",
                "judgeName": "Style Judge",
                "severity": "nitpick",
                "message": "Wordy",
                "startLine": 5,
                "endLine": 5
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_payload() {
        let payload = ReviewPayload::from_json(PAYLOAD).unwrap();

        assert_eq!(payload.review_id.as_deref(), Some("pass-1"));
        assert_eq!(payload.annotations.len(), 2);

        let first = &payload.annotations[0];
        assert_eq!(first.severity, Severity::Critical);
        assert_eq!(first.criterion.as_deref(), Some("accuracy"));
        assert_eq!((first.start_line, first.end_line), (2, 3));
        assert_eq!(
            first.suggestion,
            Some(SuggestionPayload {
                original: "always".to_string(),
                replacement: "often".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_severity_falls_back_to_info() {
        let payload = ReviewPayload::from_json(PAYLOAD).unwrap();
        assert_eq!(payload.annotations[1].severity, Severity::Info);
        assert!(payload.annotations[1].suggestion.is_none());
    }

    #[test]
    fn test_bare_annotation_array() {
        let json = r#"[{"id":"x","judgeId":"j","judgeName":"J","severity":"warning",
                       "message":"m","startLine":1,"endLine":1}]"#;
        let payload = ReviewPayload::from_json(json).unwrap();
        assert!(payload.review_id.is_none());
        assert_eq!(payload.annotations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_null_or_missing_severity_is_info() {
        let json = r#"[
            {"id":"a","judgeId":"j","judgeName":"J","severity":"critical",
             "message":"m","startLine":1,"endLine":1},
            {"id":"b","judgeId":"j","judgeName":"J","severity":null,
             "message":"m","startLine":2,"endLine":2},
            {"id":"c","judgeId":"j","judgeName":"J",
             "message":"m","startLine":3,"endLine":3}
        ]"#;
        let payload = ReviewPayload::from_json(json).unwrap();

        let severities: Vec<Severity> = payload.annotations.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::Info, Severity::Info]);
    }

    #[test]
    fn test_bad_record_is_skipped_not_fatal() {
        let json = r#"{"reviewId":"r","annotations":[
            {"id":"good","judgeId":"j","judgeName":"J","severity":"warning",
             "message":"m","startLine":1,"endLine":1},
            {"id":"neg","judgeId":"j","judgeName":"J","severity":"warning",
             "message":"m","startLine":-4,"endLine":1},
            {"judgeId":"j","message":"no id"},
            "not an object"
        ]}"#;
        let payload = ReviewPayload::from_json(json).unwrap();

        assert_eq!(payload.review_id.as_deref(), Some("r"));
        let ids: Vec<&str> = payload.annotations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(matches!(
            ReviewPayload::from_json("42"),
            Err(PayloadError::Shape("a number"))
        ));
        assert!(matches!(
            ReviewPayload::from_json("{not json"),
            Err(PayloadError::Json(_))
        ));
        assert!(matches!(
            ReviewPayload::from_path(Path::new("/definitely/not/here.json")),
            Err(PayloadError::Io(_))
        ));
    }
}

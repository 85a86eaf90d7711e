//! Turns the model's untyped text reply into a
//! validated analysis payload.
//!
//! Only the three core fields are validated; everything else the model sends
//! passes through as opaque JSON for forward compatibility. A malformed reply
//! is a terminal error for the request (the bounded retry lives in the
//! gateway, below the parse).

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has the wrong shape: {detail}")]
    InvalidField {
        field: &'static str,
        detail: String,
    },
}

/// A validated analysis result.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub overall_score: i64,
    pub keyword_analysis: Value,
    pub formatting_score: Value,
    /// Everything the model sent beyond the validated fields.
    pub extra: Map<String, Value>,
}

impl ParsedAnalysis {
    /// Serializes back to the client payload shape, stamping the model that
    /// actually produced it.
    pub fn into_payload(self, model_used: &str) -> Value {
        let mut payload = self.extra;
        payload.insert("overallScore".to_string(), self.overall_score.into());
        payload.insert("keywordAnalysis".to_string(), self.keyword_analysis);
        payload.insert("atsFormattingScore".to_string(), self.formatting_score);
        payload.insert("modelUsed".to_string(), model_used.into());
        Value::Object(payload)
    }
}

/// Strips a single fence, parses JSON, and validates the required fields.
pub fn normalize_response(raw: &str) -> Result<ParsedAnalysis, NormalizeError> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))?;
    let Value::Object(mut fields) = value else {
        return Err(NormalizeError::NotAnObject);
    };

    let overall_score = fields
        .remove("overallScore")
        .ok_or(NormalizeError::MissingField("overallScore"))?;
    let overall_score = overall_score
        .as_f64()
        .map(|f| f.round() as i64)
        .filter(|s| (0..=100).contains(s))
        .ok_or_else(|| NormalizeError::InvalidField {
            field: "overallScore",
            detail: format!("expected an integer 0-100, got {overall_score}"),
        })?;

    let keyword_analysis = take_object(&mut fields, "keywordAnalysis")?;
    let formatting_score = take_object(&mut fields, "atsFormattingScore")?;

    Ok(ParsedAnalysis {
        overall_score,
        keyword_analysis,
        formatting_score,
        extra: fields,
    })
}

fn take_object(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Value, NormalizeError> {
    let value = fields
        .remove(name)
        .ok_or(NormalizeError::MissingField(name))?;
    if !value.is_object() {
        return Err(NormalizeError::InvalidField {
            field: name,
            detail: "expected a JSON object".to_string(),
        });
    }
    Ok(value)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "overallScore": 72,
        "keywordAnalysis": {"foundKeywords": ["rust"], "missingKeywords": ["kafka"]},
        "atsFormattingScore": {"score": 85, "issues": []}
    }"#;

    #[test]
    fn test_minimal_valid_response_normalizes() {
        let parsed = normalize_response(MINIMAL).unwrap();
        assert_eq!(parsed.overall_score, 72);
        assert_eq!(parsed.keyword_analysis["foundKeywords"][0], "rust");
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_fenced_response_is_stripped_and_parsed() {
        let fenced = format!("```json\n{MINIMAL}\n```");
        let parsed = normalize_response(&fenced).unwrap();
        assert_eq!(parsed.overall_score, 72);
    }

    #[test]
    fn test_bare_fence_is_stripped() {
        let fenced = format!("```\n{MINIMAL}\n```");
        assert!(normalize_response(&fenced).is_ok());
    }

    #[test]
    fn test_missing_overall_score_fails_typed() {
        let raw = r#"{"keywordAnalysis": {}, "atsFormattingScore": {}}"#;
        let err = normalize_response(raw).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("overallScore")));
    }

    #[test]
    fn test_missing_keyword_analysis_fails_typed() {
        let raw = r#"{"overallScore": 50, "atsFormattingScore": {}}"#;
        let err = normalize_response(raw).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MissingField("keywordAnalysis")
        ));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let raw = r#"{"overallScore": 180, "keywordAnalysis": {}, "atsFormattingScore": {}}"#;
        assert!(matches!(
            normalize_response(raw).unwrap_err(),
            NormalizeError::InvalidField { field: "overallScore", .. }
        ));
    }

    #[test]
    fn test_non_json_reply_fails_typed() {
        assert!(matches!(
            normalize_response("I'm sorry, I can't do that").unwrap_err(),
            NormalizeError::Parse(_)
        ));
    }

    #[test]
    fn test_extra_fields_pass_through_unchanged() {
        let raw = r#"{
            "overallScore": 60,
            "keywordAnalysis": {},
            "atsFormattingScore": {},
            "actionableAdvice": ["quantify your impact"],
            "experienceRelevance": {"score": 55}
        }"#;
        let parsed = normalize_response(raw).unwrap();
        let payload = parsed.into_payload("provider/model:free");
        assert_eq!(payload["actionableAdvice"][0], "quantify your impact");
        assert_eq!(payload["experienceRelevance"]["score"], 55);
        assert_eq!(payload["modelUsed"], "provider/model:free");
    }

    #[test]
    fn test_array_reply_rejected_as_not_an_object() {
        assert!(matches!(
            normalize_response("[1, 2, 3]").unwrap_err(),
            NormalizeError::NotAnObject
        ));
    }
}

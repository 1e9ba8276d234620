//! Best-effort recovery of a JSON value from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::GenerationError;

// Matches an object with at most one level of nested objects. Braces inside
// string literals are not understood.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*((\{[^{}]*\})[^{}]*)*\}").expect("JSON object pattern is valid")
});

/// Returns the body of the first ```json fence, else of the first bare fence,
/// else the input unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };

    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}

/// Parses the reply as JSON, falling back to the first JSON-like substring.
pub fn extract_json(reply: &str) -> Result<Value, GenerationError> {
    let text = strip_code_fence(reply);

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "Reply is not plain JSON, searching for an embedded object");
            let candidate = JSON_OBJECT
                .find(text)
                .ok_or(GenerationError::UnparseableResponse)?;
            serde_json::from_str(candidate.as_str())
                .map_err(|_| GenerationError::UnparseableResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLAN: &str = r#"{"coverDescription": "A lighthouse at dusk", "chapters": [{"title": "One", "summary": "Start"}]}"#;

    #[test]
    fn test_strip_json_fence() {
        let reply = format!("Sure!\n```json\n{}\n```\nEnjoy.", PLAN);
        assert_eq!(strip_code_fence(&reply), PLAN);
    }

    #[test]
    fn test_strip_bare_fence() {
        let reply = format!("```\n{}\n```", PLAN);
        assert_eq!(strip_code_fence(&reply), PLAN);
    }

    #[test]
    fn test_strip_unterminated_fence() {
        let reply = format!("```json\n{}\n", PLAN);
        assert_eq!(strip_code_fence(&reply), PLAN);
    }

    #[test]
    fn test_no_fence_is_unchanged() {
        assert_eq!(strip_code_fence("  plain text  "), "  plain text  ");
    }

    #[test]
    fn test_fenced_and_unfenced_reply_agree() {
        let fenced = extract_json(&format!("```json\n{}\n```", PLAN)).unwrap();
        let unfenced = extract_json(PLAN).unwrap();
        assert_eq!(fenced, unfenced);
        assert_eq!(fenced["coverDescription"], "A lighthouse at dusk");
    }

    #[test]
    fn test_embedded_object_is_recovered() {
        let reply = format!("Here is the plan you asked for: {} Let me know!", PLAN);
        let value = extract_json(&reply).unwrap();
        assert_eq!(value["chapters"][0]["title"], "One");
    }

    #[test]
    fn test_first_embedded_object_wins() {
        let value = extract_json(r#"first {"a": 1} then {"b": 2}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_reply_without_json_is_unparseable() {
        let err = extract_json("I cannot help with that request.").unwrap_err();
        assert!(matches!(err, GenerationError::UnparseableResponse));
    }

    #[test]
    fn test_broken_embedded_object_is_unparseable() {
        let err = extract_json("result: {not: valid, json}").unwrap_err();
        assert!(matches!(err, GenerationError::UnparseableResponse));
    }
}

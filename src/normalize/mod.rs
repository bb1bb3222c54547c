//! Response normalization.
//!
//! Cleans upstream text and, for structured requests, turns it into a JSON
//! object. The upstream sometimes wraps its answer in markdown fences even
//! when told not to; those are always removed first.

use crate::analysis::ExpectedShape;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

/// Successful, externally visible result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum NormalizedResponse {
    Json(Value),
    Text(String),
}

impl NormalizedResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedResponse::Json(_) => "json",
            NormalizedResponse::Text(_) => "text",
        }
    }

    /// HTTP body: the parsed object itself, or `{ "text": ... }`.
    pub fn into_body(self) -> Value {
        match self {
            NormalizedResponse::Json(value) => value,
            NormalizedResponse::Text(text) => serde_json::json!({ "text": text }),
        }
    }
}

/// Upstream content that does not have the requested shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("upstream text is not valid JSON: {0}")]
    NotJson(String),

    #[error("upstream JSON is a {0}, expected an object")]
    NotObject(&'static str),
}

const FENCE: &str = "```";

/// Remove markdown code-fence delimiters and surrounding whitespace.
///
/// Every fence line is dropped wherever it appears, including after a
/// lead-in sentence. Handles an optional info string on the opening fence
/// (```` ```json ````, ```` ```html ````) and single-line fences.
pub fn strip_code_fences(raw: &str) -> Cow<'_, str> {
    let text = raw.trim();
    if !text.contains(FENCE) {
        return Cow::Borrowed(text);
    }
    let kept: Vec<&str> = text.lines().filter_map(strip_fence_line).collect();
    Cow::Owned(kept.join("\n").trim().to_string())
}

/// One line with its fence markers removed; `None` for a bare delimiter.
fn strip_fence_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        // closing fence glued to the last content line
        return Some(trimmed.strip_suffix(FENCE).map(str::trim_end).unwrap_or(line));
    };
    let rest = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim();
    let rest = rest.strip_suffix(FENCE).unwrap_or(rest).trim();
    (!rest.is_empty()).then_some(rest)
}

/// Normalize raw upstream text for the requested shape.
pub fn normalize(raw: &str, shape: ExpectedShape) -> Result<NormalizedResponse, ShapeError> {
    let cleaned = strip_code_fences(raw);
    match shape {
        ExpectedShape::FreeText => Ok(NormalizedResponse::Text(cleaned.into_owned())),
        ExpectedShape::StructuredJson => parse_object(&cleaned).map(NormalizedResponse::Json),
    }
}

fn parse_object(text: &str) -> Result<Value, ShapeError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(err) => outermost_object(text)
            .and_then(|span| serde_json::from_str::<Value>(span).ok())
            .ok_or_else(|| ShapeError::NotJson(err.to_string()))?,
    };
    match value {
        Value::Object(_) => Ok(value),
        other => Err(ShapeError::NotObject(json_type(&other))),
    }
}

/// Span from the first `{` to the last `}`, for answers with stray prose
/// around the object.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fenced_json() {
        let raw = "```json\n{\"fgValue\":42}\n```";
        assert_eq!(strip_code_fences(raw), "{\"fgValue\":42}");
    }

    #[test]
    fn test_strip_fence_without_info_string() {
        assert_eq!(strip_code_fences("  ```\n<div>a</div>\n```  \n"), "<div>a</div>");
    }

    #[test]
    fn test_strip_single_line_fence() {
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  plain answer \n"), "plain answer");
        assert_eq!(strip_code_fences(""), "");
        assert_eq!(strip_code_fences("```"), "");
    }

    #[test]
    fn test_strip_fence_after_lead_in_sentence() {
        let raw = "以下がランキングです。\n```html\n<div class=\"rank-item\">A</div>\n```";
        assert_eq!(
            strip_code_fences(raw),
            "以下がランキングです。\n<div class=\"rank-item\">A</div>"
        );
    }

    #[test]
    fn test_strip_keeps_indentation_inside_fence() {
        let raw = "```html\n<ul>\n  <li>A</li>\n</ul>\n```";
        assert_eq!(strip_code_fences(raw), "<ul>\n  <li>A</li>\n</ul>");
    }

    #[test]
    fn test_free_text_with_lead_in_has_no_fences() {
        let raw = "以下がランキングです。\n```html\n<div class=\"rank-item\">A</div>\n```";
        let response = normalize(raw, ExpectedShape::FreeText).unwrap();
        assert_eq!(
            response,
            NormalizedResponse::Text(
                "以下がランキングです。\n<div class=\"rank-item\">A</div>".to_string()
            )
        );
    }

    #[test]
    fn test_structured_json_with_lead_in_and_fence() {
        let raw = "最新のデータです。\n```json\n{\"fgValue\": 55, \"fgLabel\": \"Neutral\"}\n```\n以上です。";
        let response = normalize(raw, ExpectedShape::StructuredJson).unwrap();
        assert_eq!(
            response,
            NormalizedResponse::Json(json!({"fgValue": 55, "fgLabel": "Neutral"}))
        );
    }

    #[test]
    fn test_fenced_market_data_normalizes_to_object() {
        let raw = "```json\n{\"fgValue\":42,\"fgLabel\":\"Fear\",\"usdJpy\":149.8,\"usdJpyChange\":-0.35,\"nikkei\":38500.1,\"sp500\":5600.2}\n```";
        let response = normalize(raw, ExpectedShape::StructuredJson).unwrap();

        assert_eq!(response.kind(), "json");
        assert_eq!(
            response.into_body(),
            json!({
                "fgValue": 42,
                "fgLabel": "Fear",
                "usdJpy": 149.8,
                "usdJpyChange": -0.35,
                "nikkei": 38500.1,
                "sp500": 5600.2
            })
        );
    }

    #[test]
    fn test_malformed_json_is_shape_error() {
        let raw = "```json\n{\"fgValue\":42,\n```";
        let err = normalize(raw, ExpectedShape::StructuredJson).unwrap_err();
        assert!(matches!(err, ShapeError::NotJson(_)));
    }

    #[test]
    fn test_non_object_json_is_shape_error() {
        let err = normalize("[1,2,3]", ExpectedShape::StructuredJson).unwrap_err();
        assert_eq!(err, ShapeError::NotObject("array"));

        let err = normalize("\"hello\"", ExpectedShape::StructuredJson).unwrap_err();
        assert_eq!(err, ShapeError::NotObject("string"));
    }

    #[test]
    fn test_object_surrounded_by_prose() {
        let raw = "Here is the data you asked for:\n{\"fgValue\": 70, \"fgLabel\": \"Greed\"}\nThanks!";
        let response = normalize(raw, ExpectedShape::StructuredJson).unwrap();
        assert_eq!(
            response,
            NormalizedResponse::Json(json!({"fgValue": 70, "fgLabel": "Greed"}))
        );
    }

    #[test]
    fn test_free_text_is_returned_cleaned() {
        let raw = "```html\n<div class=\"rank-item\">トヨタ自動車（7203）</div>\n```";
        let response = normalize(raw, ExpectedShape::FreeText).unwrap();
        assert_eq!(
            response,
            NormalizedResponse::Text("<div class=\"rank-item\">トヨタ自動車（7203）</div>".into())
        );
    }

    #[test]
    fn test_free_text_is_not_validated() {
        let response = normalize("{not json at all", ExpectedShape::FreeText).unwrap();
        assert_eq!(response.into_body(), json!({"text": "{not json at all"}));
    }
}

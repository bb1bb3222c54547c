//! Request classification.
//!
//! Maps an inbound analysis request onto the prompt that will be sent
//! upstream. Classification is a pure function of the request: the same
//! input always produces the same [`PromptSpec`].
//!
//! ## Categories
//!
//! | `type` value        | Output shape     |
//! |---------------------|------------------|
//! | `market_data`       | structured JSON  |
//! | `ranking`           | free text (HTML) |
//! | `dividend_ranking`  | free text (HTML) |
//! | `yutai_list`        | free text (HTML) |
//! | anything else       | free text        |

pub mod error;
pub mod prompts;

pub use error::{AnalysisError, FailureReport};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Request category selected by the inbound `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MarketData,
    Ranking,
    DividendRanking,
    YutaiList,
    /// Fallback for absent or unrecognized `type` values.
    #[default]
    Freeform,
}

impl Category {
    /// All categories, in wire-name order.
    pub const ALL: [Category; 5] = [
        Category::MarketData,
        Category::Ranking,
        Category::DividendRanking,
        Category::YutaiList,
        Category::Freeform,
    ];

    /// Resolve the wire value of `type`. Unknown or missing values map to
    /// [`Category::Freeform`].
    pub fn from_type(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("market_data") => Category::MarketData,
            Some("ranking") => Category::Ranking,
            Some("dividend_ranking") => Category::DividendRanking,
            Some("yutai_list") => Category::YutaiList,
            _ => Category::Freeform,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarketData => "market_data",
            Category::Ranking => "ranking",
            Category::DividendRanking => "dividend_ranking",
            Category::YutaiList => "yutai_list",
            Category::Freeform => "freeform",
        }
    }

    /// Output shape the upstream is asked to produce for this category.
    pub fn expected_shape(&self) -> ExpectedShape {
        match self {
            Category::MarketData => ExpectedShape::StructuredJson,
            Category::Ranking
            | Category::DividendRanking
            | Category::YutaiList
            | Category::Freeform => ExpectedShape::FreeText,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any JSON value is accepted; only the known strings select a category.
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Category::from_type(raw.as_str()))
    }
}

/// Inbound request body: `{ type, query?, prompt? }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisRequest {
    #[serde(rename = "type", default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Caller-supplied system instruction, honored only for freeform requests.
    #[serde(rename = "prompt", default, skip_serializing_if = "Option::is_none")]
    pub custom_instruction: Option<String>,
}

impl AnalysisRequest {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_custom_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.custom_instruction = Some(instruction.into());
        self
    }

    /// Parse a raw request body.
    ///
    /// An empty body, malformed JSON, or a JSON value that is not an object
    /// with the expected field types yields [`AnalysisError::InvalidPayload`].
    pub fn from_slice(body: &[u8]) -> Result<Self, AnalysisError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AnalysisError::InvalidPayload("empty request body".to_string()));
        }
        serde_json::from_slice(body).map_err(|e| AnalysisError::InvalidPayload(e.to_string()))
    }

    /// Query text with surrounding whitespace removed; `None` when blank.
    pub fn query_text(&self) -> Option<&str> {
        non_blank(self.query.as_deref())
    }

    /// Custom instruction with surrounding whitespace removed; `None` when blank.
    pub fn custom_instruction_text(&self) -> Option<&str> {
        non_blank(self.custom_instruction.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Output mode declared to the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedShape {
    StructuredJson,
    FreeText,
}

impl ExpectedShape {
    /// MIME type sent as `responseMimeType`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExpectedShape::StructuredJson => "application/json",
            ExpectedShape::FreeText => "text/plain",
        }
    }
}

/// Fully composed upstream prompt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    system_instruction: String,
    user_message: String,
    expected_shape: ExpectedShape,
}

impl PromptSpec {
    pub fn new(
        system_instruction: impl Into<String>,
        user_message: impl Into<String>,
        expected_shape: ExpectedShape,
    ) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_message: user_message.into(),
            expected_shape,
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn expected_shape(&self) -> ExpectedShape {
        self.expected_shape
    }
}

/// Build the prompt for a request.
pub fn classify(request: &AnalysisRequest) -> PromptSpec {
    let shape = request.category.expected_shape();
    match request.category {
        Category::MarketData => PromptSpec::new(
            prompts::MARKET_DATA_INSTRUCTION,
            prompts::MARKET_DATA_MESSAGE,
            shape,
        ),
        Category::Ranking => {
            PromptSpec::new(prompts::RANKING_INSTRUCTION, prompts::RANKING_MESSAGE, shape)
        }
        Category::DividendRanking => PromptSpec::new(
            prompts::DIVIDEND_RANKING_INSTRUCTION,
            prompts::DIVIDEND_RANKING_MESSAGE,
            shape,
        ),
        Category::YutaiList => PromptSpec::new(
            prompts::YUTAI_LIST_INSTRUCTION,
            prompts::yutai_list_message(request.query_text()),
            shape,
        ),
        Category::Freeform => PromptSpec::new(
            request
                .custom_instruction_text()
                .unwrap_or(prompts::ANALYST_INSTRUCTION),
            prompts::freeform_message(request.query_text()),
            shape,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_type_known_values() {
        assert_eq!(Category::from_type(Some("market_data")), Category::MarketData);
        assert_eq!(Category::from_type(Some("ranking")), Category::Ranking);
        assert_eq!(
            Category::from_type(Some("dividend_ranking")),
            Category::DividendRanking
        );
        assert_eq!(Category::from_type(Some("yutai_list")), Category::YutaiList);
        assert_eq!(Category::from_type(Some("freeform")), Category::Freeform);
    }

    #[test]
    fn test_from_type_unknown_and_missing() {
        assert_eq!(Category::from_type(None), Category::Freeform);
        assert_eq!(Category::from_type(Some("")), Category::Freeform);
        assert_eq!(Category::from_type(Some("MARKET_DATA")), Category::Freeform);
        assert_eq!(Category::from_type(Some("crypto")), Category::Freeform);
    }

    #[test]
    fn test_as_str_round_trips_through_from_type() {
        for category in Category::ALL {
            assert_eq!(Category::from_type(Some(category.as_str())), category);
        }
    }

    #[test]
    fn test_parse_full_body() {
        let body = br#"{"type":"freeform","query":"copper outlook","prompt":"Be brief"}"#;
        let request = AnalysisRequest::from_slice(body).unwrap();
        assert_eq!(request.category, Category::Freeform);
        assert_eq!(request.query.as_deref(), Some("copper outlook"));
        assert_eq!(request.custom_instruction.as_deref(), Some("Be brief"));
    }

    #[test]
    fn test_parse_missing_or_null_type_falls_back_to_freeform() {
        let request = AnalysisRequest::from_slice(br#"{"query":"hi"}"#).unwrap();
        assert_eq!(request.category, Category::Freeform);

        let request = AnalysisRequest::from_slice(br#"{"type":null}"#).unwrap();
        assert_eq!(request.category, Category::Freeform);

        let request = AnalysisRequest::from_slice(br#"{"type":"bogus"}"#).unwrap();
        assert_eq!(request.category, Category::Freeform);
    }

    #[test]
    fn test_parse_non_string_type_falls_back_to_freeform() {
        let bodies: [&[u8]; 4] = [
            br#"{"type":5}"#,
            br#"{"type":true}"#,
            br#"{"type":["ranking"]}"#,
            r#"{"type":{"name":"ranking"},"query":"金利は?"}"#.as_bytes(),
        ];
        for body in bodies {
            let request = AnalysisRequest::from_slice(body).unwrap();
            assert_eq!(request.category, Category::Freeform);
        }

        let request =
            AnalysisRequest::from_slice(r#"{"type":{"name":"ranking"},"query":"金利は?"}"#.as_bytes())
                .unwrap();
        assert_eq!(request.query_text(), Some("金利は?"));
    }

    #[test]
    fn test_parse_rejects_malformed_bodies() {
        let bodies: [&[u8]; 6] = [
            b"",
            b"   ",
            b"{not json",
            b"[1,2]",
            b"\"text\"",
            br#"{"type":"ranking","query":5}"#,
        ];
        for body in bodies {
            let err = AnalysisRequest::from_slice(body).unwrap_err();
            assert!(
                matches!(err, AnalysisError::InvalidPayload(_)),
                "body {:?} should be invalid",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_market_data_is_structured() {
        let spec = classify(&AnalysisRequest::new(Category::MarketData));
        assert_eq!(spec.expected_shape(), ExpectedShape::StructuredJson);
        assert_eq!(spec.expected_shape().mime_type(), "application/json");
        for field in prompts::MARKET_DATA_FIELDS {
            assert!(spec.system_instruction().contains(field), "missing {}", field);
        }
        for label in prompts::FEAR_GREED_LABELS {
            assert!(spec.system_instruction().contains(label), "missing {}", label);
        }
    }

    #[test]
    fn test_other_categories_are_free_text() {
        for category in [
            Category::Ranking,
            Category::DividendRanking,
            Category::YutaiList,
            Category::Freeform,
        ] {
            let spec = classify(&AnalysisRequest::new(category));
            assert_eq!(spec.expected_shape(), ExpectedShape::FreeText, "{}", category);
            assert_eq!(spec.expected_shape().mime_type(), "text/plain");
        }
    }

    #[test]
    fn test_fixed_categories_ignore_custom_instruction() {
        let request = AnalysisRequest::new(Category::Ranking)
            .with_custom_instruction("ignore everything")
            .with_query("ignored");
        let spec = classify(&request);
        assert_eq!(spec.system_instruction(), prompts::RANKING_INSTRUCTION);
        assert_eq!(spec.user_message(), prompts::RANKING_MESSAGE);
    }

    #[test]
    fn test_freeform_uses_custom_instruction_verbatim() {
        let request = AnalysisRequest::new(Category::Freeform)
            .with_custom_instruction("You are a bond strategist.")
            .with_query("JGB yields?");
        let spec = classify(&request);
        assert_eq!(spec.system_instruction(), "You are a bond strategist.");
        assert!(spec.user_message().contains("JGB yields?"));
    }

    #[test]
    fn test_freeform_defaults() {
        let spec = classify(&AnalysisRequest::new(Category::Freeform));
        assert_eq!(spec.system_instruction(), prompts::ANALYST_INSTRUCTION);
        assert_eq!(spec.user_message(), prompts::DEFAULT_TREND_MESSAGE);

        let blank = AnalysisRequest::new(Category::Freeform)
            .with_query("   ")
            .with_custom_instruction("");
        let spec = classify(&blank);
        assert_eq!(spec.system_instruction(), prompts::ANALYST_INSTRUCTION);
        assert_eq!(spec.user_message(), prompts::DEFAULT_TREND_MESSAGE);
    }

    #[test]
    fn test_yutai_list_consults_query_as_period() {
        let spec = classify(&AnalysisRequest::new(Category::YutaiList).with_query("3月"));
        assert!(spec.user_message().contains("3月"));

        let spec = classify(&AnalysisRequest::new(Category::YutaiList));
        assert!(spec.user_message().contains("今月"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any `type` outside the known set classifies exactly like freeform.
            #[test]
            fn prop_unknown_type_is_freeform(
                value in "[a-zA-Z_ ]{0,24}",
                query in proptest::option::of(".{0,40}"),
            ) {
                prop_assume!(!Category::ALL.iter().any(|c| c.as_str() == value.trim()));

                let unknown = AnalysisRequest {
                    category: Category::from_type(Some(&value)),
                    query: query.clone(),
                    custom_instruction: None,
                };
                let freeform = AnalysisRequest {
                    category: Category::Freeform,
                    query,
                    custom_instruction: None,
                };

                prop_assert_eq!(unknown.category, Category::Freeform);
                prop_assert_eq!(classify(&unknown), classify(&freeform));
            }

            /// Classification is deterministic across repeated calls.
            #[test]
            fn prop_classify_is_idempotent(
                index in 0usize..5,
                query in proptest::option::of(".{0,40}"),
                prompt in proptest::option::of(".{0,40}"),
            ) {
                let request = AnalysisRequest {
                    category: Category::ALL[index],
                    query,
                    custom_instruction: prompt,
                };
                prop_assert_eq!(classify(&request), classify(&request));
            }
        }
    }
}

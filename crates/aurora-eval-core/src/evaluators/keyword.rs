use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::evaluator::{text_of, Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Passes when the output contains any of the configured keywords (case-insensitive).
pub struct KeywordEvaluator {
    keywords: Vec<String>,
}

impl KeywordEvaluator {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { keywords: keywords.into_iter().map(Into::into).collect() }
    }

    /// Reads `parameters.keywords`, a non-empty array of strings.
    pub fn from_parameters(name: &str, parameters: &serde_json::Map<String, Value>) -> Result<Self> {
        let keywords = parameters
            .get("keywords")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|k| k.as_str().map(str::to_string)).collect::<Vec<_>>())
            .unwrap_or_default();
        if keywords.is_empty() {
            return Err(EvalError::UnknownEvaluator {
                name: name.to_string(),
                reason: "keyword_check needs a non-empty 'keywords' string array parameter".into(),
            });
        }
        Ok(Self::new(keywords))
    }
}

#[async_trait]
impl Evaluator for KeywordEvaluator {
    fn name(&self) -> &str {
        "keyword_check"
    }

    async fn evaluate(&self, _record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
        let haystack = text_of(actual).to_lowercase();
        let found: Vec<&String> = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(&k.to_lowercase()))
            .collect();

        let assessment = Assessment::pass_fail(!found.is_empty());
        let assessment = if found.is_empty() {
            assessment.reasoning("No required keywords found.")
        } else {
            assessment.reasoning(format!(
                "Found keywords: {}",
                found.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
            ))
        };
        Ok(assessment.details(serde_json::json!({
            "keywords": self.keywords,
            "found": found,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn keyword_found_case_insensitive() {
        let ev = KeywordEvaluator::new(["Invoice", "approval"]);
        let a = ev
            .evaluate(&DatasetRecord::new(json!("q")), &json!("The INVOICE was sent"))
            .await
            .unwrap();
        assert_eq!(a.value, Some(1.0));
        assert_eq!(a.details.unwrap()["found"], json!(["Invoice"]));
    }

    #[tokio::test]
    async fn keyword_missing() {
        let ev = KeywordEvaluator::new(["refund"]);
        let a = ev.evaluate(&DatasetRecord::new(json!("q")), &json!("nothing here")).await.unwrap();
        assert_eq!(a.value, Some(0.0));
    }

    #[test]
    fn requires_keywords_parameter() {
        let params = serde_json::Map::new();
        assert!(KeywordEvaluator::from_parameters("kw", &params).is_err());
    }
}

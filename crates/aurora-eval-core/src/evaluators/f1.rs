use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::evaluator::{expected_answer, text_of, Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Token-overlap F1 between the actual output and the expected answer.
pub struct F1Evaluator;

pub(crate) fn token_f1(candidate: &str, reference: &str) -> f64 {
    let cand: HashSet<String> = tokens(candidate);
    let reference: HashSet<String> = tokens(reference);
    if cand.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let overlap = cand.intersection(&reference).count() as f64;
    let precision = overlap / cand.len() as f64;
    let recall = overlap / reference.len() as f64;
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn tokens(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric() && c != '%' && c != '.')
        .map(|w| w.trim_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

pub(crate) fn f1_score(record: &DatasetRecord, actual: &Value) -> Assessment {
    let Some(expected) = expected_answer(record) else {
        return Assessment::score(0.0).reasoning("No expected value to compare against.");
    };
    let f1 = token_f1(&text_of(actual), &expected);
    Assessment::score(f1).reasoning("Calculated token overlap.")
}

#[async_trait]
impl Evaluator for F1Evaluator {
    fn name(&self) -> &str {
        "f1_score"
    }

    async fn evaluate(&self, record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
        Ok(f1_score(record, actual))
    }
}

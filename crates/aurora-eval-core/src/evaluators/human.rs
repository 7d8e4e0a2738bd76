use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::evaluator::{Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Queues the record for manual review; the score stays pending.
pub struct HumanReviewEvaluator {
    queue: String,
}

impl HumanReviewEvaluator {
    pub fn new(queue: impl Into<String>) -> Self {
        Self { queue: queue.into() }
    }
}

#[async_trait]
impl Evaluator for HumanReviewEvaluator {
    fn name(&self) -> &str {
        "human_review"
    }

    async fn evaluate(&self, _record: &DatasetRecord, _actual: &Value) -> Result<Assessment> {
        Ok(Assessment::pending()
            .reasoning("Queued for human expert review.")
            .details(serde_json::json!({ "queue": self.queue })))
    }
}

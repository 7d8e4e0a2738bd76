use crate::types::{EvaluatorConfig, MetricVerdict, RecordResult, VerdictStatus};

/// Fold per-record scores into one verdict per configured metric.
///
/// Records that carry an error are left out. A metric passes when the share
/// of scored records meeting `pass_threshold` reaches `min_pass_rate`. With
/// nothing scored the pass rate is vacuously 1.0, unless reviews are
/// outstanding, which makes the metric `pending`. A threshold of 0.0 always passes.
pub fn aggregate<'a, I>(metrics: I, records: &[RecordResult]) -> Vec<MetricVerdict>
where
	I: IntoIterator<Item = &'a EvaluatorConfig>,
{
	metrics
		.into_iter()
		.map(|config| verdict_for(config, records))
		.collect()
}

fn verdict_for(config: &EvaluatorConfig, records: &[RecordResult]) -> MetricVerdict {
	let threshold = config.effective_threshold();
	let min_pass_rate = config.effective_min_pass_rate();

	let mut scored = 0usize;
	let mut passed = 0usize;
	let mut pending = 0usize;
	let mut sum = 0.0f64;
	let mut min: Option<f64> = None;
	let mut max: Option<f64> = None;

	for rr in records.iter().filter(|rr| rr.error.is_none()) {
		let Some(score) = rr.score(&config.name) else {
			continue;
		};
		match score.value {
			Some(v) => {
				scored += 1;
				sum += v;
				if score.passed {
					passed += 1;
				}
				min = Some(min.map_or(v, |m| m.min(v)));
				max = Some(max.map_or(v, |m| m.max(v)));
			}
			None => pending += 1,
		}
	}

	let pass_rate = if scored == 0 { 1.0 } else { passed as f64 / scored as f64 };
	let mean = (scored > 0).then(|| sum / scored as f64);
	let status = if scored == 0 && pending > 0 {
		VerdictStatus::Pending
	} else if threshold <= 0.0 || pass_rate >= min_pass_rate {
		VerdictStatus::Passed
	} else {
		VerdictStatus::Failed
	};

	MetricVerdict {
		metric: config.name.clone(),
		threshold,
		min_pass_rate,
		scored,
		passed,
		pending,
		mean,
		min,
		max,
		pass_rate,
		status,
	}
}

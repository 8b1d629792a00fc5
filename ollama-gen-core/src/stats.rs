//! Derived performance figures for a finished generation.

use crate::response::GenerationResult;

const NANOS_PER_SEC: f64 = 1e9;

/// Timing in seconds, token totals and throughput for one generation.
///
/// A rate is `None` whenever its count or its duration is zero, so callers
/// never divide by zero and can render the field as unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedStats {
    pub total_secs: f64,
    pub load_secs: f64,
    pub prompt_eval_secs: f64,
    pub eval_secs: f64,
    pub prompt_tokens: u64,
    pub gen_tokens: u64,
    pub total_tokens: u64,
    pub prompt_tokens_per_sec: Option<f64>,
    pub gen_tokens_per_sec: Option<f64>,
}

impl DerivedStats {
    pub fn derive(result: &GenerationResult) -> Self {
        let prompt_eval_secs = nanos_to_secs(result.prompt_eval_duration);
        let eval_secs = nanos_to_secs(result.eval_duration);

        Self {
            total_secs: nanos_to_secs(result.total_duration),
            load_secs: nanos_to_secs(result.load_duration),
            prompt_eval_secs,
            eval_secs,
            prompt_tokens: result.prompt_eval_count,
            gen_tokens: result.eval_count,
            total_tokens: result.prompt_eval_count.saturating_add(result.eval_count),
            prompt_tokens_per_sec: rate(result.prompt_eval_count, prompt_eval_secs),
            gen_tokens_per_sec: rate(result.eval_count, eval_secs),
        }
    }
}

impl From<&GenerationResult> for DerivedStats {
    fn from(result: &GenerationResult) -> Self {
        Self::derive(result)
    }
}

fn nanos_to_secs(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_SEC
}

fn rate(count: u64, secs: f64) -> Option<f64> {
    (count > 0 && secs > 0.0).then(|| count as f64 / secs)
}

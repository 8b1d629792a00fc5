//! The `--verbose` statistics block printed to stderr.

use ollama_gen_core::session::RULE_WIDTH;
use ollama_gen_core::{DerivedStats, GenerationResult};
use std::fmt;

/// Formats a terminal record as a timing / token / throughput report.
///
/// Speeds are only listed when they could be computed.
pub struct Report<'a>(pub &'a GenerationResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let stats = DerivedStats::derive(result);
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "OLLAMA VERBOSE OUTPUT")?;
        writeln!(f, "{rule}")?;

        if let Some(model) = &result.model {
            writeln!(f, "Model: {model}")?;
        }

        writeln!(f)?;
        writeln!(f, "Timing:")?;
        writeln!(f, "  Total Duration:         {:.3}s", stats.total_secs)?;
        writeln!(f, "  Model Load Duration:    {:.3}s", stats.load_secs)?;
        writeln!(f, "  Prompt Eval Duration:   {:.3}s", stats.prompt_eval_secs)?;
        writeln!(f, "  Generation Duration:    {:.3}s", stats.eval_secs)?;

        writeln!(f)?;
        writeln!(f, "Tokens:")?;
        writeln!(f, "  Prompt Tokens:          {}", stats.prompt_tokens)?;
        writeln!(f, "  Generated Tokens:       {}", stats.gen_tokens)?;
        writeln!(f, "  Total Tokens:           {}", stats.total_tokens)?;
        if let Some(speed) = stats.prompt_tokens_per_sec {
            writeln!(f, "  Prompt Eval Speed:      {speed:.1} tokens/s")?;
        }
        if let Some(speed) = stats.gen_tokens_per_sec {
            writeln!(f, "  Generation Speed:       {speed:.1} tokens/s")?;
        }

        if let Some(reason) = &result.done_reason {
            writeln!(f)?;
            writeln!(f, "Completion Reason: {reason}")?;
        }
        if let Some(context) = &result.context {
            writeln!(f, "Context Size: {} tokens", context.len())?;
        }

        write!(f, "{rule}")
    }
}

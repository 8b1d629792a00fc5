use crate::app::GuiState;
use dioxus::prelude::*;
use ollama_gen_core::{DerivedStats, GenerationResult};

/// Text for every field of the stats panel.
///
/// Starts as placeholders. Each terminal record rewrites the timing, token and
/// speed fields; the model and completion fields change only when the record
/// carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsLabels {
    pub model: String,
    pub total: String,
    pub load: String,
    pub prompt_eval: String,
    pub generation: String,
    pub prompt_tokens: String,
    pub gen_tokens: String,
    pub total_tokens: String,
    pub prompt_speed: String,
    pub gen_speed: String,
    /// `None` until a record with a completion reason arrives.
    pub completion: Option<String>,
}

impl Default for StatsLabels {
    fn default() -> Self {
        Self {
            model: "Model: -".to_string(),
            total: "Total: -".to_string(),
            load: "Load: -".to_string(),
            prompt_eval: "Prompt Eval: -".to_string(),
            generation: "Generation: -".to_string(),
            prompt_tokens: "Prompt: -".to_string(),
            gen_tokens: "Generated: -".to_string(),
            total_tokens: "Total: -".to_string(),
            prompt_speed: "Prompt Eval: -".to_string(),
            gen_speed: "Generation: -".to_string(),
            completion: None,
        }
    }
}

impl StatsLabels {
    pub fn update(&mut self, result: &GenerationResult) {
        let stats = DerivedStats::derive(result);

        if let Some(model) = &result.model {
            self.model = format!("Model: {model}");
        }
        self.total = format!("Total: {:.3}s", stats.total_secs);
        self.load = format!("Load: {:.3}s", stats.load_secs);
        self.prompt_eval = format!("Prompt Eval: {:.3}s", stats.prompt_eval_secs);
        self.generation = format!("Generation: {:.3}s", stats.eval_secs);
        self.prompt_tokens = format!("Prompt: {}", stats.prompt_tokens);
        self.gen_tokens = format!("Generated: {}", stats.gen_tokens);
        self.total_tokens = format!("Total: {}", stats.total_tokens);
        self.prompt_speed = speed("Prompt Eval", stats.prompt_tokens_per_sec);
        self.gen_speed = speed("Generation", stats.gen_tokens_per_sec);
        if let Some(reason) = &result.done_reason {
            self.completion = Some(format!("Status: Completed ({reason})"));
        }
    }
}

fn speed(name: &str, rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{name}: {rate:.1} tok/s"),
        None => format!("{name}: -"),
    }
}

/// Timing, token and throughput figures of the last finished generation.
#[component]
pub fn StatsPanel(base_url: String) -> Element {
    let GuiState { view, .. } = use_context::<GuiState>();
    let labels = view.read().stats.clone();

    let (completion, completion_class) = match &labels.completion {
        Some(text) => (text.clone(), "full tone-success"),
        None => ("Status: No generation yet".to_string(), "full muted"),
    };

    rsx! {
        fieldset {
            legend { "Current Model Stats" }
            div {
                class: "stats",

                span { class: "wide", "{labels.model}" }
                span { class: "rest", "URL: {base_url}" }

                span { "Timing:" }
                span { "{labels.total}" }
                span { "{labels.load}" }
                span { "{labels.prompt_eval}" }
                span { "{labels.generation}" }

                span { "Tokens:" }
                span { "{labels.prompt_tokens}" }
                span { "{labels.gen_tokens}" }
                span { "{labels.total_tokens}" }
                span {}

                span { "Performance:" }
                span { class: "wide", "{labels.prompt_speed}" }
                span { class: "wide", "{labels.gen_speed}" }

                span { class: "{completion_class}", "{completion}" }
            }
        }
    }
}

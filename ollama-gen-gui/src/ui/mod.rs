//! UI components built with Dioxus.

pub mod controls;
pub mod output;
pub mod stats_panel;

use controls::Controls;
use dioxus::prelude::*;
use ollama_gen_core::Tone;
use output::{ActionBar, OutputPane, PromptBox};
use stats_panel::StatsPanel;

const STYLES: &str = r#"
body { margin: 0; font-family: Arial, sans-serif; font-size: 13px; background: #f3f3f3; }
.layout { display: flex; flex-direction: column; height: 100vh; box-sizing: border-box; padding: 5px 10px; gap: 8px; }
fieldset { border: 1px solid #c8c8c8; border-radius: 4px; padding: 8px 10px; margin: 0; }
legend { padding: 0 4px; }
.row { display: flex; align-items: center; gap: 12px; flex-wrap: wrap; }
.stats { display: grid; grid-template-columns: 110px repeat(4, 1fr); gap: 2px 10px; font-weight: bold; font-size: 12px; }
.stats .wide { grid-column: span 2; }
.stats .rest { grid-column: span 3; }
.stats .full { grid-column: 1 / -1; }
.muted { color: gray; }
textarea { width: 100%; box-sizing: border-box; resize: vertical; font-family: inherit; }
.output { flex: 1; display: flex; flex-direction: column; min-height: 0; }
.output .scroll { flex: 1; overflow-y: auto; display: flex; flex-direction: column-reverse; background: white; border: 1px solid #c8c8c8; }
.output pre { margin: 0; padding: 6px; white-space: pre-wrap; word-wrap: break-word; font-family: Arial, sans-serif; font-size: 13px; }
.tone-success { color: green; }
.tone-busy { color: blue; }
.tone-warning { color: orange; }
.tone-failure { color: red; }
"#;

/// CSS class for a status tone.
pub fn tone_class(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "tone-success",
        Tone::Busy => "tone-busy",
        Tone::Warning => "tone-warning",
        Tone::Failure => "tone-failure",
    }
}

/// Main window layout: controls, stats, prompt, buttons, transcript.
#[component]
pub fn Layout(base_url: String) -> Element {
    rsx! {
        style { {STYLES} }
        div {
            class: "layout",
            Controls {}
            StatsPanel { base_url }
            PromptBox {}
            ActionBar {}
            OutputPane {}
        }
    }
}

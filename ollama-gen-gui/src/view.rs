//! Window state driven by session events, kept free of Dioxus so it can be
//! exercised directly.

use crate::ui::stats_panel::StatsLabels;
use ollama_gen_core::session::pick_model;
use ollama_gen_core::{SessionEvent, Status};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub output: String,
    pub status: Status,
    pub stats: StatsLabels,
    pub models: Vec<String>,
    /// Model name in the editable combo box.
    pub model: String,
    pub generating: bool,
}

impl SessionView {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            status: Status::Ready,
            stats: StatsLabels::default(),
            models: Vec::new(),
            model: model.into(),
            generating: false,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Append(text) => self.output.push_str(&text),
            SessionEvent::Status(status) => self.status = status,
            SessionEvent::Stats(result) => self.stats.update(&result),
            SessionEvent::Models { names, error } => {
                match error {
                    Some(error) => {
                        self.output.push_str(&error);
                        self.output.push('\n');
                    }
                    None => {
                        if let Some(first) = pick_model(&self.model, &names) {
                            self.model = first;
                        }
                    }
                }
                self.models = names;
            }
            SessionEvent::Finished => self.generating = false,
        }
    }
}

//! Root Dioxus component and the UI-side state it owns.
//!
//! Background work never touches these signals. It reports through
//! `SessionEvent`s, which a task spawned on the UI runtime applies to the
//! [`SessionView`] signal.

use crate::ui::Layout;
use crate::view::SessionView;
use dioxus::prelude::*;
use ollama_gen_core::{Config, OllamaClient, Processor, Session, SessionSettings};
use std::sync::Arc;
use tracing::{debug, warn};

/// Values prepared before the window opens.
#[derive(Clone)]
pub struct Startup {
    pub config: Config,
    pub client: Arc<OllamaClient>,
}

/// Everything the widgets read or edit.
#[derive(Clone, Copy)]
pub struct GuiState {
    /// State the session reports into; see [`SessionView::apply`].
    pub view: Signal<SessionView>,
    pub processor: Signal<Processor>,
    pub stream: Signal<bool>,
    pub prompt: Signal<String>,
}

impl GuiState {
    /// Snapshot of the form controls for one generation.
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            model: self.view.read().model.trim().to_string(),
            processor: *self.processor.read(),
            stream: *self.stream.read(),
        }
    }
}

#[component]
pub fn App() -> Element {
    let startup = use_context::<Startup>();
    let defaults = SessionSettings::from_config(&startup.config.generation);

    let state = GuiState {
        view: use_signal(|| SessionView::new(defaults.model.clone())),
        processor: use_signal(|| defaults.processor),
        stream: use_signal(|| defaults.stream),
        prompt: use_signal(|| "Tell me a joke about programming".to_string()),
    };

    let session = use_hook(|| {
        let (session, mut events) = Session::new(startup.client.clone());

        let mut view = state.view;
        spawn(async move {
            while let Some(event) = events.recv().await {
                debug!(?event, "session event");
                view.write().apply(event);
            }
        });

        if let Err(e) = session.refresh_models() {
            warn!("Could not start model refresh: {}", e);
        }
        session
    });

    use_context_provider(|| state);
    use_context_provider(|| session);

    rsx! {
        Layout { base_url: startup.config.server.base_url.clone() }
    }
}

use super::tone_class;
use crate::app::GuiState;
use dioxus::prelude::*;
use ollama_gen_core::Session;
use tracing::debug;

#[component]
pub fn PromptBox() -> Element {
    let GuiState { mut prompt, .. } = use_context::<GuiState>();

    rsx! {
        fieldset {
            legend { "Prompt" }
            textarea {
                rows: "4",
                value: "{prompt}",
                oninput: move |evt| prompt.set(evt.value()),
            }
        }
    }
}

/// Generate, Stop and Clear buttons with the status line.
#[component]
pub fn ActionBar() -> Element {
    let state = use_context::<GuiState>();
    let session = use_context::<Session>();
    let GuiState { mut view, prompt, .. } = state;

    let (busy, status) = {
        let view = view.read();
        (view.generating, view.status)
    };
    let status_class = tone_class(status.tone());
    let status_text = status.label();
    let stopper = session.clone();

    rsx! {
        div {
            class: "row",

            button {
                disabled: busy,
                onclick: move |_| {
                    let text = prompt.peek().clone();
                    match session.start(&text, state.settings()) {
                        Ok(_) => view.write().generating = true,
                        Err(e) => debug!("Generation not started: {}", e),
                    }
                },
                "Generate"
            }
            button {
                disabled: !busy,
                onclick: move |_| stopper.stop(),
                "Stop"
            }
            button {
                onclick: move |_| view.write().output.clear(),
                "Clear Output"
            }

            span { class: "{status_class}", "{status_text}" }
        }
    }
}

/// Scrolling transcript; the reversed column keeps the newest text in view.
#[component]
pub fn OutputPane() -> Element {
    let GuiState { view, .. } = use_context::<GuiState>();
    let output = view.read().output.clone();

    rsx! {
        fieldset {
            class: "output",
            legend { "Output" }
            div {
                class: "scroll",
                pre { "{output}" }
            }
        }
    }
}

use crate::app::GuiState;
use dioxus::prelude::*;
use ollama_gen_core::Processor;

/// Model, processor and streaming choices.
#[component]
pub fn Controls() -> Element {
    let GuiState {
        mut view,
        mut processor,
        mut stream,
        ..
    } = use_context::<GuiState>();
    let (model, models, locked) = {
        let view = view.read();
        (view.model.clone(), view.models.clone(), view.generating)
    };

    rsx! {
        fieldset {
            legend { "Controls" }
            div {
                class: "row",

                label { "Model:" }
                input {
                    list: "model-list",
                    size: "30",
                    value: "{model}",
                    disabled: locked,
                    oninput: move |evt| view.write().model = evt.value(),
                }
                datalist {
                    id: "model-list",
                    for name in models {
                        option { key: "{name}", value: "{name}" }
                    }
                }

                label { "Processor:" }
                for (choice, text) in [Processor::Gpu, Processor::Cpu].map(|p| (p, p.label())) {
                    label {
                        key: "{text}",
                        input {
                            r#type: "radio",
                            name: "processor",
                            checked: processor() == choice,
                            disabled: locked,
                            onchange: move |_| processor.set(choice),
                        }
                        "{text}"
                    }
                }

                label {
                    input {
                        r#type: "checkbox",
                        checked: stream(),
                        disabled: locked,
                        onchange: move |_| {
                            let next = !stream();
                            stream.set(next);
                        },
                    }
                    "Stream Output"
                }
            }
        }
    }
}

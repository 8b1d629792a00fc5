//! ollama-gen-gui - desktop client for a local Ollama server
//!
//! Pick a model, type a prompt, watch the answer stream in with timing stats.

use dioxus::desktop::{Config as DesktopConfig, LogicalSize, WindowBuilder};
use ollama_gen_core::{Config, OllamaClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod ui;
mod view;

use app::{App, Startup};

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ollama_gen_gui=info,ollama_gen_core=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("Starting ollama-gen-gui v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::resolve(None).unwrap_or_else(|e| {
        warn!("Ignoring config file: {}", e);
        Config::default()
    });

    let client = match OllamaClient::new(&config.server) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("{}", e);
            eprintln!("[Error] {}", e.user_message());
            std::process::exit(1);
        }
    };

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            DesktopConfig::default().with_window(
                WindowBuilder::new()
                    .with_title("Ollama GUI Client")
                    .with_inner_size(LogicalSize::new(900.0, 700.0)),
            ),
        )
        .with_context(Startup { config, client })
        .launch(App);
}

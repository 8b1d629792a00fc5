use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use ollama_gen_core::{CancelFlag, Config, Generate, GenerationRequest, OllamaClient};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Debug, Parser)]
#[command(name = "ollama-gen")]
#[command(about = "Send a prompt to the local Ollama server and print the output", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(help = "The prompt to send to the LLM")]
    prompt: String,

    #[arg(short, long, help = "Model name registered with Ollama [default: gpt-oss:20b]")]
    model: Option<String>,

    #[arg(
        short,
        long,
        overrides_with = "no_stream",
        help = "Stream the response to stdout as it is generated (default)"
    )]
    stream: bool,

    #[arg(long, overrides_with = "stream", help = "Disable streaming and wait for the full response")]
    no_stream: bool,

    #[arg(
        short = 'g',
        long,
        allow_negative_numbers = true,
        help = "Number of GPU layers to use (99=all GPU, 0=CPU only) [default: 99]"
    )]
    num_gpu: Option<i32>,

    #[arg(short, long, help = "Show timing, token counts and performance metrics on stderr")]
    verbose: bool,

    #[arg(short, long, env = "OLLAMA_GEN_CONFIG", help = "Config file [default: ollama-gen.yaml if present]")]
    config: Option<PathBuf>,

    #[arg(long, help = "Server base URL [default: http://localhost:11434]")]
    host: Option<String>,

    #[arg(long, help = "Request timeout in seconds [default: 300]")]
    timeout: Option<u64>,
}

impl Cli {
    /// Command-line values win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.generation.model = model.clone();
        }
        if self.no_stream {
            config.generation.stream = false;
        } else if self.stream {
            config.generation.stream = true;
        }
        if let Some(num_gpu) = self.num_gpu {
            config.generation.num_gpu = Some(num_gpu);
        }
        if let Some(host) = &self.host {
            config.server.base_url = host.clone();
        }
        if let Some(timeout) = self.timeout {
            config.server.timeout_secs = timeout;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "Parsed arguments");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "[Error]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only generated text.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ollama_gen_cli=debug,ollama_gen_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::resolve(cli.config.as_deref()).context("Failed to load config")?;
    cli.apply(&mut config);

    let client = OllamaClient::new(&config.server).map_err(|e| anyhow!(e.user_message()))?;
    let request = GenerationRequest::from_config(cli.prompt.as_str(), &config.generation);
    let cancel = CancelFlag::new();

    let mut stdout = io::stdout();
    let mut write_error: Option<io::Error> = None;
    let on_chunk = Box::new(|chunk: &str| {
        if write_error.is_some() {
            return;
        }
        if let Err(e) = stdout.write_all(chunk.as_bytes()).and_then(|_| stdout.flush()) {
            write_error = Some(e);
        }
    });

    let outcome = client
        .generate(request, on_chunk, &cancel)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write to stdout");
    }
    println!();

    if cli.verbose {
        match &outcome.result {
            Some(result) => eprintln!("{}", report::Report(result)),
            None => debug!("No terminal record received; statistics unavailable"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ollama-gen").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_come_from_config() {
        let cli = parse(&["Tell me a short joke"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config, Config::default());
        assert_eq!(cli.prompt, "Tell me a short joke");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&["-m", "qwen3-coder", "-g", "50", "-v", "--no-stream", "--host", "http://gpu-box:11434", "hi"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.generation.model, "qwen3-coder");
        assert_eq!(config.generation.num_gpu, Some(50));
        assert!(!config.generation.stream);
        assert_eq!(config.server.base_url, "http://gpu-box:11434");
        assert!(cli.verbose);
    }

    #[test]
    fn test_last_stream_flag_wins() {
        let cli = parse(&["--no-stream", "-s", "hi"]);
        let mut config = Config::default();
        config.generation.stream = false;
        cli.apply(&mut config);
        assert!(config.generation.stream);

        let cli = parse(&["-s", "--no-stream", "hi"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.generation.stream);
    }

    #[test]
    fn test_prompt_is_required() {
        assert!(Cli::try_parse_from(["ollama-gen", "-v"]).is_err());
    }
}

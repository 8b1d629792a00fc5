//! Generation session for interactive front-ends.
//!
//! A [`Session`] owns the "one generation at a time" rule and the cancel flag.
//! Work runs on a dedicated background thread per action; everything the UI
//! has to show comes back as [`SessionEvent`]s over a channel, so the UI only
//! mutates its own state from its own event loop.

use crate::cancel::CancelFlag;
use crate::client::Generate;
use crate::config::GenerationConfig;
use crate::error::ClientError;
use crate::request::GenerationRequest;
use crate::response::GenerationResult;
use chrono::{DateTime, Local};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

/// Models offered when the server cannot be asked for its list.
pub const FALLBACK_MODELS: [&str; 2] = ["gpt-oss:20b", "qwen3-coder"];

/// Width of the `=` rule framing each prompt in the transcript.
pub const RULE_WIDTH: usize = 70;

/// Where the model runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Processor {
    /// Offload every layer (`num_gpu = 99`).
    #[default]
    Gpu,
    /// Keep everything on the CPU (`num_gpu = 0`).
    Cpu,
}

impl Processor {
    pub fn num_gpu(self) -> i32 {
        match self {
            Processor::Gpu => 99,
            Processor::Cpu => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Processor::Gpu => "GPU (Full)",
            Processor::Cpu => "CPU Only",
        }
    }

    /// `0` maps to CPU, anything else to GPU.
    pub fn from_num_gpu(num_gpu: Option<i32>) -> Self {
        match num_gpu {
            Some(0) => Processor::Cpu,
            _ => Processor::Gpu,
        }
    }
}

/// Snapshot of the form controls, taken when "Generate" is pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub processor: Processor,
    pub stream: bool,
}

impl SessionSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            processor: Processor::from_num_gpu(config.num_gpu),
            stream: config.stream,
        }
    }

    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), prompt)
            .with_stream(self.stream)
            .with_gpu_layers(Some(self.processor.num_gpu()))
    }
}

/// Colour hint for a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Busy,
    Warning,
    Failure,
}

/// Status line shown next to the buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Generating,
    Stopping,
    Error,
    EmptyPrompt,
    AlreadyGenerating,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Ready => "Ready",
            Status::Generating => "Generating...",
            Status::Stopping => "Stopping...",
            Status::Error => "Error",
            Status::EmptyPrompt => "Please enter a prompt",
            Status::AlreadyGenerating => "Already generating...",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Status::Ready => Tone::Success,
            Status::Generating => Tone::Busy,
            Status::Stopping | Status::AlreadyGenerating => Tone::Warning,
            Status::Error | Status::EmptyPrompt => Tone::Failure,
        }
    }
}

/// Messages from background work to the UI event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Text to add to the end of the output pane.
    Append(String),
    Status(Status),
    /// Terminal record of the generation that just ended.
    Stats(GenerationResult),
    /// Result of a model list refresh; `error` is set when the fallback list is used.
    Models {
        names: Vec<String>,
        error: Option<String>,
    },
    /// The in-flight generation is over and controls can be re-enabled.
    Finished,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("Already generating...")]
    AlreadyGenerating,

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Controller shared by the UI: starts, stops and reports on generations.
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn Generate>,
    events: UnboundedSender<SessionEvent>,
    generating: Arc<AtomicBool>,
    cancel: CancelFlag,
}

impl Session {
    /// Creates a session and the receiving end the UI should drain.
    pub fn new(client: Arc<dyn Generate>) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            client,
            events,
            generating: Arc::new(AtomicBool::new(false)),
            cancel: CancelFlag::new(),
        };
        (session, receiver)
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Starts a generation on a new background thread.
    ///
    /// Rejects an empty prompt and a second start while one is running; both
    /// rejections are also reported as a status event.
    pub fn start(&self, prompt: &str, settings: SessionSettings) -> Result<JoinHandle<()>, SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.send(SessionEvent::Status(Status::EmptyPrompt));
            return Err(SessionError::EmptyPrompt);
        }

        if self
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.send(SessionEvent::Status(Status::AlreadyGenerating));
            return Err(SessionError::AlreadyGenerating);
        }

        self.cancel.reset();
        self.send(SessionEvent::Status(Status::Generating));
        self.send(SessionEvent::Append(prompt_header(prompt, Local::now())));

        let request = settings.request(prompt);
        info!(model = %request.model, stream = request.stream, "Starting generation");

        let guard = FinishGuard {
            generating: Arc::clone(&self.generating),
            events: self.events.clone(),
        };
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        let spawned = spawn_worker("ollama-gen-generate", move || async move {
            let _guard = guard;
            if let Err(e) = run_generation(client.as_ref(), request, &events, &cancel).await {
                error!("Generation failed: {}", e);
                let _ = events.send(SessionEvent::Append(format!("\n[ERROR] {}\n", e.user_message())));
                let _ = events.send(SessionEvent::Status(Status::Error));
            }
        });

        // If the thread never started, the guard was dropped with the closure
        // and has already reset the flag and sent `Finished`.
        Ok(spawned?)
    }

    /// Asks the running generation to stop after the line it is reading.
    pub fn stop(&self) {
        self.cancel.cancel();
        if self.is_generating() {
            self.send(SessionEvent::Status(Status::Stopping));
        }
    }

    /// Fetches the model list in the background and reports it as [`SessionEvent::Models`].
    pub fn refresh_models(&self) -> Result<JoinHandle<()>, SessionError> {
        let client = Arc::clone(&self.client);
        let events = self.events.clone();

        let handle = spawn_worker("ollama-gen-models", move || async move {
            let event = match client.list_models().await {
                Ok(models) => SessionEvent::Models {
                    names: models.into_iter().map(|m| m.name).collect(),
                    error: None,
                },
                Err(e) => {
                    warn!("Could not load model list: {}", e);
                    SessionEvent::Models {
                        names: FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
                        error: Some(format!("Error loading models: {}", e)),
                    }
                }
            };
            let _ = events.send(event);
        })?;
        Ok(handle)
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event dropped: receiver closed");
        }
    }
}

/// Forwards non-empty fragments as they arrive, then a newline, then the stats.
async fn run_generation(
    client: &dyn Generate,
    request: GenerationRequest,
    events: &UnboundedSender<SessionEvent>,
    cancel: &CancelFlag,
) -> Result<(), ClientError> {
    let chunk_events = events.clone();
    let on_chunk = Box::new(move |chunk: &str| {
        if !chunk.is_empty() {
            let _ = chunk_events.send(SessionEvent::Append(chunk.to_string()));
        }
    });

    let outcome = client.generate(request, on_chunk, cancel).await?;

    let _ = events.send(SessionEvent::Append("\n".to_string()));
    if let Some(result) = outcome.result {
        let _ = events.send(SessionEvent::Stats(result));
    }
    Ok(())
}

/// Clears the in-flight flag and reports `Ready` then `Finished` however the
/// worker exits, so an error status never outlives the generation.
struct FinishGuard {
    generating: Arc<AtomicBool>,
    events: UnboundedSender<SessionEvent>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let _ = self
                .events
                .send(SessionEvent::Append("\n[ERROR] generation worker panicked\n".to_string()));
            let _ = self.events.send(SessionEvent::Status(Status::Error));
        }
        self.generating.store(false, Ordering::Release);
        let _ = self.events.send(SessionEvent::Status(Status::Ready));
        let _ = self.events.send(SessionEvent::Finished);
    }
}

/// Runs an async job to completion on its own thread with a private runtime.
fn spawn_worker<F, Fut>(name: &str, job: F) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    std::thread::Builder::new().name(name.to_string()).spawn(move || {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(job()),
            Err(e) => {
                error!("Failed to build worker runtime: {}", e);
                drop(job);
            }
        }
    })
}

/// Banner written to the transcript before each generation.
pub fn prompt_header(prompt: &str, at: DateTime<Local>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n[{}] Prompt: {prompt}\n{rule}\n", at.format("%H:%M:%S"))
}

/// Model to select after a refresh: the first listed one, if the current
/// choice is not among them.
pub fn pick_model(current: &str, available: &[String]) -> Option<String> {
    match available.first() {
        Some(first) if !available.iter().any(|m| m == current) => Some(first.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModelInfo;
    use crate::response::StreamOutcome;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::Semaphore;

    /// Replays a fixed script, optionally waiting on a gate before answering.
    struct Scripted {
        chunks: Vec<&'static str>,
        result: Option<GenerationResult>,
        fail: bool,
        gate: Option<Arc<Semaphore>>,
    }

    impl Scripted {
        fn new(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                result: Some(GenerationResult {
                    done_reason: Some("stop".to_string()),
                    ..Default::default()
                }),
                fail: false,
                gate: None,
            }
        }
    }

    fn decode_error() -> ClientError {
        serde_json::from_str::<u8>("nope").unwrap_err().into()
    }

    #[async_trait]
    impl Generate for Scripted {
        async fn stream_generate<'a>(
            &'a self,
            _request: GenerationRequest,
            mut on_chunk: Box<dyn for<'s> FnMut(&'s str) + Send + 'a>,
            cancel: &'a CancelFlag,
        ) -> crate::Result<StreamOutcome> {
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            for chunk in &self.chunks {
                if cancel.is_cancelled() {
                    return Ok(StreamOutcome::cancelled());
                }
                on_chunk(chunk);
            }
            if self.fail {
                return Err(decode_error());
            }
            Ok(StreamOutcome {
                result: self.result.clone(),
                cancelled: false,
            })
        }

        async fn generate_buffered(
            &self,
            _request: GenerationRequest,
        ) -> crate::Result<(String, GenerationResult)> {
            if self.fail {
                return Err(decode_error());
            }
            Ok((self.chunks.concat(), self.result.clone().unwrap_or_default()))
        }

        async fn list_models(&self) -> crate::Result<Vec<ModelInfo>> {
            if self.fail {
                return Err(decode_error());
            }
            Ok(vec![ModelInfo {
                name: "llama3:latest".to_string(),
                size: 0,
                modified_at: None,
            }])
        }
    }

    fn settings(stream: bool) -> SessionSettings {
        SessionSettings {
            model: "x".to_string(),
            processor: Processor::Cpu,
            stream,
        }
    }

    fn drain(receiver: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn appended(events: &[SessionEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Append(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_streaming_generation_event_order() {
        let (session, mut receiver) = Session::new(Arc::new(Scripted::new(vec!["a", "", "b"])));

        session.start("  hi  ", settings(true)).unwrap().join().unwrap();
        let events = drain(&mut receiver);

        assert_eq!(events[0], SessionEvent::Status(Status::Generating));
        assert!(matches!(&events[1], SessionEvent::Append(h) if h.contains("] Prompt: hi\n")));
        assert_eq!(events[2], SessionEvent::Append("a".to_string()));
        assert_eq!(events[3], SessionEvent::Append("b".to_string()));
        assert_eq!(events[4], SessionEvent::Append("\n".to_string()));
        assert!(matches!(&events[5], SessionEvent::Stats(r) if r.done_reason.as_deref() == Some("stop")));
        assert_eq!(events[6], SessionEvent::Status(Status::Ready));
        assert_eq!(events[7], SessionEvent::Finished);
        assert!(!session.is_generating());
    }

    #[test]
    fn test_buffered_generation_appends_whole_text() {
        let (session, mut receiver) = Session::new(Arc::new(Scripted::new(vec!["hel", "lo"])));

        session.start("hi", settings(false)).unwrap().join().unwrap();
        let events = drain(&mut receiver);

        assert!(appended(&events).ends_with("hello\n"));
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Stats(_))));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let (session, mut receiver) = Session::new(Arc::new(Scripted::new(vec![])));

        let err = session.start(" \n ", settings(true)).unwrap_err();

        assert!(matches!(err, SessionError::EmptyPrompt));
        assert_eq!(drain(&mut receiver), vec![SessionEvent::Status(Status::EmptyPrompt)]);
        assert!(!session.is_generating());
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let gate = Arc::new(Semaphore::new(0));
        let scripted = Scripted {
            gate: Some(Arc::clone(&gate)),
            ..Scripted::new(vec!["a"])
        };
        let (session, mut receiver) = Session::new(Arc::new(scripted));

        let handle = session.start("one", settings(true)).unwrap();
        assert!(session.is_generating());

        let err = session.start("two", settings(true)).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyGenerating));

        gate.add_permits(1);
        handle.join().unwrap();

        let events = drain(&mut receiver);
        assert!(events.contains(&SessionEvent::Status(Status::AlreadyGenerating)));
        assert_eq!(events.iter().filter(|e| **e == SessionEvent::Finished).count(), 1);
        assert!(!appended(&events).contains("Prompt: two"));

        session.start("three", settings(true)).unwrap().join().unwrap();
    }

    #[test]
    fn test_stop_cancels_before_next_chunk() {
        let gate = Arc::new(Semaphore::new(0));
        let scripted = Scripted {
            gate: Some(Arc::clone(&gate)),
            ..Scripted::new(vec!["a", "b"])
        };
        let (session, mut receiver) = Session::new(Arc::new(scripted));

        let handle = session.start("hi", settings(true)).unwrap();
        session.stop();
        gate.add_permits(1);
        handle.join().unwrap();

        let events = drain(&mut receiver);
        assert!(events.contains(&SessionEvent::Status(Status::Stopping)));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Stats(_))));
        assert!(!events.contains(&SessionEvent::Append("a".to_string())));
        let tail = &events[events.len() - 2..];
        assert_eq!(tail, [SessionEvent::Status(Status::Ready), SessionEvent::Finished]);
    }

    #[test]
    fn test_failure_reported_and_session_ready_again() {
        let scripted = Scripted {
            fail: true,
            ..Scripted::new(vec!["partial"])
        };
        let (session, mut receiver) = Session::new(Arc::new(scripted));

        session.start("hi", settings(true)).unwrap().join().unwrap();
        let events = drain(&mut receiver);

        let text = appended(&events);
        assert!(text.contains("partial"));
        assert!(text.contains("[ERROR] Invalid JSON from server:"));
        let tail = &events[events.len() - 3..];
        assert_eq!(
            tail,
            [
                SessionEvent::Status(Status::Error),
                SessionEvent::Status(Status::Ready),
                SessionEvent::Finished,
            ]
        );
        assert!(!session.is_generating());
    }

    #[test]
    fn test_refresh_models_success_and_fallback() {
        let (session, mut receiver) = Session::new(Arc::new(Scripted::new(vec![])));
        session.refresh_models().unwrap().join().unwrap();
        assert_eq!(
            drain(&mut receiver),
            vec![SessionEvent::Models {
                names: vec!["llama3:latest".to_string()],
                error: None,
            }]
        );

        let failing = Scripted {
            fail: true,
            ..Scripted::new(vec![])
        };
        let (session, mut receiver) = Session::new(Arc::new(failing));
        session.refresh_models().unwrap().join().unwrap();
        match drain(&mut receiver).pop() {
            Some(SessionEvent::Models { names, error }) => {
                assert_eq!(names, vec!["gpt-oss:20b", "qwen3-coder"]);
                assert!(error.unwrap().starts_with("Error loading models:"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_pick_model() {
        let available = vec!["llama3".to_string(), "qwen3-coder".to_string()];
        assert_eq!(pick_model("qwen3-coder", &available), None);
        assert_eq!(pick_model("gpt-oss:20b", &available), Some("llama3".to_string()));
        assert_eq!(pick_model("gpt-oss:20b", &[]), None);
    }

    #[test]
    fn test_prompt_header_format() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap();
        let header = prompt_header("Tell me a joke", at);
        let rule = "=".repeat(RULE_WIDTH);
        assert_eq!(header, format!("\n{rule}\n[09:03:07] Prompt: Tell me a joke\n{rule}\n"));
    }

    #[test]
    fn test_settings_request() {
        let req = settings(false).request("hi");
        assert_eq!(req.gpu_layers(), Some(0));
        assert!(!req.stream);
        assert_eq!(Processor::from_num_gpu(Some(99)), Processor::Gpu);
        assert_eq!(Processor::from_num_gpu(None), Processor::Gpu);
        assert_eq!(Status::Stopping.tone(), Tone::Warning);
    }
}

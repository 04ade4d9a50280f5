//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use conclave_application::{
    BreakerPolicy, ChannelSink, ChatService, CircuitBreakerRegistry, StreamingOrchestrator,
    new_conversation_id,
};
use conclave_domain::{ChatEvent, ChatMode, ChatRequest, ProviderId, SessionId};
use conclave_infrastructure::{
    ConfigLoader, FileConfig, InMemorySettingsStore, JsonlConversationStore, SessionHub,
    build_registry, http_client,
};
use conclave_presentation::{
    Cli, ConsoleRenderer, EventFormatter, JsonLinesFormatter, OutputFormat,
};
use std::io::{Read, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const EVENT_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    info!("Starting conclave");

    if cli.show_config {
        for source in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("  {}", source);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // === Configuration ===
    let config: FileConfig = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let prompt = read_prompt(cli.prompt.clone())?;
    let mode = ChatMode::from(cli.mode);

    // === Dependency Injection ===
    let client = http_client(config.call_timeout())?;
    let adapters = build_registry(&config, client)?;
    let settings = Arc::new(InMemorySettingsStore::new(config.provider_settings()?));
    let breakers = Arc::new(CircuitBreakerRegistry::new(
        BreakerPolicy::default().with_call_timeout(config.call_timeout()),
    ));
    let hub = Arc::new(SessionHub::default());

    let orchestrator = StreamingOrchestrator::new(
        Arc::new(config.catalog()?),
        adapters,
        settings,
        breakers,
        config.orchestrator_config()?,
    )
    .with_session_publisher(hub.clone());

    let mut service = ChatService::new(Arc::new(orchestrator));
    if let Some(path) = &cli.history {
        service = service.with_store(Arc::new(JsonlConversationStore::open(path)?));
    }

    // === Request ===
    let mut request = ChatRequest::new(prompt).with_mode(mode);
    if let Some(provider) = &cli.provider {
        request = request.with_preferred_provider(ProviderId::new(provider.as_str())?);
    }

    // The session must be bound before the debate starts publishing
    let _subscription = if mode == ChatMode::A2a {
        let raw = cli
            .session
            .clone()
            .unwrap_or_else(|| format!("a2a-{}", new_conversation_id()));
        let session = SessionId::parse(&raw)?;
        info!("Debate session {}", session);
        request = request.with_session_id(raw);
        Some(hub.bind(&session))
    } else {
        None
    };

    // === Run ===
    let (sink, events) = ChannelSink::channel(EVENT_BUFFER);
    let renderer: Box<dyn EventFormatter + Send> = match cli.output {
        OutputFormat::Text => Box::new(ConsoleRenderer::new()),
        OutputFormat::Json => Box::new(JsonLinesFormatter),
    };
    let printer = tokio::spawn(print_events(events, renderer));

    let result = service
        .send(cli.conversation.as_deref(), &request, &sink)
        .await;
    drop(sink);
    printer.await.context("Output task failed")??;

    match result {
        Ok(outcome) => {
            debug!("Answered by {}", outcome.provider_tag);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            debug!("Request failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Install the stderr subscriber, plus a daily rolling file when `--log-dir` is set.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "conclave.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// The prompt argument, or all of stdin when it is absent.
fn read_prompt(arg: Option<String>) -> Result<String> {
    let prompt = match arg {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read prompt from stdin")?;
            buf
        }
    };
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        bail!("A prompt is required (as an argument or on stdin).");
    }
    Ok(prompt)
}

async fn print_events(
    mut events: mpsc::Receiver<ChatEvent>,
    mut formatter: Box<dyn EventFormatter + Send>,
) -> Result<()> {
    let mut stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        if let Some(text) = formatter.format(&event) {
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

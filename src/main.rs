//! Tripsitter - a streaming chat companion with an emergency sentinel
//!
//! Streams replies from an OpenAI-compatible provider, reassembles them
//! into conversation history and escalates when the model answers with the
//! intervention sentinel.

mod config;
mod error;
mod intervention;
mod llm;
mod runtime;
mod session;
mod state_machine;
mod stream;
mod system_prompt;

use config::ChatConfig;
use futures::StreamExt;
use intervention::{InterventionDetector, InterventionNotifier, LogNotifier, WebhookNotifier};
use llm::{LoggingTransport, OpenAIService};
use runtime::{StdoutSink, TurnOrchestrator};
use session::ConversationSession;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USER_PROMPT: &str = "\n\nUSER: ";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stdout is the chat surface, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripsitter=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    let config = ChatConfig::from_env()?;

    let system_prompt = match &config.system_prompt_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading system prompt override");
            system_prompt::load_system_prompt(path)?
        }
        None => system_prompt::build_system_prompt(&config.substance, &config.dose, &config.sentinel),
    };

    let service = OpenAIService::new(
        config.api_key.clone(),
        config.model.clone(),
        Some(&config.base_url),
        config.timeout,
    )?;
    tracing::info!(model = %config.model, endpoint = %service.endpoint(), "Transport initialized");
    let transport = LoggingTransport::new(Arc::new(service));

    let notifier: Arc<dyn InterventionNotifier> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
        None => Arc::new(LogNotifier),
    };

    let mut orchestrator = TurnOrchestrator::new(
        ConversationSession::new(system_prompt),
        transport,
        StdoutSink,
        InterventionDetector::new(config.sentinel.clone(), config.sentinel_policy),
    )
    .with_notifier(notifier);

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    loop {
        print!("{USER_PROMPT}");
        std::io::stdout().flush()?;

        // Ctrl-C at the prompt exits
        let next = tokio::select! {
            next = lines.next() => next,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = next else {
            break;
        };
        let line = line?;

        // Ctrl-C aborts the turn in flight, not the process
        let token = orchestrator.cancel_token();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        let result = orchestrator.submit(&line).await;
        watcher.abort();

        match result {
            Ok(_) => {}
            Err(e) if e.is_recoverable() => {
                eprintln!("\n[reply interrupted: {e}]");
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                eprintln!("\n[error: {e}]");
            }
        }
    }

    let session = orchestrator.session();
    tracing::info!(
        messages = session.history().len(),
        state = session.state().name(),
        "Input closed, exiting"
    );
    Ok(())
}

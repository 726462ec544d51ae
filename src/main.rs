use anyhow::Result;
use ollama_chat::ui::{terminal_width, TerminalUI, TerminalView};
use ollama_chat::{ChatSession, Config};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_FILE: &str = ".ollama_chat.log";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::from_env()?;
    info!(endpoint = %config.endpoint, model = %config.model, "starting chat");

    let view = Arc::new(TerminalView::new(terminal_width()));
    let session = ChatSession::new(&config, view.clone());

    let mut ui = TerminalUI::new(session, view)?;
    ui.run().await?;

    Ok(())
}

/// Logs go to a file so they never interleave with the conversation.
fn init_logging() -> Result<()> {
    let log_path = dirs::home_dir()
        .map(|home| home.join(LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE));
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ollama_chat=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

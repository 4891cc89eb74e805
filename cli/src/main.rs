mod config;
mod logging;
mod message_sink;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use composer_tui::ComposerApp;
use composer_tui::ComposerParams;
use composer_tui::HttpAttachmentUploader;

use crate::config::ComposerConfig;
use crate::config::ConfigStore;
use crate::message_sink::MessageSink;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Compose chat messages with image and file attachments in the terminal"
)]
struct Cli {
    /// Reject every send (the composer stays editable).
    #[arg(long)]
    disabled: bool,

    /// Text shown while the composer is empty.
    #[arg(long)]
    placeholder: Option<String>,

    /// Clear the text after each send. Overrides `clear_on_send` in the config file.
    #[arg(long, value_name = "BOOL")]
    clear_on_send: Option<bool>,

    /// Conversation id passed along with every sent message.
    #[arg(long)]
    conversation_id: Option<String>,

    /// Base URL of the server that receives file uploads at `/upload`.
    #[arg(long, env = "CHAT_COMPOSER_SERVER_URL")]
    server_url: Option<String>,

    /// Append sent messages to this file as JSON lines instead of printing them on exit.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Read settings from this file instead of `~/.chat-composer/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the composer settings; flags win over the config file.
    fn composer_params(&self, config: &ComposerConfig) -> ComposerParams {
        ComposerParams {
            disabled: self.disabled,
            placeholder: self
                .placeholder
                .clone()
                .or_else(|| config.placeholder.clone()),
            clear_on_send: self.clear_on_send.unwrap_or(config.clear_on_send),
            conversation_id: self.conversation_id.clone(),
            image_bounds: config.image_bounds,
        }
    }

    fn server_url<'a>(&'a self, config: &'a ComposerConfig) -> &'a str {
        self.server_url.as_deref().unwrap_or(&config.server_url)
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(home) = dirs::home_dir() {
        match logging::init(&logging::default_log_dir(&home)) {
            Ok(path) => tracing::debug!("logging to {}", path.display()),
            Err(err) => eprintln!("warning: failed to set up logging: {err:#}"),
        }
    }

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let config = store
        .load()
        .with_context(|| format!("load {}", store.path().display()))?;

    let params = cli.composer_params(&config);
    let server_url = cli.server_url(&config);
    let uploader = HttpAttachmentUploader::new(server_url)
        .with_context(|| format!("invalid server url `{server_url}`"))?;
    tracing::info!(
        "starting composer (upload endpoint {}, disabled={}, clear_on_send={})",
        uploader.endpoint(),
        params.disabled,
        params.clear_on_send
    );

    let mut sink = MessageSink::open(cli.output.as_deref())?;
    let session = ComposerApp::new(params, Arc::new(uploader))
        .run(|content, conversation_id| {
            if let Err(err) = sink.record(content, conversation_id) {
                tracing::error!("failed to record sent message: {err:#}");
            }
        })
        .await;

    let recorded = sink.recorded();
    let exit_info = sink.finish_after(session, &mut std::io::stdout().lock())?;
    tracing::info!(
        "composer exited ({:?}) after {} sent message(s), {} recorded",
        exit_info.exit_reason,
        exit_info.messages_sent,
        recorded
    );
    Ok(())
}

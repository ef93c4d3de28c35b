//! Process bootstrap: logging, settings, and the service graph.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::bot::Dispatcher;
use crate::dialogue::controller::{DialogueController, Keywords};
use crate::dialogue::finalizer::ReportFinalizer;
use crate::dialogue::prompts::PromptRenderer;
use crate::messenger::client::{GraphMessenger, Messenger};
use crate::server::{self, AppState};
use crate::settings::{validate_url, BotSettings, Credentials, SettingsManager};
use crate::store::{HttpReportStore, MemoryReportStore, ReportStore};

use super::args::Args;

/// Everything the running bot needs.
pub struct BotContext {
    pub settings_manager: Arc<SettingsManager>,
    pub settings: BotSettings,
    pub dispatcher: Arc<Dispatcher>,
    pub state: Arc<AppState>,
    pub host: String,
    pub port: u16,
    shutdown: CancellationToken,
}

impl BotContext {
    /// Serve until Ctrl-C, then shut down.
    pub async fn run(self) -> Result<()> {
        let (addr, server) = server::start_server(
            &self.host,
            self.port,
            self.state.clone(),
            self.shutdown.clone(),
        )
        .await
        .with_context(|| format!("Failed to bind {}:{}", self.host, self.port))?;
        tracing::info!("flockbot ready on {}", addr);

        let sweeper = self
            .settings
            .dialogue
            .session_ttl_secs
            .map(|ttl| {
                self.dispatcher
                    .spawn_session_sweeper(Duration::from_secs(ttl), self.shutdown.clone())
            });

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        tracing::info!(
            "Shutting down with {} reports in progress",
            self.dispatcher.sessions().count()
        );

        self.shutdown.cancel();
        if let Err(e) = server.await {
            tracing::warn!("Server task ended abnormally: {}", e);
        }
        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }
        self.dispatcher.drain().await;
        Ok(())
    }
}

/// Install the tracing subscriber. `RUST_LOG` adds to the default directive.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    let directive = format!("flockbot={}", log_level)
        .parse()
        .context("Invalid log directive")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .try_init();
    Ok(())
}

/// Write the settings template for `--init-config`.
///
/// Returns the path and whether a new file was written.
pub async fn init_config(args: &Args) -> Result<(PathBuf, bool)> {
    let manager = SettingsManager::load(args.settings_path()).await?;
    let created = manager.ensure_settings_file().await?;
    Ok((manager.path().to_path_buf(), created))
}

/// Load settings and build the service graph.
pub async fn initialize(args: &Args) -> Result<BotContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(
        SettingsManager::load(args.settings_path())
            .await
            .context("Failed to initialize settings manager")?,
    );
    let settings = settings_manager.get().await;
    if settings_manager.exists() {
        tracing::debug!("Settings path: {}", settings_manager.path().display());
    } else {
        tracing::info!(
            "No settings file at {}, using defaults and environment",
            settings_manager.path().display()
        );
    }

    let credentials =
        Credentials::resolve(&settings.messenger).context("Messenger credentials incomplete")?;
    validate_url("graph_api_url", &settings.messenger.graph_api_url)?;

    let store = build_store(&settings)?;
    let messenger: Arc<dyn Messenger> = Arc::new(GraphMessenger::new(
        &settings.messenger.graph_api_url,
        credentials.page_access_token.clone(),
    ));
    let dispatcher = Arc::new(build_dispatcher(
        &settings,
        &credentials.server_url,
        messenger,
        store,
    ));

    let state = AppState::new(
        dispatcher.clone(),
        credentials.app_secret.clone(),
        credentials.validation_token.clone(),
    );

    Ok(BotContext {
        host: args
            .host
            .clone()
            .unwrap_or_else(|| settings.server.host.clone()),
        port: args.port.unwrap_or(settings.server.port),
        settings_manager,
        settings,
        dispatcher,
        state,
        shutdown: CancellationToken::new(),
    })
}

fn build_store(settings: &BotSettings) -> Result<Arc<dyn ReportStore>> {
    match settings.store.reports_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            validate_url("reports_url", url)?;
            tracing::info!("Reports go to {}", url);
            Ok(Arc::new(HttpReportStore::new(url)))
        }
        None => {
            tracing::warn!("No reports_url configured, reports are kept in memory");
            Ok(Arc::new(MemoryReportStore::new()))
        }
    }
}

/// Wire the dialogue components from settings.
pub fn build_dispatcher(
    settings: &BotSettings,
    server_url: &str,
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn ReportStore>,
) -> Dispatcher {
    let dialogue = &settings.dialogue;
    let renderer = PromptRenderer::new(
        server_url,
        dialogue.primary_trigger(),
        dialogue.primary_cancel(),
    );
    let controller = DialogueController::new(
        Keywords {
            trigger: dialogue.trigger_keywords.clone(),
            cancel: dialogue.cancel_keywords.clone(),
        },
        renderer,
    );
    let finalizer = ReportFinalizer::new(
        dialogue.reporter_name.clone(),
        dialogue.flock_id.clone(),
        server_url,
    );
    Dispatcher::new(controller, finalizer, messenger, store)
}

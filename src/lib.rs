//! WebCall - Audio-Calls über einen Room-Server
//!
//! Ein kleiner Client zum Starten oder Beitreten von Calls:
//! - Token-API für Room-URL und Access-Token
//! - Austauschbarer Room-Client (Standard: WebSocket)
//! - Call-Manager mit explizitem Verbindungsstatus
//! - Ein-Button-Oberfläche im Terminal

pub mod call;
pub mod config;
pub mod session;
pub mod token;
pub mod ui;

#[cfg(test)]
mod testing;

use call::CallSessionManager;
use config::WebCallConfig;
use session::{SessionClientFactory, WsRoomClientFactory};
use std::sync::Arc;
use token::{HttpTokenProvider, TokenError};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use ui::{CallShell, Page};

// ============================================================================
// LOGGING
// ============================================================================

/// Initialisiert das Logging (nach stderr, stdout gehört der Oberfläche)
///
/// `RUST_LOG` wird respektiert, die Defaults kommen zusätzlich dazu.
pub fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["webcall_lib=debug", "webcall=debug", "tokio_tungstenite=warn"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// APPLICATION
// ============================================================================

/// Baut die Oberfläche samt Call-Manager aus der Konfiguration
pub fn build_shell(
    config: &WebCallConfig,
    client_factory: Arc<dyn SessionClientFactory>,
) -> Result<CallShell, TokenError> {
    let token_provider = HttpTokenProvider::new(
        &config.host,
        config.api_key.clone(),
        config.token_endpoint,
        config.call_data.clone(),
    )?;

    if config.api_key.is_none() {
        tracing::warn!("No API key configured, starting calls will fail");
    }

    let manager = CallSessionManager::new(Arc::new(token_provider), client_factory);
    let page = Page::from_url(&config.page_url, config);
    tracing::info!("Showing {:?}", page);

    Ok(CallShell::new(manager, page))
}

/// Startet die Terminal-Oberfläche mit dem WebSocket-Room-Client
pub async fn run(config: WebCallConfig) -> anyhow::Result<()> {
    let shell = build_shell(&config, Arc::new(WsRoomClientFactory))?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    ui::run_terminal(&shell, stdin, tokio::io::stdout()).await?;

    // Offenen Call beim Beenden sauber trennen
    if shell.manager().is_connected() {
        shell.manager().end_call().await?;
    }

    tracing::info!("Bye");
    Ok(())
}

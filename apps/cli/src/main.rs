//! coreup entry point: connects to the router, follows progress, and
//! triggers the core update on Enter.

mod adapter;
mod config;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use coreup_connection::{ConnectionEvent, ConnectionManager, RouterEndpoint};
use coreup_session::{Status, UpdateSession};

use crate::adapter::RouterAdapter;
use crate::config::Config;

const MIXED_CONTENT_HELP: &str =
    "The router refused the WebSocket upgrade. If you reached this host through \
     an HTTPS page, allow mixed content so the plain HTTP endpoint can be used.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting coreup");

    // Load configuration.
    let config = match Config::load() {
        Ok(c) => {
            tracing::info!(url = %c.url, realm = %c.realm, "configuration loaded");
            c
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Config::default()
        }
    };

    let manager = Arc::new(ConnectionManager::new(RouterEndpoint {
        url: config.url.clone(),
        realm: config.realm.clone(),
    }));
    let mut events = manager
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("event channel already taken"))?;

    // Connection lifecycle printer.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Opened { session_id } => {
                    println!("Connected (session {session_id}).");
                }
                ConnectionEvent::Closed { reason } => {
                    if reason.is_mixed_content() {
                        println!("{MIXED_CONTENT_HELP}");
                    }
                    println!("Connection closed: {reason}");
                }
            }
        }
    });

    let client = manager.open().await?;
    let adapter = Arc::new(RouterAdapter::new(client));

    let session = Arc::new(UpdateSession::new(&config.service, &config.package));
    session.subscribe_progress(adapter.as_ref()).await;

    // Status renderer: prints each observable transition.
    {
        let session = session.clone();
        tokio::spawn(async move {
            let mut last: Option<Status> = None;
            let mut ticker = tokio::time::interval(Duration::from_millis(250));
            loop {
                ticker.tick().await;
                let status = session.status();
                if last.as_ref() != Some(&status) {
                    render(&status);
                    last = Some(status);
                }
            }
        });
    }

    println!("Press Enter to trigger the core update (Ctrl-D quits).");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while lines.next_line().await?.is_some() {
        // Triggers run detached so progress keeps rendering while the
        // call is in flight; repeated Enters are guarded by the session.
        let session = session.clone();
        let adapter = adapter.clone();
        tokio::spawn(async move {
            session.trigger(adapter.as_ref()).await;
        });
    }

    manager.shutdown().await;
    Ok(())
}

fn render(status: &Status) {
    match status {
        Status::Idle => {}
        Status::Updating(progress) if progress.is_empty() => {}
        Status::Updating(progress) => println!("{progress}"),
        Status::Succeeded => println!("Successfully updated core"),
        Status::Failed(message) => println!("Error: {message}"),
    }
}

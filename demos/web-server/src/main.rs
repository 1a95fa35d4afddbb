//! Runnable agent-hub server with a demo echo agent.
//!
//! Run with: cargo run -p web-server-demo
//!
//! Then talk to it, e.g.:
//!   curl -X POST localhost:5000/msg_sync -H 'content-type: application/json' \
//!        -d '{"text": "hello"}'

use std::{net::SocketAddr, sync::Arc, time::Duration};

use agent_hub_core::{AgentError, AgentLoop, EntryKind, Log};
use agent_hub_session::{JsonFileStorage, MessageService, ModelConfigStore, ServiceConfig};
use agent_hub_transport::{AppState, router};
use anyhow::Context as _;
use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo loop: streams an echo of the input into the log with a short
/// simulated work delay, so polling clients see in-place revisions.
struct EchoAgent;

#[async_trait]
impl AgentLoop for EchoAgent {
    async fn respond(&self, log: Arc<Log>, input: String) -> Result<String, AgentError> {
        log.set_progress("Thinking...");
        let no = log.append(
            EntryKind::Agent,
            Some("Agent response".to_string()),
            String::new(),
        );

        let reply = format!("You said: {input}");
        for end in 1..=reply.len() {
            if !reply.is_char_boundary(end) {
                continue;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            let partial = reply[..end].to_string();
            log.update(no, |entry| entry.content = partial)
                .map_err(|e| AgentError::new(e.to_string()))?;
        }

        log.set_progress("");
        Ok(reply)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let chats_dir = std::env::var("CHATS_DIR").unwrap_or_else(|_| "./chats".to_string());
    let storage = Arc::new(JsonFileStorage::new(chats_dir));

    let service = MessageService::init(Arc::new(EchoAgent), storage, ServiceConfig::default())
        .await
        .context("failed to load persisted chats")?;

    let models_path = std::env::var("MODELS_CONFIG").unwrap_or_else(|_| "./config.json".to_string());
    let app = router(AppState {
        service: Arc::new(service),
        models: Arc::new(ModelConfigStore::new(models_path)),
    });

    let port = std::env::var("WEB_UI_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

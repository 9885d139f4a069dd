use std::sync::Arc;

use axum::{routing::get, Router};
use scout_ui_types::{AgentState, FindingEvent};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::handlers::{health_check, ws_handler};
use crate::script::Script;

/// What the mock remembers about the current run. Sent back to every console
/// that connects, findings included.
#[derive(Debug, Default)]
pub struct RunState {
    pub state: AgentState,
    pub findings: Vec<FindingEvent>,
}

#[derive(Clone)]
pub struct AppState {
    pub script: Arc<Script>,
    pub run: Arc<Mutex<RunState>>,
}

pub struct MockController {
    state: AppState,
}

impl MockController {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::with_script(Script::create_test_script()?))
    }

    pub fn with_script(script: Script) -> Self {
        Self {
            state: AppState {
                script: Arc::new(script),
                run: Arc::new(Mutex::new(RunState::default())),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/ws", get(ws_handler))
            .with_state(self.state.clone())
    }

    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let app = self.router();
        tracing::info!("Mock controller listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Mock controller error: {}", e))
    }

    pub async fn bind(self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }
}

mod config;
mod dataset;
mod llm;
mod routes;
mod services;
mod state;
mod tools;
mod workspace;

use std::sync::Arc;

use crate::state::AppState;
use crate::tools::python::PyTools;
use crate::workspace::{RunLog, Workspace};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env();

    let workspace = Arc::new(
        Workspace::init(&config.data_dir, &config.images_dir).expect("workspace init failed"),
    );
    let run_log = Arc::new(RunLog::new(workspace.log_path().to_path_buf()));

    // Initialize LLM client (non-fatal: AI features disabled if key missing).
    let llm: Option<Arc<dyn llm::LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured — chat and insights disabled");
            None
        }
    };

    let tools = Arc::new(PyTools::new(
        config.python_bin.clone(),
        config.scripts_dir.clone(),
        config.tool_timeout,
        RunLog::new(workspace.log_path().to_path_buf()),
    ));

    let state = AppState::new(workspace, run_log, llm, tools.clone(), tools.clone(), tools);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "rtgs-analyst listening");
    axum::serve(listener, app).await.expect("server failed");
}

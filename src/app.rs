use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::application::ClassifyUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::interfaces::http::{add_log, start_server, AppState, LogEntry};

pub fn run() -> Result<()> {
    let config = ConfigService::new().load()?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .try_init();

    if config.llm.api_key.is_none() {
        warn!(
            provider = ?config.llm.provider,
            "No API key configured; submissions will fail until one is provided"
        );
    }

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    let classify_use_case = ClassifyUseCase::new(llm_client);
    let state = Arc::new(AppState::new(
        classify_use_case,
        config.llm.clone(),
        Duration::from_secs(config.server.session_ttl_secs),
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = start_server(state, logs.clone(), &config.server).map_err(|err| {
            error!(
                error = %err,
                host = %config.server.host,
                port = config.server.port,
                "Failed to start HTTP server"
            );
            err
        })?;

        let message = format!(
            "Bug intake server listening on {}:{} (model={})",
            config.server.host, config.server.port, config.llm.model
        );
        info!("{}", message);
        add_log(&logs, "INFO", "System", &message);

        server.await?;
        info!("Server stopped");
        Ok::<(), AppError>(())
    })
}

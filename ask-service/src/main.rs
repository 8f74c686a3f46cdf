use ask_service::config::AskConfig;
use ask_service::startup::Application;
use service_core::observability::{init_metrics, init_tracing, install_panic_hook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AskConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "ask-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );
    install_panic_hook();
    init_metrics();

    let app = Application::build(config).await?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    tracing::info!("Server stopped");
    Ok(())
}

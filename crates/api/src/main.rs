use anyhow::Context;

use echoes_api::app::{Services, build_app};
use echoes_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("invalid configuration")?;
    echoes_observability::init(config.log_format);

    let services = Services::from_config(&config).context("failed to set up provider client")?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, provider = ?config.provider, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;

use shapes_api::app::{build_app, AppServices};
use shapes_infra::{ServerConfig, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shapes_observability::init();

    let server = ServerConfig::from_env()?;
    let store = StoreConfig::from_env()?;

    let services = AppServices::from_config(&store).await?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", server.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tallybook_observability::init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        tracing::warn!("BIND_ADDR not set; using default 0.0.0.0:8080");
        "0.0.0.0:8080".to_string()
    });

    let app = tallybook_api::app::build_app();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}

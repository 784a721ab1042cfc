use anyhow::Result;
use filedrop_axum::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    let addr = config.addr();

    tracing::info!(
        upload_root = %config.files.upload_root.display(),
        catalog = %config.files.catalog_path.display(),
        max_file_size = config.files.max_file_size_bytes,
        "starting filedrop"
    );

    let app = filedrop_axum::build(config).await?;
    app.listen(addr).await?;

    Ok(())
}

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod sys_catfact;
pub mod sys_core;
pub mod sys_fileapi;
pub mod sys_statichost;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = sys_core::core::ServiceConfig::from_env();

    // The upload directory is the whole data set; without it nothing works.
    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        error!("could not create upload dir {}: {}", config.upload_dir.display(), e);
        std::process::exit(1);
    }

    info!(
        port = config.port,
        uploads = %config.upload_dir.display(),
        "starting dropbin"
    );

    if let Err(e) = sys_core::handlers::run_server(config).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}

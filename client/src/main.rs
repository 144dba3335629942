mod cli;
mod render;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // logs a stderr: stdout queda para el progreso
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("client=info,poller=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run().await
}

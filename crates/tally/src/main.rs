use tally::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TallyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("TALLY_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let server = TallyServer::builder().bind(&addr).build().await?;
    if let Ok(local) = server.local_addr() {
        tracing::info!(addr = %local, "listening");
    }
    server.run().await
}

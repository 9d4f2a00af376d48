use eventos::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting eventos");

    // Load configuration
    let config = startup::load_config().await?;

    // Start the client
    startup::start_app(config).await
}

use sieve_api::setup;
use sieve_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (storage, transport, classifier, routes)
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    // Drain listeners after the HTTP server has stopped accepting requests
    state.shutdown().await;

    Ok(())
}

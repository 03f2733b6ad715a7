use distributed_calc::agent::client::OrchestratorClient;
use distributed_calc::agent::pool::AgentPool;
use distributed_calc::config::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AgentConfig::from_env();

    tracing::info!(
        "Starting agent with {} workers, connecting to {}",
        config.computing_power,
        config.orchestrator_url
    );

    let client = OrchestratorClient::new(&config.orchestrator_url);
    let pool = AgentPool::new(client, config.computing_power);

    for handle in pool.start() {
        handle.await?;
    }

    Ok(())
}

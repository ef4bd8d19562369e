mod app;
mod config;
mod models;
mod services;

use tracing_subscriber::EnvFilter;

use app::App;
use services::seed;
use services::ChatStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = ChatStore::with_conversations(seed::sample_conversations());
    App::new(store).run().await
}

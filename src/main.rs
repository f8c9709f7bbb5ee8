use metrics_query_simulator::{api, config::Config, logging, metrics};
use tracing::error;

#[tokio::main]
async fn main() {
    // Initialize logging
    logging::init_logger();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize metrics
    metrics::init_metrics();

    if let Err(e) = api::start_server(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

//! Entry point for the flowise-mcp stdio server.

use flowise_mcp::{stdio, FlowiseClient, FlowiseToolServer, Settings};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    env_logger::Builder::new()
        .filter_level(settings.log_level)
        .init();

    let client = match FlowiseClient::new(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("flowise-mcp connected to {}", settings.endpoint);

    let server = Arc::new(FlowiseToolServer::new(Arc::clone(&client)));
    if let Err(e) = stdio::serve(server).await {
        log::error!("stdio transport failed: {}", e);
    }

    // serve() shuts the protocol down on EOF; this is a no-op then, but keeps
    // the release guaranteed if the transport bailed early.
    client.close();
}

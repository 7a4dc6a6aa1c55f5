//! `zrpc-server`: serve the demonstration methods over ZeroMQ
//!
//! Configured from the environment (`ZRPC_BIND`, `ZRPC_BATCH_MODE`,
//! `ZRPC_MAX_BATCH_SIZE`, `ZRPC_OBSERVABILITY`, `RUST_LOG`).

use zrpc::methods::demo_router;
use zrpc_server::{ServerBuilder, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServerConfig::from_env()?;

    // With observability on, the builder installs the subscriber itself.
    if !config.observability {
        zrpc_core::init_logging("info")?;
    }

    let server = ServerBuilder::from_config(&config)
        .service_name("zrpc-server")
        .router(demo_router())
        .build()
        .await?;

    tracing::info!(
        endpoint = %server.local_endpoint(),
        batch_mode = %config.batch_mode,
        max_batch_size = ?config.max_batch_size,
        methods = ?server.router().methods(),
        "Serving"
    );

    let result = server.run().await;
    if config.observability {
        zrpc_core::shutdown_observability();
    }
    result?;
    Ok(())
}

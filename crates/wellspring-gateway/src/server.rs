use std::net::SocketAddr;

use tracing::info;
use wellspring_common::{Error, Result};

use crate::router::build_router;
use crate::state::SharedState;

/// Bind and serve the HTTP API until the process is stopped.
pub async fn serve(state: SharedState, addr: SocketAddr) -> Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;

    info!("listening on {addr}");
    axum::serve(listener, router)
        .await
        .map_err(|e| Error::Config(format!("server error: {e}")))
}

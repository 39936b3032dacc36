//! Archivarius HTTP service
//!
//! Exposes the archive operations of `archivarius-core` over HTTP, both
//! inline and as tracked background sessions.

pub mod api;
pub mod error;
pub mod state;

pub use api::router;
pub use error::ApiError;
pub use state::AppState;

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Serve `state` on `addr` until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

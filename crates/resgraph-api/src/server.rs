use crate::{create_router, AppState};
use resgraph_core::{ConfigManager, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(addr: SocketAddr, config: Arc<ConfigManager>) -> Result<Self> {
        let state = AppState::new(config).await?;
        Ok(Self { state, addr })
    }

    pub async fn run(self) -> Result<()> {
        let backend = self.state.backend_name();
        let router = create_router(self.state);

        info!("Starting ResGraph API server on {} (backend: {})", self.addr, backend);

        // Bind with tuned socket options for better keep-alive behavior
        let listener = {
            let socket = if self.addr.is_ipv6() {
                tokio::net::TcpSocket::new_v6()
            } else {
                tokio::net::TcpSocket::new_v4()
            }?;

            // Reuse addr to improve rebind under restarts
            if let Err(e) = socket.set_reuseaddr(true) {
                warn!("Failed to set SO_REUSEADDR: {}", e);
            }
            if let Err(e) = socket.set_keepalive(true) {
                warn!("Failed to enable TCP keepalive: {}", e);
            }

            socket.bind(self.addr)?;
            socket.listen(1024)?
        };

        info!("Server listening on http://{}", self.addr);
        info!("API documentation:");
        info!("  GET /resources?<key>=<value> - List resources by property equality");
        info!("  GET /resources/{{id}} - Get resource by ID");
        info!("  GET /resources/{{id}}/depends - Resource with its dependency IDs");
        info!("  GET /health - Liveness check");
        info!("  GET /api-docs/openapi.json - OpenAPI document");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

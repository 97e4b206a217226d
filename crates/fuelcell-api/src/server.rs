use crate::{create_router, AppState};
use fuelcell_core::{FuelCellError, Result};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn new(state: AppState) -> Result<Self> {
        let server = &state.config.server;
        let addr: SocketAddr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| {
                FuelCellError::Config(format!(
                    "invalid listen address {}:{}: {}",
                    server.host, server.port, e
                ))
            })?;

        Ok(Self { state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> Result<()> {
        let narrative = self.state.narrative_enabled();
        let router = create_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!("Fuel cell analysis API listening on http://{}", self.addr);
        info!(narrative_enabled = narrative, "Endpoints:");
        info!("  GET  /health");
        info!("  POST /api/curve-analysis");
        info!("  POST /api/ai-analysis");
        info!("  POST /api/report/segment");
        info!("  POST /api/predict");
        info!("  GET  /api/predictions | POST /api/predictions");
        info!("  GET  /api/predictions/{{id}}");

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
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

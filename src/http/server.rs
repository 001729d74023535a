//! Server lifecycle.
//!
//! # Responsibilities
//! - Run the application listener and the metrics listener side by side
//! - Keep the two independent: a failure in one is logged and never stops the other
//! - On shutdown: drain levers, stop accepting, wait for in-flight requests
//!   up to the grace period, abandon whatever is left by the hard deadline
//!
//! # Design Decisions
//! - The metrics listener has no graceful phase; it is abandoned at exit
//! - Both timeouts are bounded waits, so shutdown can never hang

use std::future::Future;
use std::io;

use axum::{extract::State, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tokio::time::Instant;

use crate::config::ServerConfig;
use crate::lifecycle::{signals, Drain, ServerState};
use crate::observability::Metrics;

/// Path of the Prometheus scrape endpoint on the metrics listener.
pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Owns both listeners and the shutdown sequence.
pub struct Server {
    service_name: String,
    config: ServerConfig,
    router: Router,
    metrics: Metrics,
    drain: Drain,
    state: watch::Sender<ServerState>,
}

impl Server {
    /// Create a server. Nothing is bound until [`Server::run`].
    ///
    /// `drain` must be the same coordinator the router hands out levers from.
    pub fn new(
        service_name: impl Into<String>,
        config: ServerConfig,
        router: Router,
        metrics: Metrics,
        drain: Drain,
    ) -> Self {
        let (state, _) = watch::channel(ServerState::Created);
        Self {
            service_name: service_name.into(),
            config,
            router,
            metrics,
            drain,
            state,
        }
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Run until SIGINT/SIGTERM, then shut down gracefully.
    pub async fn run_until_signal(self) -> Result<(), ServerError> {
        self.run(signals::interrupt()).await
    }

    /// Run until `shutdown` resolves, then shut down gracefully.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            service_name,
            config,
            router,
            metrics,
            drain,
            state,
        } = self;

        tokio::spawn(serve_metrics(
            service_name.clone(),
            config.metrics_address(),
            metrics,
        ));

        let address = config.app_address();
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => {
                tracing::error!(service = %service_name, address = %address, error = %source, "Server failed to bind");
                transition(&state, ServerState::Stopped);
                return Err(ServerError::Bind { address, source });
            }
        };

        tracing::info!(service = %service_name, address = %address, "Server listening");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });
        transition(&state, ServerState::Running);

        tokio::pin!(shutdown);
        let early_exit = tokio::select! {
            joined = &mut serving => Some(joined),
            () = &mut shutdown => None,
        };

        if let Some(joined) = early_exit {
            let result = served(joined);
            if let Err(e) = &result {
                tracing::error!(service = %service_name, error = %e, "Server stopped unexpectedly");
            }
            transition(&state, ServerState::Stopped);
            return result;
        }

        transition(&state, ServerState::ShuttingDown);
        tracing::info!(service = %service_name, "Shutdown activated");

        if let Err(e) = drain.shutdown(config.grace_period()).await {
            tracing::error!(service = %service_name, error = %e, "Drain did not complete");
        }

        let _ = stop_tx.send(());
        let hard_deadline = Instant::now() + config.hard_deadline();

        let result = match tokio::time::timeout(config.grace_period(), &mut serving).await {
            Ok(joined) => served(joined),
            Err(_) => {
                tracing::warn!(
                    service = %service_name,
                    grace_period = ?config.grace_period(),
                    "Some connections not finished"
                );
                serving.abort();
                if tokio::time::timeout_at(hard_deadline, &mut serving).await.is_err() {
                    tracing::error!(
                        service = %service_name,
                        hard_deadline = ?config.hard_deadline(),
                        "Server task did not stop before the hard deadline"
                    );
                }
                Ok(())
            }
        };

        transition(&state, ServerState::Stopped);
        tracing::info!(service = %service_name, "Server stopped");
        result
    }
}

fn served(joined: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    Ok(joined??)
}

fn transition(state: &watch::Sender<ServerState>, next: ServerState) {
    let previous = state.send_replace(next);
    tracing::debug!(from = %previous, to = %next, "Server state changed");
}

/// Serve the scrape endpoint until the process exits. Errors are logged, never propagated.
async fn serve_metrics(service_name: String, address: String, metrics: Metrics) {
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(service = %service_name, address = %address, error = %e, "Metrics server failed to bind");
            return;
        }
    };

    tracing::info!(service = %service_name, address = %address, "Metrics server listening");

    let app = Router::new()
        .route(METRICS_PATH, get(render_metrics))
        .with_state(metrics);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(service = %service_name, error = %e, "Metrics server stopped");
    }
}

async fn render_metrics(State(metrics): State<Metrics>) -> String {
    metrics.render()
}

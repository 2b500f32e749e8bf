use crate::config::Config;
use crate::hn::{HackerNewsClient, HnEndpoints};
use crate::state::AppState;
use crate::stories::latency::spawn_reporter;
use crate::stories::{LatencyRecorder, StoryService};
use crate::utils::fmt_duration;
use crate::web::create_router;
use anyhow::Context;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
    latency: Arc<LatencyRecorder>,
    shutdown: CancellationToken,
}

impl App {
    /// Build the upstream client and story service from a validated config.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        config.validate().context("Invalid configuration")?;

        let endpoints = HnEndpoints::from_config(&config);
        info!(
            best_stories = endpoints.best_stories_url(),
            max_concurrent_requests = config.max_concurrent_requests,
            cache_ttl = fmt_duration(config.cache_ttl),
            upstream_timeout = fmt_duration(config.upstream_timeout),
            "upstream configured"
        );
        let client = HackerNewsClient::new(endpoints, config.upstream_timeout)
            .context("Failed to create Hacker News client")?;

        let shutdown = CancellationToken::new();
        let latency = Arc::new(
            LatencyRecorder::new().context("Failed to create latency recorder")?,
        );
        let stories = Arc::new(StoryService::new(
            Arc::new(client),
            config.max_concurrent_requests,
            config.cache_ttl,
            latency.clone(),
            shutdown.child_token(),
        ));

        Ok(App {
            app_state: AppState::new(stories).with_admin_ops(config.enable_admin_ops),
            config,
            latency,
            shutdown,
        })
    }

    /// Serve HTTP until a shutdown signal arrives.
    pub async fn run(self) -> ExitCode {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, %addr, "failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(%addr, "web server listening");

        let reporter = spawn_reporter(
            self.latency.clone(),
            self.config.latency_report_interval,
            self.shutdown.clone(),
        );

        let router = create_router(self.app_state.clone(), self.config.request_timeout);
        let shutdown = self.shutdown.clone();
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            shutdown.cancel();
        });

        let server_shutdown = self.shutdown.clone();
        let server = tokio::spawn(async move { server.await });

        // Bound how long in-flight requests may hold up exit once draining starts.
        let exit = tokio::select! {
            joined = server => match joined {
                Ok(Ok(())) => ExitCode::SUCCESS,
                Ok(Err(e)) => {
                    error!(error = %e, "web server failed");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    error!(error = %e, "web server task panicked");
                    ExitCode::FAILURE
                }
            },
            _ = async {
                server_shutdown.cancelled().await;
                tokio::time::sleep(self.config.shutdown_timeout).await;
            } => {
                warn!(
                    timeout = fmt_duration(self.config.shutdown_timeout),
                    "graceful shutdown timed out"
                );
                ExitCode::FAILURE
            }
        };

        self.shutdown.cancel();
        if let Err(e) = reporter.await {
            warn!(error = %e, "latency reporter task failed");
        }
        info!("shutdown complete");
        exit
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

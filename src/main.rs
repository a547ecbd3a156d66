//! trainedmodel-webhook - Validating admission webhook for KServe TrainedModel resources.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Creates the Kubernetes client from ambient credentials
//! - Starts the health server and, when certificates are present, the webhook server
//!
//! No leader election: the webhook is stateless and every replica serves.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{error, info, warn};

use trainedmodel_webhook::health::{HealthState, run_health_server};
use trainedmodel_webhook::{
    KubeServiceLister, TrainedModelValidator, WebhookConfig, WebhookState, run_webhook_server,
};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainedmodel_webhook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting trainedmodel-webhook");

    // Both kube and axum-server pull in rustls; pick the provider explicitly
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    let config = Arc::new(WebhookConfig::from_env()?);
    info!(
        protocols = %config.protocols_display(),
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        lookup_timeout_secs = config.lookup_timeout.as_secs(),
        "Loaded configuration"
    );

    // In-cluster service account, falling back to kubeconfig
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let health_state = Arc::new(HealthState::new());

    // Start health server immediately so liveness works before TLS is ready
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let validator = TrainedModelValidator::new(
        config.clone(),
        Arc::new(KubeServiceLister::new(client)),
    )
    .with_health_state(health_state.clone());
    let webhook_state = Arc::new(WebhookState::new(validator, Some(health_state.clone())));

    // Only start the webhook server if certificates are available
    let webhook_handle = if Path::new(&config.cert_path).exists()
        && Path::new(&config.key_path).exists()
    {
        info!("TLS certificates found, starting webhook server");
        let config = config.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = run_webhook_server(webhook_state, &config).await {
                error!("Webhook server error: {}", e);
            }
        });
        health_state.set_ready(true).await;
        Some(handle)
    } else {
        warn!(
            cert_path = %config.cert_path,
            key_path = %config.key_path,
            "Webhook certificates not found, webhook server disabled"
        );
        None
    };

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        result = async {
            match webhook_handle {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        } => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the Service stops routing admission requests here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

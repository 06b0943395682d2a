//! Visitors Kubernetes Operator
//!
//! ## Usage
//!
//! ```bash
//! # Run the operator (requires kubeconfig)
//! visitors-operator
//!
//! # Watch a single namespace with debug logging
//! RUST_LOG=debug visitors-operator --namespace visitors
//! ```

use clap::Parser;
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use visitors_operator::{ReconcilerConfig, VisitorAppController};

/// Visitors Kubernetes Operator
#[derive(Parser, Debug)]
#[command(name = "visitors-operator")]
#[command(version, about = "Kubernetes Operator for the Visitors site")]
struct Args {
    /// Namespace to watch (empty for all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Seconds between readiness checks while MySQL is starting
    #[arg(long, default_value_t = 5)]
    database_poll_interval_secs: u64,

    /// Seconds to wait before retrying a failed reconciliation
    #[arg(long, default_value_t = 30)]
    error_requeue_secs: u64,
}

impl Args {
    fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            database_poll_interval: Duration::from_secs(self.database_poll_interval_secs),
            error_requeue: Duration::from_secs(self.error_requeue_secs),
        }
    }

    fn watch_namespace(&self) -> Option<String> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(self.namespace.clone())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args = Args::parse();

    info!("Starting Visitors Kubernetes Operator");
    info!(
        "Watching namespace: {}",
        args.watch_namespace().as_deref().unwrap_or("all")
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let controller = Arc::new(VisitorAppController::new(
        client,
        args.watch_namespace(),
        args.reconciler_config(),
    ));

    // The controller stops on SIGTERM/SIGINT by itself.
    if let Err(e) = controller.run().await {
        error!("VisitorApp controller error: {}", e);
        return Err(e.into());
    }

    info!("Visitors Operator shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["visitors-operator"]);
        assert_eq!(args.reconciler_config(), ReconcilerConfig::default());
        assert!(args.watch_namespace().is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "visitors-operator",
            "--namespace",
            "visitors",
            "--database-poll-interval-secs",
            "2",
        ]);
        assert_eq!(args.watch_namespace().as_deref(), Some("visitors"));
        assert_eq!(
            args.reconciler_config().database_poll_interval,
            Duration::from_secs(2)
        );
    }
}

//! IRSA Cross-Account S3 Probe
//!
//! Uses the AWS default credential chain (IRSA web identity in EKS) for the
//! ambient identity. No static keys in code or config.

use anyhow::{Context, Result};
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use irsa_s3_probe::config::{Config, LogFormat};
use irsa_s3_probe::server::{self, AppState};
use irsa_s3_probe::{AwsSts, CredentialBroker, S3Connector};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    config.validate().context("Invalid configuration")?;

    info!("🚀 Starting IRSA cross-account S3 probe");
    info!(
        role = %config.target_role,
        bucket = %config.bucket,
        key = %config.object_key,
        "Target configured"
    );

    let sdk_config = load_sdk_config(&config).await;
    match sdk_config.region() {
        Some(region) => info!("Using region: {}", region),
        None => info!("No region configured, relying on SDK defaults"),
    }

    let sts = Arc::new(AwsSts::new(&sdk_config));
    let connector = Arc::new(S3Connector::new(
        sdk_config.clone(),
        config.bucket_region.clone(),
    ));
    let broker = CredentialBroker::new(sts.clone(), connector, config.session_name.clone());

    let state = AppState {
        sts,
        broker: Arc::new(broker),
        role: config.role(),
        location: config.location(),
    };

    let app = server::router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("📡 Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_target(false).init(),
    }
}

/// Region and timeout overrides on top of the default provider chain
async fn load_sdk_config(config: &Config) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(timeout) = config.call_timeout() {
        loader = loader.timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build(),
        );
    }

    loader.load().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}

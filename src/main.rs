//! Demo host: one managed HTTP service under coordinated shutdown.
//!
//! Startup sequence: load config, build the coordinator, wire OS
//! signals, register and start the service, advertise it to the
//! registry if one is configured, then block in
//! `wait_for_termination` until the process is asked to stop and the
//! service has drained.

use std::path::PathBuf;

use axum::{routing::get, Router};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servicekit::lifecycle::{listen_for_signals, Coordinator, ServiceBinding};
use servicekit::net::{mutual_tls_config, HttpService};
use servicekit::registry::{RegistryClient, ServiceRegistration};
use servicekit::Settings;

#[derive(Parser, Debug)]
#[command(name = "servicekit", about = "Demo service host")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servicekit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = servicekit::load_config(&args.config)?;

    // Required keys abort startup when absent.
    let service_name = settings.require_string("service.name");
    let listen_addr = settings.require_string("service.listen_addr");

    let coordinator = Coordinator::new();
    listen_for_signals(&coordinator)?;

    let router = Router::new().route("/health", get(|| async { "ok" }));
    let mut service = HttpService::new(service_name.clone(), router);

    if let Some(key) = settings.get_string("tls.key") {
        let cert = settings.require_string("tls.cert");
        let client_ca = settings.require_string("tls.client_ca");
        let tls = mutual_tls_config(
            key.as_ref(),
            cert.as_ref(),
            client_ca.as_ref(),
        )
        .await?;
        service = service.with_tls(tls);
    }

    coordinator.register(&mut service);

    if let Some(registry_addr) = settings.get_string("registry.address") {
        advertise(&settings, &registry_addr, &service_name, &coordinator).await?;
    }

    tokio::spawn(async move {
        if let Err(e) = service.start(&listen_addr).await {
            tracing::error!(error = %e, "Service failed");
        }
    });

    coordinator.wait_for_termination().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Advertise the service to the registry and arrange for withdrawal
/// once shutdown is triggered.
async fn advertise(
    settings: &Settings,
    registry_addr: &str,
    service_name: &str,
    coordinator: &Coordinator,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = RegistryClient::new(registry_addr, None);
    let id = settings
        .get_string("service.id")
        .unwrap_or_else(|| service_name.to_string());

    let registration = ServiceRegistration {
        id: Some(id.clone()),
        name: Some(service_name.to_string()),
        address: settings.get_string("service.advertise_addr"),
        port: settings
            .get_string("service.port")
            .and_then(|p| p.parse().ok()),
        ..Default::default()
    };
    client.register_service(&registration).await?;
    tracing::info!(service_id = %id, registry = %registry_addr, "Registered with service registry");

    // The withdrawal holds its own barrier slot so the process
    // cannot exit while the deregister call is still in flight.
    let mut withdrawal = ServiceBinding::new(format!("{id}-withdrawal"));
    coordinator.register(&mut withdrawal);
    let token = coordinator.cancel_token();
    tokio::spawn(async move {
        token.cancelled().await;
        match client.deregister_service(&id).await {
            Ok(()) => tracing::info!(service_id = %id, "Deregistered from service registry"),
            Err(e) => tracing::warn!(service_id = %id, error = %e, "Failed to deregister"),
        }
        withdrawal.finished();
    });

    Ok(())
}

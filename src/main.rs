use rabbitmq_conversion::config::WebhookConfig;
use rabbitmq_conversion::server::{
    build_rustls_config, create_metrics, initialize_tls, run_webhook_server,
    run_webhook_server_tls, shutdown_channel, wait_for_signal, ReadinessState, ServerState,
};
use std::time::Duration;
use tracing::{error, info, warn};

/// How long to wait for the server task to drain after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting RabbitmqCluster conversion webhook");

    let config = WebhookConfig::from_env();
    info!(
        tls = config.tls_enabled,
        service = %config.service_name,
        namespace = %config.namespace,
        port = config.listen_port(),
        "Configuration loaded"
    );

    let (shutdown_controller, shutdown_signal) = shutdown_channel();
    let readiness = ReadinessState::new();
    let metrics = create_metrics()?;
    let state = ServerState::new(readiness.clone(), metrics);

    let mut server_handle = if config.tls_enabled {
        let client = kube::Client::try_default().await.map_err(|e| {
            error!(error = %e, "Failed to create Kubernetes client");
            e
        })?;
        info!("Connected to Kubernetes cluster");

        let bundle = initialize_tls(&client, &config).await.map_err(|e| {
            error!(error = ?e, "Failed to initialize TLS certificates");
            anyhow::anyhow!("TLS init error: {}", e)
        })?;
        let tls_config = build_rustls_config(&bundle)
            .map_err(|e| anyhow::anyhow!("TLS config error: {}", e))?;
        info!("Webhook TLS initialized");

        let port = config.https_port;
        tokio::spawn(run_webhook_server_tls(
            port,
            state,
            tls_config,
            shutdown_signal,
        ))
    } else {
        warn!("Webhook TLS disabled - the API server will not call a plain HTTP webhook");
        let port = config.http_port;
        tokio::spawn(run_webhook_server(port, state, shutdown_signal))
    };

    // The server marks readiness itself once its listener is bound
    let signal = tokio::select! {
        signal = wait_for_signal() => signal,
        result = &mut server_handle => {
            readiness.set_not_ready();
            return match result {
                Ok(Ok(())) => Err(anyhow::anyhow!("Webhook server exited unexpectedly")),
                Ok(Err(e)) => {
                    error!(error = %e, "Webhook server failed");
                    Err(anyhow::Error::new(e).context("Webhook server failed"))
                }
                Err(e) => Err(anyhow::anyhow!("Webhook server task panicked: {}", e)),
            };
        }
    };
    info!(signal = signal, "Initiating graceful shutdown");

    // Stop receiving traffic before the listener goes away
    readiness.set_not_ready();
    shutdown_controller.shutdown();

    match tokio::time::timeout(SHUTDOWN_GRACE, server_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "Webhook server failed during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Webhook server task panicked"),
        Err(_) => warn!("Server did not drain in time"),
    }

    info!("Conversion webhook shut down gracefully");
    Ok(())
}

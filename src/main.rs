mod telemetry;

use guild_reminder_dispatcher::Application;
use guild_reminder_infra::{setup_context, Config};
use telemetry::{get_subscriber, init_subscriber};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("guild_reminder".into(), "info".into());
    init_subscriber(subscriber)?;

    let config = Config::new().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    let context = setup_context(config);
    let app = Application::new(context);

    tokio::select! {
        _ = app.start() => {},
        signal = shutdown_signal() => {
            info!("Received {}. Exiting gracefully...", signal);
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            error!("Unable to listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl-C"
}

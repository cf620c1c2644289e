//! HubLink client: connects to the hub and logs the realtime session.

use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt};

use hublink_core::config::AppConfig;
use hublink_core::error::AppError;
use hublink_realtime::notification::Notification;
use hublink_realtime::{NotificationStatus, RealtimeClient, SessionToken, SubscriptionSet};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "hublink", version, about = "HubLink realtime client")]
struct Args {
    /// Configuration environment; loads `config/<env>.toml` over the defaults
    #[arg(long)]
    env: Option<String>,

    /// Server URL, overrides `realtime.server_url`
    #[arg(long)]
    url: Option<String>,

    /// Endpoint path, overrides `realtime.path`
    #[arg(long)]
    path: Option<String>,

    /// Session token to log in with
    #[arg(long)]
    token: Option<String>,

    /// Log every delivery of this event (repeatable)
    #[arg(long = "listen", value_name = "EVENT")]
    listen: Vec<String>,

    /// Send one tracked request with this event name
    #[arg(long, value_name = "EVENT")]
    emit: Option<String>,

    /// JSON payload of the tracked request
    #[arg(long, value_name = "JSON", default_value = "{}")]
    payload: String,

    /// Event that resolves the request as successful
    #[arg(long, value_name = "EVENT")]
    resolve_success: Option<String>,

    /// Event that resolves the request as failed
    #[arg(long, value_name = "EVENT")]
    resolve_error: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_configuration(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment, then apply flags
fn load_configuration(args: &Args) -> Result<AppConfig, AppError> {
    let env = args
        .env
        .clone()
        .or_else(|| std::env::var("HUBLINK_ENV").ok())
        .unwrap_or_else(|| "development".to_string());

    let mut config = AppConfig::load(&env)?;
    if let Some(url) = &args.url {
        config.realtime.server_url = url.clone();
    }
    if let Some(path) = &args.path {
        config.realtime.path = path.clone();
    }
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig, args: Args) -> Result<(), AppError> {
    tracing::info!("Starting HubLink client v{}", env!("CARGO_PKG_VERSION"));

    let client = RealtimeClient::connect(&config);
    if let Some(token) = &args.token {
        client.session().login(SessionToken::new(token.clone()))?;
    }

    // ── Connection state ─────────────────────────────────────────
    let observer = client.observer();
    let mut connected = observer.watch();
    tokio::spawn(async move {
        while connected.changed().await.is_ok() {
            let now = *connected.borrow_and_update();
            tracing::info!(connected = now, "Connection state changed");
        }
    });

    // ── Listened events ──────────────────────────────────────────
    let mut listeners = SubscriptionSet::new();
    for event in &args.listen {
        let name = event.clone();
        listeners.push(client.facade().on(event.as_str(), move |values| {
            tracing::info!(event = %name, args = %serde_json::Value::Array(values.to_vec()), "Event received");
        }));
    }

    // ── Notifications ────────────────────────────────────────────
    let mut notifications = client.store().subscribe();
    tokio::spawn(async move {
        while notifications.changed().await.is_ok() {
            let items = notifications.borrow_and_update().clone();
            for n in items.iter() {
                tracing::info!(
                    id = %n.id,
                    status = %n.status,
                    title = %n.title,
                    body = %n.body,
                    "Notification"
                );
            }
            if items.is_empty() {
                tracing::info!("No notifications");
            }
        }
    });

    let mut binder = client.binder();
    if let Some(event) = &args.resolve_success {
        binder = binder.bind_outcome(event.as_str(), NotificationStatus::Success, "Completed");
    }
    if let Some(event) = &args.resolve_error {
        binder = binder.bind_outcome(event.as_str(), NotificationStatus::Error, "Failed");
    }
    binder.mount();

    if let Some(event) = &args.emit {
        let mut payload: Value = serde_json::from_str(&args.payload)?;
        let id = Notification::generate_id();
        if let Value::Object(fields) = &mut payload {
            fields.insert("notificationId".to_string(), Value::String(id.clone()));
        }

        let timeout = Duration::from_secs(config.realtime.connect_timeout_seconds);
        let mut ready = observer.watch();
        match tokio::time::timeout(timeout, ready.wait_for(|c| *c)).await {
            Ok(Ok(_)) => {}
            _ => tracing::warn!("Not connected yet, request will stay pending"),
        }

        binder.track(
            Notification::pending(id, event.clone(), args.payload.clone()),
            event.as_str(),
            vec![payload],
        );
    }

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    binder.unmount();
    listeners.release_all();
    drop(observer);
    client.shutdown().await;

    tracing::info!(metrics = ?client.metrics(), "HubLink client stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
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

//! Vigil - proxy companion for AI chat services.
//!
//! Configures a PAC-based system proxy for the chat hosts, keeps request
//! diagnostics, and watches the shared presence service for concurrent
//! usage.

mod dispatch;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tokio::sync::mpsc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigil_core::{mask_secret, ProxyConfig};
use vigil_presence::{summarize, PresenceClient, Update, UsagePoller, DEFAULT_BASE_URL};
use vigil_proxy::{
    DiagnosticsRecorder, DiagnosticsState, ProxyController, SystemProxySettings,
};
use vigil_storage::Database;

use dispatch::{Command, Dispatcher, Response};

/// Vigil - proxy companion for AI chat services
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Args {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Cli,
}

#[derive(Subcommand, Debug)]
enum Cli {
    /// Save the proxy configuration (leaves the proxy disabled)
    Set {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Enable and apply the stored proxy configuration
    Enable,
    /// Disable the proxy and restore direct connections
    Disable,
    /// Show the diagnostics snapshot
    Status,
    /// Reset the diagnostics counters and log
    Reset,
    /// Run the presence poller, printing summaries
    Watch {
        /// Seconds between presence checks
        #[arg(long, default_value_t = 5)]
        interval: u64,
        /// Presence service base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        endpoint: String,
    },
}

fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "vigil", "vigil").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging: rolling file plus console.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigil={},warn", args.log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("vigil")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                return Some(guard);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args);

    let db = Arc::new(Database::new()?);
    let persisted: Option<DiagnosticsState> = db.load_diagnostics()?;
    let diagnostics = match persisted {
        Some(state) => DiagnosticsRecorder::with_state(db.clone(), state),
        None => DiagnosticsRecorder::new(db.clone()),
    };
    let settings = Arc::new(SystemProxySettings::new()?);
    let controller = ProxyController::new(settings, diagnostics.clone());
    let app_id = db.get_or_create_app_id()?;
    let presence = PresenceClient::new()?;
    let dispatcher = Dispatcher::new(
        db.clone(),
        controller,
        diagnostics,
        presence,
        app_id.clone(),
    );

    match args.command {
        Cli::Set {
            host,
            port,
            username,
            password,
        } => {
            tracing::info!(
                host = %host,
                port,
                username = %username,
                password = %mask_secret(&password),
                "Saving proxy configuration"
            );
            db.save_proxy_config(&ProxyConfig {
                host,
                port,
                username,
                password,
                enabled: false,
            })?;
            println!("Configuration saved. Run `vigil enable` to apply.");
        }
        Cli::Enable => {
            db.set_proxy_enabled(true)?;
            dispatcher.handle(Command::ApplyProxy).await?;
            println!("Proxy enabled.");
        }
        Cli::Disable => {
            db.set_proxy_enabled(false)?;
            dispatcher.handle(Command::DisableProxy).await?;
            println!("Proxy disabled.");
        }
        Cli::Status => {
            if let Response::Snapshot(snap) = dispatcher.handle(Command::GetProxyStatus).await? {
                print!("{}", status::render(&snap));
            }
        }
        Cli::Reset => {
            dispatcher.handle(Command::ResetProxyStats).await?;
            println!("Diagnostics reset.");
        }
        Cli::Watch { interval, endpoint } => {
            watch(&dispatcher, &db, &app_id, interval, &endpoint).await?;
        }
    }

    Ok(())
}

/// Runs the presence poll loop until interrupted.
async fn watch(
    dispatcher: &Dispatcher,
    db: &Database,
    app_id: &str,
    interval: u64,
    endpoint: &str,
) -> Result<()> {
    // Startup behavior: a previously enabled proxy is re-applied, but a
    // failure here must not keep the watcher from running.
    if db.load_proxy_config()?.enabled {
        if let Err(e) = dispatcher.handle(Command::ApplyProxy).await {
            tracing::warn!("Failed to re-apply proxy on startup: {}", e);
        }
    }

    let client = PresenceClient::with_base_url(endpoint)?;
    let (tx, mut rx) = mpsc::channel(16);
    let poller = Arc::new(UsagePoller::new(
        client,
        app_id,
        Duration::from_secs(interval),
        tx,
    ));

    let ticker = poller.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tick.tick().await;
            ticker.tick(false).await;
        }
    });

    println!("Watching presence every {}s on {} (Ctrl-C to stop)", interval, endpoint);
    while let Some(update) = rx.recv().await {
        match update {
            Update::Refresh => println!("Checking..."),
            Update::ViewStatus(view) => {
                if let Some(summary) = summarize(&view, app_id, Utc::now()) {
                    println!("{}", status::render_summary(&summary));
                }
            }
        }
    }

    Ok(())
}

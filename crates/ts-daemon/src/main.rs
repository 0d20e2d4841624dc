//! tabsaver daemon: polls the battery relay and asks before saving power.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use ts_core::config::{Config, LogFormat};
use ts_core::cooldown::SystemClock;
use ts_daemon::agent::Agent;
use ts_daemon::daemon::Daemon;
use ts_daemon::dispatch::{HostEvent, Lifecycle};
use ts_daemon::host::console::ConsoleNotifier;
use ts_daemon::host::memory::MemoryBrowser;
use ts_daemon::host::Host;
use ts_daemon::timers::TokioTimers;
use ts_relay::RelayClient;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "tabsaver-daemon", version, about = "Battery-aware tab saver agent")]
struct Args {
    /// Config file (default: ~/.tabsaver/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON session describing the windows and tabs to manage.
    #[arg(long)]
    session: Option<PathBuf>,

    /// Emit logs as JSON regardless of the configured format.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path.clone())
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    if args.json_logs || config.general.log_format == LogFormat::Json {
        ts_telemetry::logging::init_logging_json("tabsaver-daemon", &config.general.log_level);
    } else {
        ts_telemetry::logging::init_logging("tabsaver-daemon", &config.general.log_level);
    }

    let data_dir = Config::data_dir();
    let lifecycle = if data_dir.exists() {
        Lifecycle::Startup
    } else {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        Lifecycle::Installed
    };

    let relay = RelayClient::from_config(&config.relay).context("failed to build relay client")?;
    info!(relay = relay.base_url(), "relay configured");

    let browser = match &args.session {
        Some(path) => MemoryBrowser::load(path).context("failed to load session")?,
        None => {
            warn!("no --session given, managing an empty browser");
            MemoryBrowser::default()
        }
    };
    info!(tabs = browser.tab_count(), "browser session ready");

    let (tx, rx) = flume::unbounded::<HostEvent>();

    let notifier = Arc::new(ConsoleNotifier::new());
    notifier.clone().spawn_input(tx.clone());

    let host = Host {
        notifier,
        tabs: Arc::new(browser),
        timers: Arc::new(TokioTimers::new(tx.clone())),
    };

    let agent = Agent::new(&config, Arc::new(relay), host, Arc::new(SystemClock));
    let mut daemon = Daemon::new(agent, rx);

    let shutdown = daemon.shutdown_handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("ctrl-c received, initiating shutdown");
        shutdown.trigger();
    });

    #[cfg(unix)]
    spawn_reload_listener(tx.clone())?;
    drop(tx);

    let summary = daemon.run(lifecycle).await;
    info!(events = summary.events_handled, "tabsaver daemon exited");
    Ok(())
}

/// Turn SIGHUP into a `Reloaded` lifecycle event.
#[cfg(unix)]
fn spawn_reload_listener(events: flume::Sender<HostEvent>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, re-arming");
            if events
                .send_async(HostEvent::Lifecycle(Lifecycle::Reloaded))
                .await
                .is_err()
            {
                break;
            }
        }
    });
    Ok(())
}

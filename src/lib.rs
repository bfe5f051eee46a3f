/*!
 # Crash Restarter

 A daemon that supervises multiplayer game servers rented from third-party
 hosting panels, detects crashed instances through an external status API,
 and restarts them by driving the panel's web UI over a WebDriver
 automation endpoint. State changes are pushed to an operator webhook.

 ## Overview

 The crate provides:
 - Per-server monitoring loops with confirmation delays and cooldowns
 - A mutex-guarded, lazily-created, time-bounded browser session shared by
   all monitors for restart actions
 - Reachability gating so a dead *host* (which the panel cannot restart
   anyway) suppresses restart attempts instead of burning them
 - Fire-and-forget operator notifications via a Discord-compatible webhook

 ## Basic Usage

 ```no_run
 use crash_restarter::{Result, Supervisor};

 #[tokio::main]
 async fn main() -> Result<()> {
     let supervisor = Supervisor::from_config_file("config.json")?;
     // Runs until the process is terminated.
     supervisor.run().await
 }
 ```
*/

pub mod config;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod panel;
pub mod reachability;
pub mod server;
pub mod status;

pub use config::Config;
pub use error::{Error, Result};
pub use monitor::{MonitorConfig, ServerMonitor};
pub use server::{RestartTarget, ServerDescriptor, ServerId};

use crate::notify::{NotificationSink, WebhookNotifier};
use crate::panel::{PanelCredentials, RestartClient, WebDriverFactory};
use crate::reachability::SystemPing;
use crate::status::HttpStatusProbe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Delay between monitor task launches, so N servers do not fire their
/// first probes simultaneously.
const STARTUP_STAGGER: Duration = Duration::from_secs(5);

/// Configure and run the monitoring daemon.
///
/// The supervisor builds the shared collaborators (status probe,
/// reachability checker, restart client, notification sink), spawns one
/// monitor task per configured server, and then waits on them — which in
/// normal operation means forever. All public methods are instrumented
/// with `tracing` spans.
pub struct Supervisor {
    config: Config,
    monitor_config: MonitorConfig,
}

impl Supervisor {
    /// Creates a supervisor from a configuration file path.
    #[tracing::instrument(skip(path), fields(config_path = ?path.as_ref()))]
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = Config::from_file(path)?;
        Self::new(config)
    }

    /// Creates a supervisor from a configuration string.
    #[tracing::instrument(skip(config))]
    pub fn from_config_str(config: &str) -> Result<Self> {
        let config = Config::parse_from_str(config)?;
        Self::new(config)
    }

    /// Creates a supervisor from an already-parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] when the configuration fails
    /// validation (no servers, inconsistent restart targets, missing
    /// credentials).
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)?;
        Ok(Self {
            config,
            monitor_config: MonitorConfig::default(),
        })
    }

    /// Overrides the monitor timing (used by tests and for tuning).
    pub fn with_monitor_config(mut self, monitor_config: MonitorConfig) -> Self {
        self.monitor_config = monitor_config;
        self
    }

    /// Spawns one monitor per configured server and waits on all of them.
    ///
    /// Monitors run until process termination; this method only returns
    /// early if no valid server descriptors could be built.
    #[tracing::instrument(skip(self), fields(num_servers = self.config.servers.len()))]
    pub async fn run(self) -> Result<()> {
        let servers = self.config.descriptors();
        if servers.is_empty() {
            return Err(Error::ConfigInvalid(
                "No usable server descriptors".to_string(),
            ));
        }

        let notifier: Arc<dyn NotificationSink> =
            Arc::new(WebhookNotifier::new(self.config.webhook.clone())?);
        let probe = Arc::new(HttpStatusProbe::new()?);
        let reachability = Arc::new(SystemPing::new());
        let factory = Arc::new(WebDriverFactory::new(&self.config.panel.webdriver)?);
        let restarter = Arc::new(RestartClient::new(
            factory,
            PanelCredentials {
                user: self.config.panel.user.clone(),
                password: self.config.panel.password.clone(),
            },
        ));

        let mut handles = Vec::with_capacity(servers.len());
        for server in servers {
            let monitor = ServerMonitor::new(
                server,
                self.monitor_config.clone(),
                probe.clone(),
                reachability.clone(),
                restarter.clone(),
                notifier.clone(),
            );
            handles.push(tokio::spawn(monitor.run()));
            tokio::time::sleep(STARTUP_STAGGER).await;
        }

        tracing::info!(monitors = handles.len(), "All monitors started");

        // Monitors never finish on their own; this keeps the process alive
        // for as long as they run.
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Monitor task ended unexpectedly");
            }
        }

        Ok(())
    }
}

/// Per-server monitoring state machine.
///
/// One [`ServerMonitor`] runs per configured server, forever. Each cycle
/// polls the status API, double-checks a reported death after a
/// confirmation delay, gates the escalation on host reachability, and
/// finally drives the shared restart client. Every failure mode inside a
/// cycle is absorbed where it occurs — an ambiguous probe counts as alive,
/// a failed restart becomes an operator notification plus a cooldown — so
/// no single server's misbehavior can stop its monitor or any other.
use crate::notify::{COLOR_ALERT, COLOR_SUCCESS, NotificationSink};
use crate::panel::PanelRestarter;
use crate::reachability::ReachabilityProbe;
use crate::server::ServerDescriptor;
use crate::status::{ProbeReport, StatusProbe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Monitor timing configuration.
///
/// The defaults trade latency for precision: a restart kicks every player
/// on the server, so a death is only acted on after two probes agree
/// minutes apart, and cooldowns keep a flapping panel from being hammered.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Baseline sleep between poll cycles.
    pub poll_interval: Duration,
    /// Wait between the first dead probe and the confirming probe.
    pub confirm_delay: Duration,
    /// Wait between reachability re-checks while the host is down.
    pub unreachable_retry: Duration,
    /// Extra wait after a successful restart before polling resumes.
    pub cooldown_after_success: Duration,
    /// Extra wait after a failed restart attempt.
    pub cooldown_after_failure: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(180),
            confirm_delay: Duration::from_secs(120),
            unreachable_retry: Duration::from_secs(300),
            cooldown_after_success: Duration::from_secs(180),
            cooldown_after_failure: Duration::from_secs(420),
        }
    }
}

/// The per-server monitor.
///
/// Owns its descriptor (including the mutable name/address caches) and its
/// dedup flag; shares the probe, reachability checker, restart client, and
/// notification sink with every other monitor.
pub struct ServerMonitor {
    server: ServerDescriptor,
    config: MonitorConfig,
    probe: Arc<dyn StatusProbe>,
    reachability: Arc<dyn ReachabilityProbe>,
    restarter: Arc<dyn PanelRestarter>,
    notifier: Arc<dyn NotificationSink>,
    /// Set after the first "host unreachable" notification; cleared the
    /// moment the host is observed reachable again. Keeps a long outage
    /// from spamming the operator every retry cycle.
    unreachable_notified: bool,
}

impl ServerMonitor {
    pub fn new(
        server: ServerDescriptor,
        config: MonitorConfig,
        probe: Arc<dyn StatusProbe>,
        reachability: Arc<dyn ReachabilityProbe>,
        restarter: Arc<dyn PanelRestarter>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            server,
            config,
            probe,
            reachability,
            restarter,
            notifier,
            unreachable_notified: false,
        }
    }

    /// Runs the monitoring loop forever.
    ///
    /// The loop has no error exit: everything fallible inside a cycle is
    /// handled at its site, and the baseline inter-cycle sleep always
    /// follows.
    pub async fn run(mut self) {
        tracing::info!(
            server_id = %self.server.id,
            guid = %self.server.guid,
            "Started monitoring"
        );
        loop {
            self.cycle().await;
            sleep(self.config.poll_interval).await;
        }
    }

    /// One full poll cycle: probe, confirm, escalate if needed.
    async fn cycle(&mut self) {
        if self.probe_once().await {
            return;
        }

        tracing::warn!(
            server_id = %self.server.id,
            name = %self.server.display_name,
            "Server reported offline, confirming after delay"
        );
        sleep(self.config.confirm_delay).await;

        if self.probe_once().await {
            tracing::info!(
                server_id = %self.server.id,
                name = %self.server.display_name,
                "Server recovered before confirmation, no restart"
            );
            return;
        }

        tracing::warn!(
            server_id = %self.server.id,
            name = %self.server.display_name,
            "Server confirmed offline, restart needed"
        );
        self.escalate().await;
    }

    /// Probes the status API once and applies the descriptor side effects.
    ///
    /// Returns true when the server should be treated as alive. Ambiguous
    /// responses count as alive: an unreachable or garbled status API must
    /// never trigger a restart.
    async fn probe_once(&mut self) -> bool {
        match self.probe.probe(&self.server.guid).await {
            ProbeReport::Online { name, address } => {
                if let Some(name) = name {
                    self.server.update_display_name(&name);
                }
                if let Some(address) = address {
                    self.server.last_known_address = Some(address);
                }
                tracing::debug!(
                    server_id = %self.server.id,
                    name = %self.server.display_name,
                    "Server is online"
                );
                true
            }
            ProbeReport::Offline => false,
            ProbeReport::Ambiguous(reason) => {
                tracing::warn!(
                    server_id = %self.server.id,
                    name = %self.server.display_name,
                    reason = %reason,
                    "Ambiguous status response, treating server as alive"
                );
                true
            }
        }
    }

    /// Confirmed-dead path: reachability gate, then the restart attempt.
    async fn escalate(&mut self) {
        loop {
            if !self.host_reachable().await {
                if !self.unreachable_notified {
                    self.notifier
                        .notify(
                            &format!("Ping failed for server {}!", self.server.id),
                            &format!(
                                "Server {} is down but its host does not answer pings. \
                                 Holding the restart until the host is reachable again.",
                                self.server.display_name
                            ),
                            COLOR_ALERT,
                        )
                        .await;
                    self.unreachable_notified = true;
                } else {
                    tracing::debug!(
                        server_id = %self.server.id,
                        "Host still unreachable, notification already sent"
                    );
                }
                sleep(self.config.unreachable_retry).await;
                continue;
            }

            self.unreachable_notified = false;

            self.notifier
                .notify(
                    &format!("ALARM! Server {} down!", self.server.id),
                    &format!("Restarting server {}!", self.server.display_name),
                    COLOR_ALERT,
                )
                .await;

            match self
                .restarter
                .restart(&self.server.display_name, &self.server.restart_target)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        server_id = %self.server.id,
                        name = %self.server.display_name,
                        "Restart succeeded"
                    );
                    self.notifier
                        .notify(
                            "Restart",
                            &format!(
                                "Successfully restarted server {}.",
                                self.server.display_name
                            ),
                            COLOR_SUCCESS,
                        )
                        .await;
                    sleep(self.config.cooldown_after_success).await;
                }
                Err(e) => {
                    tracing::error!(
                        server_id = %self.server.id,
                        name = %self.server.display_name,
                        error = %e,
                        "Restart failed"
                    );
                    self.notifier
                        .notify(
                            "Restart",
                            &format!(
                                "Restart of server {} failed: {}. Trying again next cycle.",
                                self.server.display_name, e
                            ),
                            COLOR_ALERT,
                        )
                        .await;
                    sleep(self.config.cooldown_after_failure).await;
                }
            }

            return;
        }
    }

    /// Reachability gate for the last known address.
    ///
    /// No known address means we cannot distinguish a dead host from a
    /// dead game process, so the restart is not blocked on missing data.
    async fn host_reachable(&self) -> bool {
        match self.server.last_known_address.as_deref() {
            Some(address) => self.reachability.is_reachable(address).await,
            None => true,
        }
    }
}

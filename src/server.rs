/// Server descriptor types.
///
/// A [`ServerDescriptor`] is the static identity of one monitored game
/// server, built once from configuration and owned by its monitor for the
/// lifetime of the process. The only mutable pieces are opportunistic
/// caches fed by status-API responses: the display name and the last known
/// network address.
use std::fmt;

/// Stable identity of a monitored server within this process.
///
/// Assigned sequentially from configuration order starting at 1; used only
/// in logs and operator notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerId(pub u32);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-specific restart target.
///
/// Exactly one variant applies to a given server; the config validator
/// rejects entries that specify both or neither, so once a descriptor
/// exists the choice of backend is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartTarget {
    /// Direct restart endpoint on the classic panel; hitting it while
    /// authenticated triggers the restart.
    PanelUrl(String),
    /// Numeric service id on the alternate panel; the restart is a click
    /// on the service dashboard.
    ServiceId(u64),
}

/// Static configuration record for one monitored server.
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    /// Log/notification identity.
    pub id: ServerId,
    /// Opaque identifier used to query the status API.
    pub guid: String,
    /// Human-readable name. Starts out equal to `guid` and is overwritten
    /// once the status API resolves a real name; never reset back to the
    /// guid afterwards.
    pub display_name: String,
    /// Where to send the restart action.
    pub restart_target: RestartTarget,
    /// Network address seen in the most recent status response, used for
    /// reachability checks. May be stale or absent.
    pub last_known_address: Option<String>,
}

impl ServerDescriptor {
    /// Creates a descriptor with the display name initialized to the guid.
    pub fn new(id: ServerId, guid: impl Into<String>, restart_target: RestartTarget) -> Self {
        let guid = guid.into();
        Self {
            id,
            display_name: guid.clone(),
            guid,
            restart_target,
            last_known_address: None,
        }
    }

    /// Records a name reported by the status API.
    ///
    /// Keeps the display name monotonic: the guid placeholder is only ever
    /// replaced by a real name, and a real name is never replaced by the
    /// guid again.
    pub fn update_display_name(&mut self, name: &str) {
        if name != self.guid && name != self.display_name {
            tracing::debug!(
                server_id = %self.id,
                old = %self.display_name,
                new = %name,
                "Resolved server name"
            );
            self.display_name = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_starts_as_guid() {
        let server = ServerDescriptor::new(
            ServerId(1),
            "abcd-1234",
            RestartTarget::PanelUrl("https://panel.example/restartService".into()),
        );
        assert_eq!(server.display_name, "abcd-1234");
        assert!(server.last_known_address.is_none());
    }

    #[test]
    fn display_name_never_resets_to_guid() {
        let mut server = ServerDescriptor::new(
            ServerId(1),
            "abcd-1234",
            RestartTarget::ServiceId(42),
        );
        server.update_display_name("My Game Server");
        assert_eq!(server.display_name, "My Game Server");

        // A later response echoing the guid must not clobber the real name.
        server.update_display_name("abcd-1234");
        assert_eq!(server.display_name, "My Game Server");

        // A genuinely new name is still accepted.
        server.update_display_name("My Renamed Server");
        assert_eq!(server.display_name, "My Renamed Server");
    }
}

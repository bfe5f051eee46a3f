use crate::config::{Config, ServerEntry};
use crate::error::{Error, Result};

/// Validates a single server entry.
///
/// Exactly one of `restartUrl`/`serviceId` must be present, and a restart
/// URL must actually point at a restart endpoint — a mistyped URL would
/// otherwise only surface minutes into an outage, when the restart fires.
pub fn validate_server_entry(index: usize, entry: &ServerEntry) -> Result<()> {
    let position = index + 1;

    if entry.guid.is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Server {} has an empty guid",
            position
        )));
    }

    match (&entry.restart_url, entry.service_id) {
        (Some(_), Some(_)) => Err(Error::ConfigInvalid(format!(
            "Server {} specifies both restartUrl and serviceId",
            position
        ))),
        (None, None) => Err(Error::ConfigInvalid(format!(
            "Server {} specifies neither restartUrl nor serviceId",
            position
        ))),
        (Some(url), None) if !url.contains("restart") => Err(Error::ConfigInvalid(format!(
            "Server {} restartUrl does not look like a restart endpoint: {}",
            position, url
        ))),
        _ => Ok(()),
    }
}

/// Full configuration validation.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.panel.user.is_empty() || config.panel.password.is_empty() {
        return Err(Error::ConfigInvalid(
            "Panel credentials must not be empty".to_string(),
        ));
    }

    if config.panel.webdriver.is_empty() {
        return Err(Error::ConfigInvalid(
            "WebDriver endpoint must not be empty".to_string(),
        ));
    }

    if config.servers.is_empty() {
        return Err(Error::ConfigInvalid("No servers configured".to_string()));
    }

    for (index, entry) in config.servers.iter().enumerate() {
        validate_server_entry(index, entry)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config_with_server(server_json: &str) -> Config {
        let config_str = format!(
            r#"{{
                "panel": {{ "user": "u", "password": "p" }},
                "servers": [ {} ]
            }}"#,
            server_json
        );
        Config::parse_from_str(&config_str).unwrap()
    }

    #[test]
    fn test_valid_entries_pass() {
        let config = config_with_server(
            r#"{ "guid": "g1", "restartUrl": "https://panel.example/1/restartService" }"#,
        );
        assert!(validate_config(&config).is_ok());

        let config = config_with_server(r#"{ "guid": "g1", "serviceId": 7 }"#);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_both_targets_rejected() {
        let config = config_with_server(
            r#"{ "guid": "g1", "restartUrl": "https://panel.example/restartService", "serviceId": 7 }"#,
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_target_rejected() {
        let config = config_with_server(r#"{ "guid": "g1" }"#);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_suspicious_restart_url_rejected() {
        let config = config_with_server(
            r#"{ "guid": "g1", "restartUrl": "https://panel.example/stopService" }"#,
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let config_str = r#"{
            "panel": { "user": "", "password": "p" },
            "servers": [ { "guid": "g1", "serviceId": 1 } ]
        }"#;
        let config = Config::parse_from_str(config_str).unwrap();
        assert!(validate_config(&config).is_err());
    }
}

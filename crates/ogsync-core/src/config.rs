//! Configuration types for ogsync
//!
//! Naming tables and fixed network constants are plain data handed to the
//! components that need them, so tests and deployments can substitute their
//! own.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Number of commands per pushed batch (ACL-style devices)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Timeout for establishing a session (in seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout for reads and command pushes (in seconds)
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Timeout for the persistence step (in seconds)
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Capacity of the reconcile event channel
    ///
    /// When full, events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// ACL-style vendor settings
    #[serde(default)]
    pub acl: AclConfig,

    /// Route-group-style vendor settings
    #[serde(default)]
    pub route_group: RouteGroupConfig,
}

impl ReconcileConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            acl: AclConfig::default(),
            route_group: RouteGroupConfig::default(),
        }
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.chunk_size == 0 {
            return Err(crate::Error::config("chunk_size must be > 0"));
        }
        if self.connect_timeout_secs == 0
            || self.read_timeout_secs == 0
            || self.write_timeout_secs == 0
        {
            return Err(crate::Error::config("timeouts must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        self.acl.validate()?;
        self.route_group.validate()?;

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// ACL-style (permit/deny list) vendor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclConfig {
    /// Historically used outbound list names, oldest first.
    ///
    /// When several are present on a device the last one in this table wins.
    #[serde(default = "default_outbound_names")]
    pub outbound_names: Vec<String>,

    /// Historically used inbound list names, oldest first
    #[serde(default = "default_inbound_names")]
    pub inbound_names: Vec<String>,

    /// Outbound list name for generation when none was discovered
    #[serde(default = "default_outbound_default")]
    pub default_outbound: String,

    /// Inbound list name for generation when none was discovered
    #[serde(default = "default_inbound_default")]
    pub default_inbound: String,

    /// Command listing the configured access lists
    #[serde(default = "default_list_command")]
    pub list_command: String,

    /// Command prefix showing one access list (the name is appended)
    #[serde(default = "default_show_command")]
    pub show_command: String,

    /// Command saving the running configuration
    #[serde(default = "default_persist_command")]
    pub persist_command: String,
}

impl AclConfig {
    fn validate(&self) -> Result<(), crate::Error> {
        if self.default_outbound.is_empty() || self.default_inbound.is_empty() {
            return Err(crate::Error::config("default ACL names cannot be empty"));
        }
        if self
            .outbound_names
            .iter()
            .chain(&self.inbound_names)
            .any(String::is_empty)
        {
            return Err(crate::Error::config("ACL naming tables cannot contain empty names"));
        }
        if self.list_command.is_empty() || self.show_command.is_empty() {
            return Err(crate::Error::config("ACL read commands cannot be empty"));
        }
        Ok(())
    }
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            outbound_names: default_outbound_names(),
            inbound_names: default_inbound_names(),
            default_outbound: default_outbound_default(),
            default_inbound: default_inbound_default(),
            list_command: default_list_command(),
            show_command: default_show_command(),
            persist_command: default_persist_command(),
        }
    }
}

/// Route-group-style (static route group) vendor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGroupConfig {
    /// Configuration group holding the static routes
    #[serde(default = "default_group")]
    pub group: String,

    /// Routing table the routes point at
    #[serde(default = "default_next_table")]
    pub next_table: String,
}

impl RouteGroupConfig {
    fn validate(&self) -> Result<(), crate::Error> {
        if self.group.is_empty() {
            return Err(crate::Error::config("route group name cannot be empty"));
        }
        if self.next_table.is_empty() {
            return Err(crate::Error::config("route group next table cannot be empty"));
        }
        Ok(())
    }
}

impl Default for RouteGroupConfig {
    fn default() -> Self {
        Self {
            group: default_group(),
            next_table: default_next_table(),
        }
    }
}

fn default_chunk_size() -> usize {
    25
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    60
}

fn default_write_timeout_secs() -> u64 {
    120
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_outbound_names() -> Vec<String> {
    ["FROM-OG", "OG-OUT", "FROM-OPEN-GARDEN"]
        .map(String::from)
        .to_vec()
}

fn default_inbound_names() -> Vec<String> {
    ["TO-OG", "OG-IN", "TO-OPEN-GARDEN"].map(String::from).to_vec()
}

fn default_outbound_default() -> String {
    "FROM-OPEN-GARDEN".to_string()
}

fn default_inbound_default() -> String {
    "TO-OPEN-GARDEN".to_string()
}

fn default_list_command() -> String {
    "show ip access-lists | include access list".to_string()
}

fn default_show_command() -> String {
    "show ip access-lists".to_string()
}

fn default_persist_command() -> String {
    "write".to_string()
}

fn default_group() -> String {
    "rdr-nomoney-routes".to_string()
}

fn default_next_table() -> String {
    "inet.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReconcileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.route_group.next_table, "inet.0");
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = ReconcileConfig {
            chunk_size: 0,
            ..ReconcileConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"chunk_size": 10, "route_group": {"group": "og-routes"}}"#)
                .unwrap();

        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.route_group.group, "og-routes");
        assert_eq!(config.route_group.next_table, "inet.0");
        assert_eq!(config.acl.default_outbound, "FROM-OPEN-GARDEN");
    }

    #[test]
    fn from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ogsync.json");
        std::fs::write(&path, r#"{"acl": {"default_inbound": ""}}"#).unwrap();

        let err = ReconcileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}

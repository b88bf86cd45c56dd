// # ACL Name Discovery
//
// Finds the managed inbound/outbound access lists on an ACL-style device.
//
// Devices in the field carry lists under several historical names. The
// naming tables are ordered oldest first and the **last** table entry found in
// the device's list dump wins, so a device that still has an old list next to
// the current one is reconciled against the current one.

use serde::{Deserialize, Serialize};

use crate::config::AclConfig;

/// Ordered tables of historically used ACL names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclNameTables {
    outbound: Vec<String>,
    inbound: Vec<String>,
}

/// Names discovered on one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclNames {
    pub outbound: Option<String>,
    pub inbound: Option<String>,
}

impl AclNames {
    /// Discovered names in read order (outbound first)
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.outbound.iter().chain(&self.inbound).map(String::as_str)
    }
}

impl AclNameTables {
    pub fn new(outbound: Vec<String>, inbound: Vec<String>) -> Self {
        Self { outbound, inbound }
    }

    pub fn from_config(config: &AclConfig) -> Self {
        Self::new(config.outbound_names.clone(), config.inbound_names.clone())
    }

    /// Scan a list dump for known names.
    ///
    /// Returns `None` when neither direction matched; the device then has no
    /// managed policy.
    pub fn discover(&self, dump: &str) -> Option<AclNames> {
        let names = AclNames {
            outbound: last_match(&self.outbound, dump),
            inbound: last_match(&self.inbound, dump),
        };

        if names.outbound.is_none() && names.inbound.is_none() {
            None
        } else {
            Some(names)
        }
    }
}

fn last_match(table: &[String], dump: &str) -> Option<String> {
    table
        .iter()
        .rfind(|name| dump.contains(name.as_str()))
        .cloned()
}

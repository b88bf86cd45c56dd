//! Device descriptors

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vendor::Vendor;

/// A device to reconcile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Inventory hostname
    pub hostname: String,
    /// Device family
    pub vendor: Vendor,
    /// Management address (no prefix)
    pub address: String,
}

impl DeviceDescriptor {
    pub fn new(hostname: impl Into<String>, vendor: Vendor, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            vendor,
            address: address.into(),
        }
    }

    /// Build a descriptor from an inventory primary address such as
    /// `10.1.1.1/24`; the interface prefix is dropped.
    pub fn from_primary_ip(
        hostname: impl Into<String>,
        vendor: Vendor,
        primary_ip: &str,
    ) -> Result<Self> {
        let address = primary_ip
            .split('/')
            .next()
            .map(str::trim)
            .filter(|addr| addr.parse::<std::net::Ipv4Addr>().is_ok())
            .ok_or_else(|| Error::malformed(primary_ip))?;

        Ok(Self::new(hostname, vendor, address))
    }
}

// # Directory Trait
//
// Device inventory lookup. An absent device is `Ok(None)`; failing to reach
// the inventory is an error. The two must never be conflated: the first is a
// configuration problem, the second is retryable.

use async_trait::async_trait;

use crate::device::DeviceDescriptor;
use crate::vendor::Vendor;

/// Selection criteria for [`Directory::list_devices`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Device role (e.g. the broadband gateway role)
    pub role: Option<String>,
    /// Device family
    pub vendor: Option<Vendor>,
    /// Only devices marked active
    pub active_only: bool,
}

impl DeviceFilter {
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            vendor: None,
            active_only: true,
        }
    }

    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }
}

/// Device inventory
///
/// # Errors
///
/// Connectivity problems must surface as
/// [`Error::DirectoryUnavailable`](crate::Error::DirectoryUnavailable).
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up one device by hostname
    async fn get_device(&self, hostname: &str) -> Result<Option<DeviceDescriptor>, crate::Error>;

    /// List devices matching a filter
    async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<DeviceDescriptor>, crate::Error>;
}

/// Look up a device, turning absence into
/// [`Error::DirectoryDeviceNotFound`](crate::Error::DirectoryDeviceNotFound)
pub async fn lookup_device(
    directory: &dyn Directory,
    hostname: &str,
) -> Result<DeviceDescriptor, crate::Error> {
    directory
        .get_device(hostname)
        .await?
        .ok_or_else(|| crate::Error::device_not_found(hostname))
}

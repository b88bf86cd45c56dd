//! Confirmation gate between a divergent diff and a push

use crate::device::DeviceDescriptor;
use crate::ip::IpSet;

/// Decides whether a computed change may be applied.
///
/// Called synchronously with the sorted add/delete sets while the session
/// stays open. Returning `false` leaves the device untouched.
pub trait Approver: Send + Sync {
    fn approve(&self, device: &DeviceDescriptor, to_add: &IpSet, to_delete: &IpSet) -> bool;
}

impl<F> Approver for F
where
    F: Fn(&DeviceDescriptor, &IpSet, &IpSet) -> bool + Send + Sync,
{
    fn approve(&self, device: &DeviceDescriptor, to_add: &IpSet, to_delete: &IpSet) -> bool {
        self(device, to_add, to_delete)
    }
}

/// Approves everything; for callers that confirmed up front
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&self, _device: &DeviceDescriptor, _to_add: &IpSet, _to_delete: &IpSet) -> bool {
        true
    }
}

/// Declines everything; turns a reconcile into a dry run
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl Approver for DeclineAll {
    fn approve(&self, _device: &DeviceDescriptor, _to_add: &IpSet, _to_delete: &IpSet) -> bool {
        false
    }
}

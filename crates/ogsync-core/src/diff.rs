//! Diff engine
//!
//! Compares the live allow-list of a device with the desired one. Pure: no
//! I/O, safe to call any number of times.

use serde::{Deserialize, Serialize};

use crate::ip::IpSet;

/// Outcome of comparing live and desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffResult {
    /// Live state already matches
    UpToDate,

    /// The device carries no recognizable managed ACL (ACL-style only)
    #[serde(rename = "NO_ACL")]
    NoManagedPolicy,

    /// Live and desired differ
    Divergent {
        /// Entries to add, sorted
        to_add: IpSet,
        /// Entries to delete, sorted
        to_delete: IpSet,
    },
}

impl DiffResult {
    /// Short status code for reports
    pub fn status(&self) -> &'static str {
        match self {
            DiffResult::UpToDate => "UP_TO_DATE",
            DiffResult::NoManagedPolicy => "NO_ACL",
            DiffResult::Divergent { .. } => "DIVERGENT",
        }
    }

    pub fn is_divergent(&self) -> bool {
        matches!(self, DiffResult::Divergent { .. })
    }
}

/// Compare live and desired state.
///
/// `policy_present` is false only when an ACL-style device has none of the
/// known lists; that short-circuits to [`DiffResult::NoManagedPolicy`].
pub fn diff(live: &IpSet, desired: &IpSet, policy_present: bool) -> DiffResult {
    if !policy_present {
        return DiffResult::NoManagedPolicy;
    }

    if live == desired {
        return DiffResult::UpToDate;
    }

    DiffResult::Divergent {
        to_add: desired.difference(live),
        to_delete: live.difference(desired),
    }
}

// # ogsync-core
//
// Core library for keeping router open-garden allow-lists in sync with a
// desired set of addresses and networks.
//
// ## Architecture Overview
//
// - **IpSet**: Canonical, ordered set of hosts and networks
// - **Discovery**: Finds the managed access-list names in a device listing
// - **VendorAdapter**: Reads live state and renders the full-replace
//   command sequence for one device family (ACL-style or route-group-style)
// - **diff**: Pure comparison of live and desired sets
// - **Reconciler**: Drives connect → read → diff → approve → push → commit →
//   disconnect, with typed failures and a guaranteed disconnect
// - **Transport / Resolver / Directory**: Collaborator traits; concrete SSH,
//   DNS and inventory clients live outside this crate
//
// ## Design Principles
//
// 1. **Full replace**: Every change rewrites the whole managed policy
// 2. **Pure core**: Parsing, diffing and generation never touch a device
// 3. **No silent retries**: Failures surface once, classified
// 4. **Library-First**: The binary is a thin wrapper over this crate

pub mod traits;
pub mod engine;
pub mod vendor;
pub mod config;
pub mod error;
pub mod ip;
pub mod device;
pub mod discovery;
pub mod diff;
pub mod commands;
pub mod resolve;

// Re-export core types for convenience
pub use traits::{Transport, Session, Credentials, Resolver, Directory, DeviceFilter};
pub use traits::directory::lookup_device;
pub use engine::{Reconciler, ReconcileEvent, ApplyOutcome, FleetResult, Approver, AutoApprove, DeclineAll};
pub use vendor::{Vendor, VendorAdapter, LiveState, generate_config};
pub use config::{ReconcileConfig, AclConfig, RouteGroupConfig};
pub use error::{Error, Result};
pub use ip::{IpEntry, IpSet};
pub use device::DeviceDescriptor;
pub use discovery::{AclNameTables, AclNames};
pub use diff::{DiffResult, diff};
pub use commands::CommandSequence;
pub use resolve::{
    Resolution, Resource, ResourceCategory, normalize_resource, parse_resource_file,
    resolve_resources, split_resources,
};

//! Collaborator interfaces
//!
//! The reconciliation engine talks to the outside world only through these
//! traits.
//!
//! - [`Transport`] / [`Session`]: CLI sessions to network devices
//! - [`Resolver`]: name → address resolution
//! - [`Directory`]: device inventory lookup

pub mod transport;
pub mod resolver;
pub mod directory;

pub use transport::{Transport, Session, Credentials, BatchOptions, ConfigMode};
pub use resolver::Resolver;
pub use directory::{Directory, DeviceFilter};

// # Resolver Trait
//
// Turns a human-entered resource name into IPv4 addresses. DNS handling
// itself belongs to implementations; [`crate::resolve`] drives a resolver
// over a list of resources.

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Name → address resolution
///
/// # Errors
///
/// - [`Error::NameNotFound`](crate::Error::NameNotFound): the name does not
///   exist or has no address records. The caller records it as unresolved.
/// - [`Error::ResolverUnreachable`](crate::Error::ResolverUnreachable): no
///   resolver answered. The caller stops.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a name to its IPv4 addresses
    async fn resolve(&self, name: &str) -> Result<Vec<Ipv4Addr>, crate::Error>;
}

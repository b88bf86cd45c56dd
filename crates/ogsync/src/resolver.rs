//! System resolver backed by the platform's getaddrinfo

use async_trait::async_trait;
use ogsync_core::{Error, Resolver};
use std::collections::BTreeSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// Resolves names through `tokio::net::lookup_host`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> Result<Vec<Ipv4Addr>, Error> {
        let addrs = tokio::net::lookup_host((name, 0))
            .await
            .map_err(|e| classify_lookup_error(name, &e))?;

        let v4: BTreeSet<Ipv4Addr> = addrs
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .collect();
        debug!("{} -> {:?}", name, v4);

        if v4.is_empty() {
            return Err(Error::NameNotFound(name.to_string()));
        }
        Ok(v4.into_iter().collect())
    }
}

/// getaddrinfo reports EAI_AGAIN when no nameserver answered; anything else
/// means the name itself is unknown.
///
/// std only surfaces the `gai_strerror` text, not the code, so EAI_AGAIN is
/// recognised by its message: "Temporary failure in name resolution" on
/// glibc, "temporary failure in name resolution" on macOS and "Try again" on
/// musl. A libc with other wording falls through to `NameNotFound`.
fn classify_lookup_error(name: &str, err: &io::Error) -> Error {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if err.kind() == io::ErrorKind::TimedOut
        || lowered.contains("temporary failure")
        || lowered.ends_with("try again")
    {
        Error::ResolverUnreachable(format!("{name}: {message}"))
    } else {
        Error::NameNotFound(name.to_string())
    }
}

// # Canonical IP Set
//
// Normalized IPv4 host/network entries and the set type the diff engine
// compares.
//
// An entry is an `Ipv4Network` whose address has no bits set beyond the
// prefix. A `/32` entry is a host and renders without the suffix, so
// `10.0.0.1` and `10.0.0.1/32` are the same entry. Ordering is by the
// canonical string, which is the order every rendered listing and generated
// command sequence uses.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prefix length of a single host
pub const HOST_PREFIX: u8 = 32;

/// A host address or CIDR network in canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpEntry {
    network: Ipv4Network,
}

impl IpEntry {
    /// Build an entry from a network address and prefix length.
    ///
    /// Fails if the prefix is longer than 32 or the address has bits set
    /// beyond the prefix.
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self> {
        let network = Ipv4Network::new(network, prefix)
            .map_err(|_| Error::malformed(format!("{network}/{prefix}")))?;
        Self::canonical(network)
    }

    fn canonical(network: Ipv4Network) -> Result<Self> {
        if network.network() != network.ip() {
            return Err(Error::malformed(network.to_string()));
        }
        Ok(Self { network })
    }

    /// A single host entry
    pub fn host(addr: Ipv4Addr) -> Self {
        Self {
            network: Ipv4Network::from(addr),
        }
    }

    /// Parse `a.b.c.d` or `a.b.c.d/n`.
    ///
    /// The prefix must be plain decimal digits without a sign or a leading
    /// zero; dotted netmask suffixes are not accepted.
    pub fn parse(literal: &str) -> Result<Self> {
        let trimmed = literal.trim();
        if let Some((_, prefix)) = trimmed.split_once('/')
            && !is_plain_prefix(prefix)
        {
            return Err(Error::malformed(literal));
        }

        let network = trimmed
            .parse::<Ipv4Network>()
            .map_err(|_| Error::malformed(literal))?;
        Self::canonical(network).map_err(|_| Error::malformed(literal))
    }

    /// Build an entry from an ACL `<address> <wildcard>` pair.
    ///
    /// The wildcard is the bitwise inverse of a netmask and must be
    /// contiguous (`0.0.0.255` is fine, `0.255.0.255` is not).
    pub fn from_wildcard(network: Ipv4Addr, wildcard: Ipv4Addr) -> Result<Self> {
        let prefix = ipnetwork::ipv4_mask_to_prefix(!wildcard)
            .map_err(|_| Error::malformed(format!("{network} {wildcard}")))?;
        Self::new(network, prefix)
    }

    /// Network (or host) address
    pub fn network(&self) -> Ipv4Addr {
        self.network.network()
    }

    /// Prefix length
    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Whether this entry is a single host
    pub fn is_host(&self) -> bool {
        self.prefix() == HOST_PREFIX
    }

    /// Standard netmask, e.g. `255.255.255.0` for a /24
    pub fn netmask(&self) -> Ipv4Addr {
        self.network.mask()
    }

    /// Inverted netmask as used by ACL wildcards, e.g. `0.0.0.255` for a /24
    pub fn hostmask(&self) -> Ipv4Addr {
        !self.network.mask()
    }

    /// Always-suffixed CIDR form (`10.0.0.1/32` for hosts)
    pub fn to_cidr(&self) -> String {
        self.network.to_string()
    }
}

fn is_plain_prefix(prefix: &str) -> bool {
    match prefix.as_bytes() {
        [digit] => digit.is_ascii_digit(),
        [b'1'..=b'9', digit] => digit.is_ascii_digit(),
        _ => false,
    }
}

impl fmt::Display for IpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.network.ip())
        } else {
            write!(f, "{}", self.network)
        }
    }
}

impl FromStr for IpEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for IpEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for IpEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for IpEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IpEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        Self::parse(&literal).map_err(serde::de::Error::custom)
    }
}

/// An unordered set of canonical entries.
///
/// Iteration and rendering are sorted by canonical string. Set operations
/// return new sets; an existing set is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpSet {
    entries: BTreeSet<IpEntry>,
}

impl IpSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from free-form literals, failing on the first malformed one
    pub fn from_literals<I, S>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        literals
            .into_iter()
            .map(|literal| IpEntry::parse(literal.as_ref()))
            .collect()
    }

    /// Parse a networks listing: one literal per line, blank lines and
    /// `#` comments ignored
    pub fn parse_lines(text: &str) -> Result<Self> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(IpEntry::parse)
            .collect()
    }

    /// Load a networks file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_lines(&text)
    }

    /// Render one entry per line, sorted, with a trailing newline
    pub fn to_lines(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{entry}\n"))
            .collect()
    }

    /// Entries in `self` that are not in `other`
    pub fn difference(&self, other: &IpSet) -> IpSet {
        self.entries.difference(&other.entries).copied().collect()
    }

    /// Entries in either set
    pub fn union(&self, other: &IpSet) -> IpSet {
        self.entries.union(&other.entries).copied().collect()
    }

    /// Entries in both sets
    pub fn intersection(&self, other: &IpSet) -> IpSet {
        self.entries.intersection(&other.entries).copied().collect()
    }

    /// Whether the sets share no entry
    pub fn is_disjoint(&self, other: &IpSet) -> bool {
        self.entries.is_disjoint(&other.entries)
    }

    pub fn contains(&self, entry: &IpEntry) -> bool {
        self.entries.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted iteration
    pub fn iter(&self) -> impl Iterator<Item = &IpEntry> {
        self.entries.iter()
    }

    /// Sorted canonical strings
    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<IpEntry> for IpSet {
    fn from_iter<T: IntoIterator<Item = IpEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a IpSet {
    type Item = &'a IpEntry;
    type IntoIter = std::collections::btree_set::Iter<'a, IpEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// # Resource resolution
//
// Turns human-entered resources (URLs, host names, addresses, networks) into
// the desired Canonical IP Set.
//
// Address literals go straight into the set. Names go to a [`Resolver`]; a
// name the resolver does not know is reported back as unresolved, while an
// unreachable resolver stops the whole run, since a partial allow-list would
// silently drop entries from every device.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ip::{IpEntry, IpSet};
use crate::traits::Resolver;

static ADDRESS_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}(/\d{1,2})?$")
        .expect("ADDRESS_LITERAL is a valid regex pattern")
});

/// Business category of a resource; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceCategory {
    Tech,
    Info,
    Pay,
    Fmc,
}

impl ResourceCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceCategory::Tech => "TECH",
            ResourceCategory::Info => "INFO",
            ResourceCategory::Pay => "PAY",
            ResourceCategory::Fmc => "FMC",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "TECH" => Ok(ResourceCategory::Tech),
            "INFO" => Ok(ResourceCategory::Info),
            "PAY" => Ok(ResourceCategory::Pay),
            "FMC" => Ok(ResourceCategory::Fmc),
            other => Err(Error::config(format!("unknown resource category {other:?}"))),
        }
    }
}

/// A normalized resource entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub category: Option<ResourceCategory>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: ResourceCategory) -> Self {
        self.category = Some(category);
        self
    }
}

impl From<&str> for Resource {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Resource {
    fn from(name: &String) -> Self {
        Self::new(name.as_str())
    }
}

impl From<String> for Resource {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&Resource> for Resource {
    fn from(resource: &Resource) -> Self {
        resource.clone()
    }
}

/// What a resource string denotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A host address or network, usable as-is
    Address(IpEntry),
    /// A name that needs resolving
    Name(String),
}

/// Clean up one human-entered resource.
///
/// Drops a URL scheme, surrounding whitespace and stray `,`/`/`, and any
/// path after a host name. Address literals keep their prefix.
pub fn normalize_resource(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '/');
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);

    let normalized = if ADDRESS_LITERAL.is_match(without_scheme) {
        without_scheme.to_string()
    } else {
        without_scheme
            .split('/')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    };

    (!normalized.is_empty()).then_some(normalized)
}

/// Split a multi-line cell into normalized resources
pub fn split_resources(cell: &str) -> Vec<String> {
    cell.lines().filter_map(normalize_resource).collect()
}

/// Parse a resources file.
///
/// One resource per line; blank lines and `#` comments are ignored. A
/// `[PAY]`-style header assigns its category to the lines that follow it,
/// lines before the first header have none.
///
/// ```text
/// https://status.example.net/
/// [PAY]
/// pay.example.com
/// 198.51.100.0/24
/// ```
pub fn parse_resource_file(text: &str) -> Result<Vec<Resource>> {
    let mut category = None;
    let mut resources = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            category = Some(header.parse::<ResourceCategory>()?);
            continue;
        }
        if let Some(name) = normalize_resource(line) {
            resources.push(Resource { name, category });
        }
    }

    Ok(resources)
}

/// Decide whether a normalized resource is an address or a name
pub fn classify(resource: &str) -> Result<ResourceKind> {
    if ADDRESS_LITERAL.is_match(resource) {
        IpEntry::parse(resource).map(ResourceKind::Address)
    } else {
        Ok(ResourceKind::Name(resource.to_string()))
    }
}

/// Outcome of resolving a resource list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Every address obtained
    pub ips: IpSet,
    /// Names the resolver does not know, sorted
    pub unresolved: BTreeSet<String>,
    /// Addresses obtained from categorized resources
    pub by_category: BTreeMap<ResourceCategory, IpSet>,
}

impl Resolution {
    /// Render one `# CATEGORY` section per category, entries sorted.
    ///
    /// The result still reads as a networks listing, headers being comments.
    pub fn category_listing(&self) -> String {
        self.by_category
            .iter()
            .map(|(category, ips)| format!("# {category}\n{}", ips.to_lines()))
            .collect()
    }
}

/// Resolve resources into a desired set.
///
/// # Errors
///
/// - `MalformedAddress` for an address-shaped resource that is not valid
/// - `ResolverUnreachable` (or any other resolver failure) aborts the run
pub async fn resolve_resources<I, R>(resolver: &dyn Resolver, resources: I) -> Result<Resolution>
where
    I: IntoIterator<Item = R>,
    R: Into<Resource>,
{
    let mut entries = Vec::new();
    let mut unresolved = BTreeSet::new();
    let mut by_category: BTreeMap<ResourceCategory, Vec<IpEntry>> = BTreeMap::new();

    for resource in resources {
        let resource: Resource = resource.into();
        let Some(name) = normalize_resource(&resource.name) else {
            continue;
        };

        let resolved = match classify(&name)? {
            ResourceKind::Address(entry) => vec![entry],
            ResourceKind::Name(name) => match resolver.resolve(&name).await {
                Ok(addrs) if addrs.is_empty() => {
                    debug!("{} resolved to no addresses", name);
                    unresolved.insert(name);
                    continue;
                }
                Ok(addrs) => addrs.into_iter().map(IpEntry::host).collect(),
                Err(Error::NameNotFound(_)) => {
                    debug!("{} does not resolve", name);
                    unresolved.insert(name);
                    continue;
                }
                Err(e) => return Err(e),
            },
        };

        if let Some(category) = resource.category {
            by_category
                .entry(category)
                .or_default()
                .extend(resolved.iter().copied());
        }
        entries.extend(resolved);
    }

    let resolution = Resolution {
        ips: entries.into_iter().collect(),
        unresolved,
        by_category: by_category
            .into_iter()
            .map(|(category, entries)| (category, entries.into_iter().collect()))
            .collect(),
    };
    info!(
        "Resolved {} networks, {} unresolved names",
        resolution.ips.len(),
        resolution.unresolved.len()
    );
    Ok(resolution)
}

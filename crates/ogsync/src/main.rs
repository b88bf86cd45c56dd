// # ogsync - open-garden allow-list tool
//
// Thin front end over ogsync-core. No reconciliation logic lives here: the
// binary reads its configuration from the environment, loads the desired
// networks and calls the library.
//
// ## Actions
//
// - `ogsync generate <cisco|juniper>`: print the full-replace command
//   sequence for the networks file, without contacting any device
// - `ogsync normalize`: print the networks file sorted and deduplicated
// - `ogsync resolve`: resolve a resources file (URLs, names, addresses) with
//   the system resolver and print the resulting networks
// - `ogsync categories`: resolve the same file and print one `# CATEGORY`
//   section per `[CATEGORY]` header it contains
//
// ## Configuration
//
// - `OGSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `OGSYNC_NETWORKS_FILE`: desired networks, one per line (default networks.txt)
// - `OGSYNC_RESOURCES_FILE`: resources for `resolve` (default resources.txt)
// - `OGSYNC_CONFIG`: optional JSON file holding a `ReconcileConfig`
// - `OGSYNC_FAILED_FILE`: optional file receiving the names that did not
//   resolve, one per line
//
// ## Example
//
// ```bash
// export OGSYNC_NETWORKS_FILE=/etc/ogsync/networks.txt
// ogsync generate cisco > push.txt
// ```

mod resolver;

use anyhow::{Context, Result};
use ogsync_core::{
    IpSet, ReconcileConfig, Resolution, Resolver, Vendor, generate_config, parse_resource_file,
    resolve_resources,
};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::resolver::SystemResolver;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or usage error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OgsyncExitCode {
    /// Action completed
    Success = 0,
    /// Configuration error or bad invocation
    ConfigError = 1,
    /// Runtime error (unreadable input, resolver down)
    RuntimeError = 2,
}

impl From<OgsyncExitCode> for ExitCode {
    fn from(code: OgsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to do, from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Generate(Vendor),
    Normalize,
    Resolve,
    Categories,
}

impl Action {
    fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [action, vendor] if action == "generate" => Ok(Action::Generate(
                vendor.parse().context("generate needs cisco or juniper")?,
            )),
            [action] if action == "generate" => {
                anyhow::bail!("generate needs a vendor: ogsync generate <cisco|juniper>")
            }
            [action] if action == "normalize" => Ok(Action::Normalize),
            [action] if action == "resolve" => Ok(Action::Resolve),
            [action] if action == "categories" => Ok(Action::Categories),
            _ => anyhow::bail!(
                "usage: ogsync <generate <cisco|juniper>|normalize|resolve|categories>"
            ),
        }
    }
}

/// Application configuration
struct Config {
    networks_file: PathBuf,
    resources_file: PathBuf,
    config_file: Option<PathBuf>,
    failed_file: Option<PathBuf>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            networks_file: lookup("OGSYNC_NETWORKS_FILE")
                .unwrap_or_else(|| "networks.txt".to_string())
                .into(),
            resources_file: lookup("OGSYNC_RESOURCES_FILE")
                .unwrap_or_else(|| "resources.txt".to_string())
                .into(),
            config_file: lookup("OGSYNC_CONFIG")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            failed_file: lookup("OGSYNC_FAILED_FILE")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            log_level: lookup("OGSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.networks_file.as_os_str().is_empty() {
            anyhow::bail!("OGSYNC_NETWORKS_FILE cannot be empty");
        }

        if let Some(path) = &self.config_file
            && !path.is_file()
        {
            anyhow::bail!("OGSYNC_CONFIG points to a missing file: {}", path.display());
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "OGSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Engine configuration: the JSON file if given, defaults otherwise
    fn reconcile_config(&self) -> Result<ReconcileConfig> {
        match &self.config_file {
            Some(path) => ReconcileConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(ReconcileConfig::default()),
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let action = match Action::from_args(&args) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{:#}", e);
            return OgsyncExitCode::ConfigError.into();
        }
    };

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return OgsyncExitCode::ConfigError.into();
    }

    // Logs go to stderr; stdout carries the result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return OgsyncExitCode::ConfigError.into();
    }

    let result = match action {
        Action::Generate(vendor) => config
            .reconcile_config()
            .and_then(|reconcile| generate(&config, vendor, &reconcile)),
        Action::Normalize => normalize(&config),
        Action::Resolve => resolve_file(&config, &SystemResolver).map(|r| r.ips.to_lines()),
        Action::Categories => {
            resolve_file(&config, &SystemResolver).map(|r| r.category_listing())
        }
    };

    match result {
        Ok(output) => {
            print!("{output}");
            OgsyncExitCode::Success.into()
        }
        Err(e) => {
            error!("{:#}", e);
            OgsyncExitCode::RuntimeError.into()
        }
    }
}

fn load_networks(config: &Config) -> Result<IpSet> {
    let networks = IpSet::load(&config.networks_file)
        .with_context(|| format!("reading {}", config.networks_file.display()))?;
    info!(
        "Loaded {} networks from {}",
        networks.len(),
        config.networks_file.display()
    );
    Ok(networks)
}

/// Render the full-replace sequence for a vendor
fn generate(config: &Config, vendor: Vendor, reconcile: &ReconcileConfig) -> Result<String> {
    let networks = load_networks(config)?;
    let commands = generate_config(vendor, &networks, reconcile);
    info!("Generated {} {} commands", commands.len(), vendor);
    Ok(commands.to_string())
}

fn normalize(config: &Config) -> Result<String> {
    Ok(load_networks(config)?.to_lines())
}

/// Resolve the resources file, recording unresolved names if asked to
fn resolve_file(config: &Config, resolver: &dyn Resolver) -> Result<Resolution> {
    let text = std::fs::read_to_string(&config.resources_file)
        .with_context(|| format!("reading {}", config.resources_file.display()))?;
    let resources = parse_resource_file(&text)
        .with_context(|| format!("parsing {}", config.resources_file.display()))?;
    info!("Resolving {} resources", resources.len());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    let resolution = runtime.block_on(resolve_resources(resolver, &resources))?;

    for name in &resolution.unresolved {
        warn!("Unresolved: {}", name);
    }
    if let Some(path) = &config.failed_file {
        write_unresolved(path, &resolution.unresolved)?;
        info!(
            "{} unresolved names saved to {}",
            resolution.unresolved.len(),
            path.display()
        );
    }
    Ok(resolution)
}

fn write_unresolved(path: &Path, names: &BTreeSet<String>) -> Result<()> {
    let contents: String = names.iter().map(|name| format!("{name}\n")).collect();
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

//! Test doubles and common utilities for contract tests
//!
//! [`ScriptedTransport`] plays a device: read commands get canned output,
//! batches and single commands are recorded in order, and faults can be
//! injected at any step. Every double shares its call log through an `Arc`,
//! so a test keeps a [`CallLog`] handle after handing the transport to the
//! engine.

#![allow(dead_code)]

use ogsync_core::error::{Error, Result};
use ogsync_core::traits::{BatchOptions, Credentials, Session, Transport};
use ogsync_core::{DeviceDescriptor, IpSet, ReconcileConfig, ReconcileEvent, Vendor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const ACL_LIST_COMMAND: &str = "show ip access-lists | include access list";
pub const ROUTE_GROUP_SHOW: &str = "show configuration groups rdr-nomoney-routes | display set";

/// One observed transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Send(String),
    Batch {
        commands: Vec<String>,
        options: BatchOptions,
    },
    Disconnect,
}

/// A failure injected into the scripted device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Connect fails with `Authentication`
    RejectCredentials,
    /// Connect never completes
    HangOnConnect,
    /// The transport itself reports a connect timeout
    ReportConnectTimeout,
    /// `send` of this exact command never completes
    HangOnCommand(String),
    /// `send` of this exact command fails with a transport error
    FailCommand(String),
    /// The nth batch (0-based) never completes
    HangOnBatch(usize),
    /// The nth batch fails with a transport error
    FailBatch(usize),
    /// The nth batch fails with a transport-reported read timeout
    ReportTimeoutOnBatch(usize),
    /// Disconnect fails
    FailDisconnect,
}

/// Shared, ordered record of transport calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Connect(_)))
            .count()
    }

    pub fn disconnects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Disconnect))
            .count()
    }

    /// Commands sent one at a time, in order
    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Batches with their options, in order
    pub fn batches(&self) -> Vec<(Vec<String>, BatchOptions)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Batch { commands, options } => Some((commands, options)),
                _ => None,
            })
            .collect()
    }

    /// Every command that went out in a batch, flattened in push order
    pub fn pushed_commands(&self) -> Vec<String> {
        self.batches()
            .into_iter()
            .flat_map(|(commands, _)| commands)
            .collect()
    }

    /// The last call seen
    pub fn last(&self) -> Option<Call> {
        self.calls().last().cloned()
    }
}

/// A transport whose sessions replay canned output
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, String>,
    faults: Vec<Fault>,
    log: CallLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `output`; unknown commands answer empty
    pub fn respond(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses.insert(command.into(), output.into());
        self
    }

    pub fn fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Handle on the call log that outlives the transport
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn has(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn connect(
        &self,
        address: &str,
        _credentials: &Credentials,
        _vendor: Vendor,
    ) -> Result<Box<dyn Session>> {
        self.log.record(Call::Connect(address.to_string()));

        if self.has(&Fault::RejectCredentials) {
            return Err(Error::auth(address));
        }
        if self.has(&Fault::ReportConnectTimeout) {
            return Err(Error::ConnectTimeout {
                host: address.to_string(),
                timeout: Duration::from_secs(1),
            });
        }
        if self.has(&Fault::HangOnConnect) {
            std::future::pending::<()>().await;
        }

        Ok(Box::new(ScriptedSession {
            host: address.to_string(),
            script: self.clone(),
            batch_index: 0,
        }))
    }
}

struct ScriptedSession {
    host: String,
    script: ScriptedTransport,
    batch_index: usize,
}

#[async_trait::async_trait]
impl Session for ScriptedSession {
    async fn send(&mut self, command: &str) -> Result<String> {
        self.script.log.record(Call::Send(command.to_string()));

        if self.script.has(&Fault::HangOnCommand(command.to_string())) {
            std::future::pending::<()>().await;
        }
        if self.script.has(&Fault::FailCommand(command.to_string())) {
            return Err(Error::transport(format!("{command}: session dropped")));
        }

        Ok(self
            .script
            .responses
            .get(command)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_batch(&mut self, commands: &[String], options: &BatchOptions) -> Result<String> {
        let index = self.batch_index;
        self.batch_index += 1;
        self.script.log.record(Call::Batch {
            commands: commands.to_vec(),
            options: options.clone(),
        });

        if self.script.has(&Fault::HangOnBatch(index)) {
            std::future::pending::<()>().await;
        }
        if self.script.has(&Fault::FailBatch(index)) {
            return Err(Error::transport(format!("batch {index}: session dropped")));
        }
        if self.script.has(&Fault::ReportTimeoutOnBatch(index)) {
            return Err(Error::ReadTimeout {
                host: self.host.clone(),
                timeout: options.read_timeout,
            });
        }

        Ok(String::new())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.script.log.record(Call::Disconnect);

        if self.script.has(&Fault::FailDisconnect) {
            return Err(Error::transport("connection reset during logout"));
        }
        Ok(())
    }
}

/// IOS `show ip access-lists <name>` rendering of a set
pub fn ios_listing(name: &str, entries: &[&str], outbound: bool) -> String {
    let mut out = format!("Extended IP access list {name}\n");
    let mut seq = 10;
    for literal in entries {
        let matched = match literal.split_once('/') {
            None => format!("host {literal}"),
            Some((net, prefix)) => {
                let prefix: u32 = prefix.parse().unwrap();
                let wildcard = std::net::Ipv4Addr::from(u32::MAX.checked_shr(prefix).unwrap_or(0));
                format!("{net} {wildcard}")
            }
        };
        let line = if outbound {
            format!("    {seq} permit ip {matched} any (3 matches)\n")
        } else {
            format!("    {seq} permit ip any {matched}\n")
        };
        out.push_str(&line);
        seq += 10;
    }
    out.push_str(&format!("    {seq} deny ip any any (120 matches)\n"));
    out
}

/// An ACL-style device holding `entries` in the default-named lists
pub fn acl_device(entries: &[&str]) -> ScriptedTransport {
    ScriptedTransport::new()
        .respond(
            ACL_LIST_COMMAND,
            "Standard IP access list 10\n\
             Extended IP access list FROM-OPEN-GARDEN\n\
             Extended IP access list TO-OPEN-GARDEN\n",
        )
        .respond(
            "show ip access-lists FROM-OPEN-GARDEN",
            ios_listing("FROM-OPEN-GARDEN", entries, true),
        )
        .respond(
            "show ip access-lists TO-OPEN-GARDEN",
            ios_listing("TO-OPEN-GARDEN", entries, false),
        )
}

/// An ACL-style device with no managed list at all
pub fn acl_device_without_policy() -> ScriptedTransport {
    ScriptedTransport::new().respond(
        ACL_LIST_COMMAND,
        "Standard IP access list 10\nExtended IP access list MGMT\n",
    )
}

/// A route-group-style device holding `entries`
pub fn route_group_device(entries: &[&str]) -> ScriptedTransport {
    let listing: String = entries
        .iter()
        .map(|literal| {
            let cidr = if literal.contains('/') {
                literal.to_string()
            } else {
                format!("{literal}/32")
            };
            format!(
                "set groups rdr-nomoney-routes routing-instances <*> routing-options static route {cidr} next-table inet.0\n"
            )
        })
        .collect();
    ScriptedTransport::new().respond(ROUTE_GROUP_SHOW, listing)
}

pub fn acl_router() -> DeviceDescriptor {
    DeviceDescriptor::new("bras-01", Vendor::Acl, "10.255.0.1")
}

pub fn route_group_router() -> DeviceDescriptor {
    DeviceDescriptor::new("mx-01", Vendor::RouteGroup, "10.255.0.2")
}

pub fn credentials() -> Credentials {
    Credentials::new("netops", "test-password")
}

pub fn set(literals: &[&str]) -> IpSet {
    IpSet::from_literals(literals).unwrap()
}

/// Short timeouts so paused-clock tests advance quickly
pub fn test_config() -> ReconcileConfig {
    ReconcileConfig {
        connect_timeout_secs: 5,
        read_timeout_secs: 10,
        write_timeout_secs: 20,
        ..ReconcileConfig::default()
    }
}

/// Drain every event currently buffered
pub fn drain_events(rx: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

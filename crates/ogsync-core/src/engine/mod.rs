//! Reconciliation engine
//!
//! The [`Reconciler`] drives one device at a time through the apply protocol:
//!
//! ```text
//! Disconnected ── connect ──▶ Connected ── read ──▶ StateRead ── diff
//!      ▲                                                          │
//!      │            UpToDate / NoManagedPolicy / declined ◀───────┤
//!      │                                                          ▼
//!      └── disconnect ◀── Committing ◀── Pushing (chunks) ◀── Confirmed
//! ```
//!
//! ## Guarantees
//!
//! - The session is disconnected on every exit path, success or failure
//! - A divergent diff is never applied without the approver's yes
//! - Commands reach the device in generated order; chunking only batches them
//! - No transport call is retried and nothing is rolled back. A failure in
//!   the middle of a push leaves the device partially configured and is
//!   surfaced as-is
//!
//! ## Timeouts
//!
//! Every transport call is bounded. Connects use the connect timeout, reads
//! and pushes the read timeout, the persistence step (and any batch carrying
//! an embedded commit) the write timeout. An elapsed persistence step is
//! reported as [`Error::WriteTimeout`] because the device may already hold the
//! new configuration.

mod approval;

pub use approval::{Approver, AutoApprove, DeclineAll};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::commands::CommandSequence;
use crate::config::ReconcileConfig;
use crate::device::DeviceDescriptor;
use crate::diff::{DiffResult, diff};
use crate::error::{Error, Result};
use crate::ip::IpSet;
use crate::traits::{BatchOptions, Credentials, Session, Transport};
use crate::vendor::{Batch, LiveState, ReadContext, Vendor, VendorAdapter};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Session established
    Connected { hostname: String },

    /// Live state read
    StateRead { hostname: String, entries: usize },

    /// Diff computed
    DiffComputed { hostname: String, status: &'static str },

    /// The approver rejected a divergent diff
    ApplyDeclined { hostname: String },

    /// One batch pushed
    ChunkPushed {
        hostname: String,
        index: usize,
        size: usize,
    },

    /// Configuration persisted
    Committed { hostname: String },

    /// Session closed
    Disconnected { hostname: String },

    /// Reconciliation failed
    Failed { hostname: String, error: String },
}

/// Result of a reconciliation that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyOutcome {
    /// Nothing to do
    UpToDate,

    /// No managed ACL on the device; left untouched
    #[serde(rename = "NO_ACL")]
    NoManagedPolicy,

    /// The approver said no; the device was not changed
    Declined { to_add: IpSet, to_delete: IpSet },

    /// The full replace was pushed and persisted
    #[serde(rename = "OK")]
    Applied {
        to_add: IpSet,
        to_delete: IpSet,
        commands_sent: usize,
        batches: usize,
        committed_at: DateTime<Utc>,
    },
}

impl ApplyOutcome {
    /// Short status code for reports
    pub fn status(&self) -> &'static str {
        match self {
            ApplyOutcome::UpToDate => "UP_TO_DATE",
            ApplyOutcome::NoManagedPolicy => "NO_ACL",
            ApplyOutcome::Declined { .. } => "DECLINED",
            ApplyOutcome::Applied { .. } => "OK",
        }
    }

    /// Whether the device was changed
    pub fn mutated(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Result for one device of a fleet run
#[derive(Debug)]
pub struct FleetResult {
    pub hostname: String,
    pub outcome: Result<ApplyOutcome>,
}

/// Live state and diff of one device, read inside an open session
struct Inspection {
    adapter: Box<dyn VendorAdapter>,
    live: LiveState,
    result: DiffResult,
}

/// Core reconciliation engine
///
/// Owns the transport and the configuration. Each call opens its own session,
/// which nothing else shares, and processes devices strictly one after
/// another.
pub struct Reconciler {
    /// Transport for device sessions
    transport: Box<dyn Transport>,

    /// Chunking, timeouts and vendor settings
    config: ReconcileConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// reconcile events
    pub fn new(
        transport: Box<dyn Transport>,
        config: ReconcileConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            transport,
            config,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Render the full-replace sequence for a vendor with default identifiers.
    ///
    /// Pure; touches no device.
    pub fn generate(&self, vendor: Vendor, desired: &IpSet) -> CommandSequence {
        vendor.adapter(&self.config).generate(desired, None)
    }

    /// Read a device and compare it with `desired` without changing anything
    pub async fn diff_device(
        &self,
        device: &DeviceDescriptor,
        desired: &IpSet,
        credentials: &Credentials,
    ) -> Result<DiffResult> {
        let mut session = self.open(device, credentials).await?;
        let result = self
            .inspect(session.as_mut(), device, desired)
            .await
            .map(|inspection| inspection.result);
        self.close(session.as_mut(), device, result).await
    }

    /// Bring a device in line with `desired`.
    ///
    /// A divergent diff is shown to `approver`; only a yes leads to a push.
    pub async fn reconcile(
        &self,
        device: &DeviceDescriptor,
        desired: &IpSet,
        credentials: &Credentials,
        approver: &dyn Approver,
    ) -> Result<ApplyOutcome> {
        let mut session = self.open(device, credentials).await?;
        let result = self
            .apply(session.as_mut(), device, desired, approver)
            .await;
        self.close(session.as_mut(), device, result).await
    }

    /// Reconcile several devices, one after another.
    ///
    /// A failure on one device is logged and recorded; the remaining devices
    /// are still processed.
    pub async fn reconcile_fleet(
        &self,
        devices: &[DeviceDescriptor],
        desired: &IpSet,
        credentials: &Credentials,
        approver: &dyn Approver,
    ) -> Vec<FleetResult> {
        let mut results = Vec::with_capacity(devices.len());

        for device in devices {
            let outcome = self.reconcile(device, desired, credentials, approver).await;
            match &outcome {
                Ok(outcome) => info!("{}: {}", device.hostname, outcome.status()),
                Err(e) => error!("{}: reconciliation failed: {}", device.hostname, e),
            }
            results.push(FleetResult {
                hostname: device.hostname.clone(),
                outcome,
            });
        }

        results
    }

    /// Connect, reporting a failure as a `Failed` event
    async fn open(
        &self,
        device: &DeviceDescriptor,
        credentials: &Credentials,
    ) -> Result<Box<dyn Session>> {
        self.connect(device, credentials).await.inspect_err(|e| {
            self.fail(device, e);
        })
    }

    /// Disconnect whatever `result` holds, then hand it back
    async fn close<T>(
        &self,
        session: &mut dyn Session,
        device: &DeviceDescriptor,
        result: Result<T>,
    ) -> Result<T> {
        self.disconnect(session, device).await;

        if let Err(e) = &result {
            self.fail(device, e);
        }
        result
    }

    async fn inspect(
        &self,
        session: &mut dyn Session,
        device: &DeviceDescriptor,
        desired: &IpSet,
    ) -> Result<Inspection> {
        let adapter = device.vendor.adapter(&self.config);
        let ctx = ReadContext {
            host: &device.address,
            read_timeout: self.config.read_timeout(),
        };

        let live = adapter.read_live_state(session, &ctx).await?;
        self.emit_event(ReconcileEvent::StateRead {
            hostname: device.hostname.clone(),
            entries: live.ips.len(),
        });

        let result = diff(&live.ips, desired, live.policy_present);
        info!("{}: diff {}", device.hostname, result.status());
        self.emit_event(ReconcileEvent::DiffComputed {
            hostname: device.hostname.clone(),
            status: result.status(),
        });

        Ok(Inspection {
            adapter,
            live,
            result,
        })
    }

    async fn apply(
        &self,
        session: &mut dyn Session,
        device: &DeviceDescriptor,
        desired: &IpSet,
        approver: &dyn Approver,
    ) -> Result<ApplyOutcome> {
        let Inspection {
            adapter,
            live,
            result,
        } = self.inspect(session, device, desired).await?;

        let (to_add, to_delete) = match result {
            DiffResult::UpToDate => return Ok(ApplyOutcome::UpToDate),
            DiffResult::NoManagedPolicy => return Ok(ApplyOutcome::NoManagedPolicy),
            DiffResult::Divergent { to_add, to_delete } => (to_add, to_delete),
        };

        if !approver.approve(device, &to_add, &to_delete) {
            info!("{}: changes declined, device left untouched", device.hostname);
            self.emit_event(ReconcileEvent::ApplyDeclined {
                hostname: device.hostname.clone(),
            });
            return Ok(ApplyOutcome::Declined { to_add, to_delete });
        }

        let (commands_sent, batches) = self
            .push(session, device, adapter.as_ref(), desired, &live)
            .await?;

        Ok(ApplyOutcome::Applied {
            to_add,
            to_delete,
            commands_sent,
            batches,
            committed_at: Utc::now(),
        })
    }

    /// Push the full-replace sequence and persist it
    async fn push(
        &self,
        session: &mut dyn Session,
        device: &DeviceDescriptor,
        adapter: &dyn VendorAdapter,
        desired: &IpSet,
        live: &LiveState,
    ) -> Result<(usize, usize)> {
        let commands = adapter.generate(desired, Some(live));
        let plan = adapter.push_plan(&commands, self.config.chunk_size);
        info!(
            "{}: pushing {} commands in {} batch(es)",
            device.hostname,
            plan.command_count(),
            plan.batches.len()
        );

        for (index, batch) in plan.batches.iter().enumerate() {
            self.send_batch(session, device, batch).await?;
            debug!(
                "{}: batch {} ({} commands) pushed",
                device.hostname,
                index,
                batch.commands.len()
            );
            self.emit_event(ReconcileEvent::ChunkPushed {
                hostname: device.hostname.clone(),
                index,
                size: batch.commands.len(),
            });
        }

        if let Some(persist) = &plan.persist {
            let timeout = self.config.write_timeout();
            let result = tokio::time::timeout(timeout, session.send(persist)).await;
            as_write_failure(result, &device.address, timeout)?;
        }

        info!("{}: configuration committed", device.hostname);
        self.emit_event(ReconcileEvent::Committed {
            hostname: device.hostname.clone(),
        });

        Ok((plan.command_count(), plan.batches.len()))
    }

    async fn send_batch(
        &self,
        session: &mut dyn Session,
        device: &DeviceDescriptor,
        batch: &Batch,
    ) -> Result<()> {
        let timeout = if batch.commits {
            self.config.write_timeout()
        } else {
            self.config.read_timeout()
        };
        let options = BatchOptions {
            enter_mode: batch.enter_mode,
            exit_mode: batch.exit_mode,
            verify_echo: false,
            read_timeout: timeout,
        };

        let result =
            tokio::time::timeout(timeout, session.send_batch(&batch.commands, &options)).await;

        if batch.commits {
            as_write_failure(result, &device.address, timeout)?;
        } else {
            match result {
                Ok(output) => {
                    output?;
                }
                Err(_) => {
                    return Err(Error::ReadTimeout {
                        host: device.address.clone(),
                        timeout,
                    });
                }
            }
        }

        Ok(())
    }

    async fn connect(
        &self,
        device: &DeviceDescriptor,
        credentials: &Credentials,
    ) -> Result<Box<dyn Session>> {
        let timeout = self.config.connect_timeout();
        debug!("Connecting to {} ({}, {})", device.hostname, device.address, device.vendor);

        let session = tokio::time::timeout(
            timeout,
            self.transport
                .connect(&device.address, credentials, device.vendor),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            host: device.address.clone(),
            timeout,
        })??;

        info!("Connected to {} ({})", device.hostname, device.address);
        self.emit_event(ReconcileEvent::Connected {
            hostname: device.hostname.clone(),
        });
        Ok(session)
    }

    /// Close the session; failures are logged, never surfaced
    async fn disconnect(&self, session: &mut dyn Session, device: &DeviceDescriptor) {
        let timeout = self.config.read_timeout();
        match tokio::time::timeout(timeout, session.disconnect()).await {
            Ok(Ok(())) => debug!("Disconnected from {}", device.hostname),
            Ok(Err(e)) => warn!("Disconnect from {} failed: {}", device.hostname, e),
            Err(_) => warn!("Disconnect from {} timed out after {:?}", device.hostname, timeout),
        }
        self.emit_event(ReconcileEvent::Disconnected {
            hostname: device.hostname.clone(),
        });
    }

    fn fail(&self, device: &DeviceDescriptor, error: &Error) {
        self.emit_event(ReconcileEvent::Failed {
            hostname: device.hostname.clone(),
            error: error.to_string(),
        });
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        // A full channel drops the event; reconciliation never waits on observers
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Classify the outcome of a persistence step.
///
/// Both an elapsed timer and a transport-reported read timeout mean the
/// device did not confirm the write in time.
fn as_write_failure<T>(
    result: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
    host: &str,
    timeout: Duration,
) -> Result<T> {
    let write_timeout = || Error::WriteTimeout {
        host: host.to_string(),
        timeout,
    };

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(Error::ReadTimeout { .. })) | Err(_) => Err(write_timeout()),
        Ok(Err(e)) => Err(e),
    }
}

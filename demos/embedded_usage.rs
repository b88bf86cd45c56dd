//! Minimal embedding example for ogsync-core
//!
//! Drives the Reconciler against an in-process lab router that keeps its
//! access lists in memory. The application supplies the transport, the
//! approval policy and the event consumer.

use ogsync_core::traits::{BatchOptions, Credentials, Session, Transport};
use ogsync_core::vendor::acl::parse_access_list;
use ogsync_core::{
    DeviceDescriptor, DiffResult, IpEntry, IpSet, ReconcileConfig, Reconciler, Result, Vendor,
};
use std::sync::{Arc, Mutex};

/// A pretend IOS router whose allow-list lives in memory
#[derive(Clone, Default)]
struct LabRouter {
    running: Arc<Mutex<IpSet>>,
    saved: Arc<Mutex<IpSet>>,
}

impl LabRouter {
    fn with_entries(literals: &[&str]) -> Result<Self> {
        let router = Self::default();
        *router.running.lock().unwrap() = IpSet::from_literals(literals)?;
        Ok(router)
    }

    fn render(entry: &IpEntry) -> String {
        if entry.is_host() {
            format!("host {}", entry.network())
        } else {
            format!("{} {}", entry.network(), entry.hostmask())
        }
    }

    fn show(&self, command: &str) -> String {
        let running = self.running.lock().unwrap();
        match command {
            "show ip access-lists | include access list" => {
                "Extended IP access list FROM-OPEN-GARDEN\n\
                 Extended IP access list TO-OPEN-GARDEN\n"
                    .to_string()
            }
            "show ip access-lists FROM-OPEN-GARDEN" => running
                .iter()
                .enumerate()
                .map(|(i, e)| format!("    {} permit ip {} any\n", (i + 1) * 10, Self::render(e)))
                .collect(),
            "show ip access-lists TO-OPEN-GARDEN" => running
                .iter()
                .enumerate()
                .map(|(i, e)| format!("    {} permit ip any {}\n", (i + 1) * 10, Self::render(e)))
                .collect(),
            "write" => {
                *self.saved.lock().unwrap() = running.clone();
                "[OK]".to_string()
            }
            _ => String::new(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for LabRouter {
    async fn connect(
        &self,
        address: &str,
        credentials: &Credentials,
        vendor: Vendor,
    ) -> Result<Box<dyn Session>> {
        println!("[lab] {credentials:?} logging in to {address} ({vendor})");
        Ok(Box::new(self.clone()))
    }
}

#[async_trait::async_trait]
impl Session for LabRouter {
    async fn send(&mut self, command: &str) -> Result<String> {
        Ok(self.show(command))
    }

    async fn send_batch(&mut self, commands: &[String], options: &BatchOptions) -> Result<String> {
        println!(
            "[lab] batch of {} (enter {:?}, exit {})",
            commands.len(),
            options.enter_mode,
            options.exit_mode
        );
        let mut running = self.running.lock().unwrap();
        if commands.iter().any(|c| c.starts_with("no ip access-list")) {
            *running = IpSet::new();
        }
        *running = running.union(&parse_access_list(&commands.join("\n")));
        Ok(String::new())
    }

    async fn disconnect(&mut self) -> Result<()> {
        println!("[lab] logout");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Embedded ogsync-core Example ===\n");

    let router = LabRouter::with_entries(&["10.0.0.1", "10.0.1.0/24"])?;
    let saved = Arc::clone(&router.saved);

    println!("1. Creating reconciler...");
    let (reconciler, mut event_rx) =
        Reconciler::new(Box::new(router), ReconcileConfig::default())?;

    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[event] {event:?}");
        }
    });

    let device = DeviceDescriptor::new("lab-bras", Vendor::Acl, "192.0.2.1");
    let credentials = Credentials::new("netops", "lab-only");
    let desired = IpSet::from_literals(["10.0.0.1", "10.0.2.0/24"])?;

    println!("2. Dry run...");
    if let DiffResult::Divergent { to_add, to_delete } =
        reconciler.diff_device(&device, &desired, &credentials).await?
    {
        println!("   would add {:?}, delete {:?}", to_add.to_strings(), to_delete.to_strings());
    }

    println!("3. Reconciling with an approval policy...");
    // Only allow changes that remove at most one entry
    let approver =
        |_: &DeviceDescriptor, _: &IpSet, to_delete: &IpSet| to_delete.len() <= 1;
    let outcome = reconciler
        .reconcile(&device, &desired, &credentials, &approver)
        .await?;
    println!("   outcome: {}", outcome.status());

    println!("4. Reconciling again...");
    let outcome = reconciler
        .reconcile(&device, &desired, &credentials, &approver)
        .await?;
    println!("   outcome: {}", outcome.status());

    println!("   saved configuration: {:?}", saved.lock().unwrap().to_strings());

    drop(reconciler);
    let _ = event_listener.await;

    println!("\n=== Embedding Successful ===");
    Ok(())
}

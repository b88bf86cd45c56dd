// # Transport Trait
//
// Defines the CLI session primitive the engine drives devices through.
// SSH/Telnet handling, prompt detection and paging live in implementations,
// not here.
//
// ## Usage
//
// ```rust,ignore
// use ogsync_core::traits::{Transport, Credentials, BatchOptions, ConfigMode};
//
// let mut session = transport.connect("10.0.0.1", &credentials, Vendor::Acl).await?;
// let listing = session.send("show ip access-lists").await?;
// session
//     .send_batch(&commands, &BatchOptions::new(read_timeout).enter(ConfigMode::Global).exit())
//     .await?;
// session.disconnect().await?;
// ```

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::vendor::Vendor;

/// Login credentials for a device
///
/// The `Debug` implementation never shows the password.
#[derive(Clone)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Login password
    /// ⚠️ NEVER log this value
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Configuration mode to enter before a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Shared global configuration mode (`configure terminal`)
    Global,
    /// Exclusive configuration session (`configure exclusive`)
    Exclusive,
}

/// Options for [`Session::send_batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Enter this configuration mode before the first command
    pub enter_mode: Option<ConfigMode>,
    /// Leave configuration mode after the last command
    pub exit_mode: bool,
    /// Wait for each command to be echoed back before sending the next
    pub verify_echo: bool,
    /// How long to wait for the device to finish the batch
    pub read_timeout: Duration,
}

impl BatchOptions {
    /// Plain batch: no mode change, no echo verification
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            enter_mode: None,
            exit_mode: false,
            verify_echo: false,
            read_timeout,
        }
    }

    /// Enter a configuration mode first
    pub fn enter(mut self, mode: ConfigMode) -> Self {
        self.enter_mode = Some(mode);
        self
    }

    /// Leave configuration mode afterwards
    pub fn exit(mut self) -> Self {
        self.exit_mode = true;
        self
    }
}

/// Factory for device sessions
///
/// # Errors
///
/// Implementations must report rejected credentials as
/// [`Error::Authentication`](crate::Error::Authentication) and an unanswered
/// connect as [`Error::ConnectTimeout`](crate::Error::ConnectTimeout), so the
/// engine can surface them distinctly. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session to a device
    ///
    /// # Parameters
    ///
    /// - `address`: Management address of the device
    /// - `credentials`: Login credentials
    /// - `vendor`: Device family, selects prompt/paging handling
    async fn connect(
        &self,
        address: &str,
        credentials: &Credentials,
        vendor: Vendor,
    ) -> Result<Box<dyn Session>, crate::Error>;
}

/// An open CLI session, exclusively owned by one reconciliation
#[async_trait]
pub trait Session: Send {
    /// Send one command and return its output
    async fn send(&mut self, command: &str) -> Result<String, crate::Error>;

    /// Send several commands in order and return the combined output
    ///
    /// Commands must reach the device in slice order.
    async fn send_batch(
        &mut self,
        commands: &[String],
        options: &BatchOptions,
    ) -> Result<String, crate::Error>;

    /// Close the session
    async fn disconnect(&mut self) -> Result<(), crate::Error>;
}

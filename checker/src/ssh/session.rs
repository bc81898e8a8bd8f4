//! Interactive session driver
//!
//! Drives one pseudo-terminal channel through a fixed sequence: the first
//! command is executed as the channel command, every later command is typed
//! into the running shell. There is no framing on the channel, so after each
//! command the driver waits for output to settle using a timing heuristic
//! (settle delay, readiness polling, after-command delay).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::sanitize::sanitize_bytes;
use crate::config::SessionConfig;
use crate::constants::session as defaults;
use crate::errors::CheckError;

/// Remote shell endpoint of a session node
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub credential: SecretString,
}

/// Timing and size policy of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
    pub channel_timeout: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub max_command_wait: Duration,
    pub after_command_wait: Duration,
    pub read_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: defaults::CONNECT_TIMEOUT,
            channel_timeout: defaults::CHANNEL_TIMEOUT,
            settle_delay: defaults::SETTLE_DELAY,
            poll_interval: defaults::POLL_INTERVAL,
            max_command_wait: defaults::MAX_COMMAND_WAIT,
            after_command_wait: defaults::AFTER_COMMAND_WAIT,
            read_limit: defaults::READ_LIMIT_BYTES,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            channel_timeout: Duration::from_secs(config.channel_timeout_seconds),
            settle_delay: Duration::from_secs(config.settle_delay_seconds),
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            max_command_wait: Duration::from_secs(config.max_command_wait_seconds),
            after_command_wait: Duration::from_secs(config.after_command_wait_seconds),
            read_limit: config.read_limit_bytes,
        }
    }

    pub fn with_after_command_wait(mut self, wait: Duration) -> Self {
        self.after_command_wait = wait;
        self
    }
}

/// Byte-level access to an open pseudo-terminal channel
#[async_trait]
pub trait ShellChannel: Send {
    /// Run `command` as the channel command
    async fn exec(&mut self, command: &str) -> Result<(), CheckError>;

    /// Write raw input into the running shell
    async fn send(&mut self, data: &str) -> Result<(), CheckError>;

    /// Whether unread output is buffered, without blocking
    async fn poll_ready(&mut self) -> Result<bool, CheckError>;

    /// Take at most `limit` bytes of buffered output, waiting up to the
    /// channel timeout when nothing is buffered yet
    async fn read(&mut self, limit: usize) -> Result<Vec<u8>, CheckError>;

    /// Release the channel and its connection
    async fn close(&mut self);
}

/// Opens authenticated channels with a pseudo-terminal attached
#[async_trait]
pub trait ShellConnector: Send + Sync {
    async fn open(
        &self,
        target: &SessionTarget,
        settings: &SessionSettings,
    ) -> Result<Box<dyn ShellChannel>, CheckError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Channel open, nothing executed yet
    Connected,
    /// At least one command sent
    Interactive { escalated: bool, attached: bool },
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    CommandSent,
    Escalated,
    Attached,
    Closed,
}

impl SessionPhase {
    /// Transition table of the session state machine
    pub fn next(self, event: SessionEvent) -> Result<SessionPhase, CheckError> {
        use SessionEvent as E;
        use SessionPhase as P;

        match (self, event) {
            (P::Closed, _) => Err(self.reject(event)),
            (_, E::Closed) => Ok(P::Closed),
            (P::Connected, E::CommandSent) => Ok(P::Interactive {
                escalated: false,
                attached: false,
            }),
            (P::Connected, E::Escalated | E::Attached) => Err(self.reject(event)),
            (P::Interactive { .. }, E::CommandSent) => Ok(self),
            (P::Interactive { attached, .. }, E::Escalated) => Ok(P::Interactive {
                escalated: true,
                attached,
            }),
            (P::Interactive { escalated, .. }, E::Attached) => Ok(P::Interactive {
                escalated,
                attached: true,
            }),
        }
    }

    pub fn is_escalated(self) -> bool {
        matches!(self, SessionPhase::Interactive { escalated: true, .. })
    }

    pub fn is_attached(self) -> bool {
        matches!(self, SessionPhase::Interactive { attached: true, .. })
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionPhase::Connected => "connected",
            SessionPhase::Interactive { .. } => "interactive",
            SessionPhase::Closed => "closed",
        }
    }

    fn reject(self, event: SessionEvent) -> CheckError {
        CheckError::InvalidTransition {
            phase: self.name(),
            event: event.name(),
        }
    }
}

impl SessionEvent {
    pub fn name(self) -> &'static str {
        match self {
            SessionEvent::CommandSent => "command",
            SessionEvent::Escalated => "escalation",
            SessionEvent::Attached => "terminal attach",
            SessionEvent::Closed => "close",
        }
    }
}

/// One interactive session; only obtainable through [`SessionDriver::open`]
pub struct SessionDriver {
    host: String,
    channel: Box<dyn ShellChannel>,
    phase: SessionPhase,
    settings: SessionSettings,
    credential: SecretString,
}

impl SessionDriver {
    pub async fn open(
        connector: &dyn ShellConnector,
        target: &SessionTarget,
        settings: SessionSettings,
    ) -> Result<Self, CheckError> {
        debug!("Opening session to {}@{}:{}", target.user, target.host, target.port);
        let channel = connector.open(target, &settings).await?;

        Ok(Self {
            host: target.host.clone(),
            channel,
            phase: SessionPhase::Connected,
            settings,
            credential: target.credential.clone(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub async fn send_command(&mut self, command: &str) -> Result<(), CheckError> {
        self.transmit(command, command).await
    }

    // `label` stands in for the payload in logs and errors
    async fn transmit(&mut self, payload: &str, label: &str) -> Result<(), CheckError> {
        let next = self.phase.next(SessionEvent::CommandSent)?;

        if self.phase == SessionPhase::Connected {
            debug!("[{}] exec: {}", self.host, label);
            self.channel.exec(payload).await?;
        } else {
            debug!("[{}] send: {}", self.host, label);
            self.channel.send(&format!("{}\n", payload)).await?;
        }
        self.phase = next;

        self.wait_ready(label).await
    }

    /// Best-effort settle: output may still be trailing when this returns
    pub async fn wait_ready(&mut self, command: &str) -> Result<(), CheckError> {
        sleep(self.settings.settle_delay).await;

        let started = Instant::now();
        while !self.channel.poll_ready().await? {
            if started.elapsed() >= self.settings.max_command_wait {
                return Err(CheckError::command_timeout(
                    command,
                    self.settings.max_command_wait,
                ));
            }
            sleep(self.settings.poll_interval).await;
        }

        sleep(self.settings.after_command_wait).await;
        Ok(())
    }

    pub async fn escalate_privilege(&mut self) -> Result<(), CheckError> {
        if self.phase.is_escalated() {
            return Ok(());
        }

        self.send_command(defaults::ESCALATE_COMMAND).await?;
        let credential = self.credential.clone();
        self.transmit(credential.expose_secret(), "<credential>").await?;
        self.phase = self.phase.next(SessionEvent::Escalated)?;

        info!("[{}] privileges escalated", self.host);
        Ok(())
    }

    pub async fn attach_terminal(&mut self, name: &str) -> Result<(), CheckError> {
        if self.phase.is_attached() {
            return Ok(());
        }

        self.send_command(&format!("screen -dr {}", name)).await?;
        self.phase = self.phase.next(SessionEvent::Attached)?;

        info!("[{}] attached to terminal session {}", self.host, name);
        Ok(())
    }

    /// Escalate and attach as requested, send `commands` in order, then read
    /// the accumulated output once
    pub async fn exec_commands(
        &mut self,
        commands: &[&str],
        terminal: Option<&str>,
        use_sudo: bool,
    ) -> Result<Vec<String>, CheckError> {
        if use_sudo {
            self.escalate_privilege().await?;
        }
        if let Some(name) = terminal {
            self.attach_terminal(name).await?;
        }

        for command in commands {
            self.send_command(command).await?;
        }

        let raw = self.channel.read(self.settings.read_limit).await?;
        debug!("[{}] read {} bytes", self.host, raw.len());

        Ok(sanitize_bytes(&raw))
    }

    pub async fn close(&mut self) {
        if let Ok(next) = self.phase.next(SessionEvent::Closed) {
            self.channel.close().await;
            self.phase = next;
            debug!("[{}] session closed", self.host);
        }
    }
}

/// Open a session, run `commands` and close it again whatever the outcome
pub async fn run_session(
    connector: &dyn ShellConnector,
    target: &SessionTarget,
    settings: SessionSettings,
    commands: &[&str],
    terminal: Option<&str>,
    use_sudo: bool,
) -> Result<Vec<String>, CheckError> {
    let mut driver = SessionDriver::open(connector, target, settings).await?;
    let result = driver.exec_commands(commands, terminal, use_sudo).await;
    driver.close().await;
    result
}

//! SSH transport for interactive sessions, built on `russh`

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::session::{SessionSettings, SessionTarget, ShellChannel, ShellConnector};
use crate::constants::session::PTY_TERM;
use crate::errors::CheckError;

// How long a non-blocking drain waits for one more message
const DRAIN_WINDOW: Duration = Duration::from_millis(50);

const PTY_COLUMNS: u32 = 200;
const PTY_ROWS: u32 = 50;

/// Accepts any host key; monitored hosts are reached by address only
struct AcceptingHandler;

#[async_trait]
impl client::Handler for AcceptingHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Password-authenticated SSH connector
#[derive(Debug, Clone, Default)]
pub struct SshConnector;

impl SshConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShellConnector for SshConnector {
    async fn open(
        &self,
        target: &SessionTarget,
        settings: &SessionSettings,
    ) -> Result<Box<dyn ShellChannel>, CheckError> {
        let host = target.host.as_str();
        let config = Arc::new(client::Config::default());

        let connect = async {
            let mut session = client::connect(config, (host, target.port), AcceptingHandler)
                .await
                .map_err(|e| CheckError::connection(host, e))?;

            let authenticated = session
                .authenticate_password(target.user.as_str(), target.credential.expose_secret())
                .await
                .map_err(|e| CheckError::connection(host, e))?;
            if !authenticated {
                return Err(CheckError::connection(
                    host,
                    format!("authentication failed for user {}", target.user),
                ));
            }

            let channel = session
                .channel_open_session()
                .await
                .map_err(|e| CheckError::connection(host, e))?;
            channel
                .request_pty(false, PTY_TERM, PTY_COLUMNS, PTY_ROWS, 0, 0, &[])
                .await
                .map_err(|e| CheckError::connection(host, e))?;

            Ok::<_, CheckError>((session, channel))
        };

        let (session, channel) = timeout(settings.connect_timeout, connect)
            .await
            .map_err(|_| {
                CheckError::connection(
                    host,
                    format!("timed out after {} seconds", settings.connect_timeout.as_secs()),
                )
            })??;

        debug!("SSH channel open to {}:{}", host, target.port);

        Ok(Box::new(SshChannel {
            host: target.host.clone(),
            session: Some(session),
            channel,
            buffer: Vec::new(),
            finished: false,
            read_timeout: settings.channel_timeout,
        }))
    }
}

/// One pseudo-terminal channel plus the connection that owns it
pub struct SshChannel {
    host: String,
    session: Option<Handle<AcceptingHandler>>,
    channel: Channel<Msg>,
    buffer: Vec<u8>,
    finished: bool,
    read_timeout: Duration,
}

impl SshChannel {
    fn absorb(&mut self, message: ChannelMsg) {
        match message {
            ChannelMsg::Data { data } => self.buffer.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, .. } => self.buffer.extend_from_slice(&data),
            ChannelMsg::Eof | ChannelMsg::Close => self.finished = true,
            _ => {}
        }
    }

    /// Pull every message that arrives within the drain window
    async fn drain(&mut self) {
        while !self.finished {
            match timeout(DRAIN_WINDOW, self.channel.wait()).await {
                Ok(Some(message)) => self.absorb(message),
                Ok(None) => self.finished = true,
                Err(_) => break,
            }
        }
    }
}

#[async_trait]
impl ShellChannel for SshChannel {
    async fn exec(&mut self, command: &str) -> Result<(), CheckError> {
        self.channel
            .exec(true, command)
            .await
            .map_err(|e| CheckError::connection(&self.host, e))
    }

    async fn send(&mut self, data: &str) -> Result<(), CheckError> {
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(|e| CheckError::connection(&self.host, e))
    }

    async fn poll_ready(&mut self) -> Result<bool, CheckError> {
        self.drain().await;
        Ok(!self.buffer.is_empty())
    }

    async fn read(&mut self, limit: usize) -> Result<Vec<u8>, CheckError> {
        if self.buffer.is_empty() && !self.finished {
            match timeout(self.read_timeout, self.channel.wait()).await {
                Ok(Some(message)) => self.absorb(message),
                Ok(None) => self.finished = true,
                Err(_) => {
                    return Err(CheckError::connection(
                        &self.host,
                        format!("no output after {} seconds", self.read_timeout.as_secs()),
                    ))
                }
            }
        }
        self.drain().await;

        let take = limit.min(self.buffer.len());
        Ok(self.buffer.drain(..take).collect())
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close().await {
            debug!("[{}] channel close: {}", self.host, e);
        }
        if let Some(session) = self.session.take() {
            if let Err(e) = session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                warn!("[{}] disconnect failed: {}", self.host, e);
            }
        }
    }
}

impl Drop for SshChannel {
    fn drop(&mut self) {
        // Dropped without close(), e.g. a cancelled check
        if let Some(session) = self.session.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = session
                        .disconnect(Disconnect::ByApplication, "", "English")
                        .await;
                });
            }
        }
    }
}

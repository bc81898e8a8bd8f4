//! Scripted shell sessions standing in for SSH
//!
//! Each host gets a canned terminal output. Every byte typed into a session
//! is recorded so tests can assert on the command sequence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use node_checker::errors::CheckError;
use node_checker::ssh::{SessionSettings, SessionTarget, ShellChannel, ShellConnector};

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    outputs: Arc<Mutex<HashMap<String, String>>>,
    typed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned by every session opened to `host`
    pub fn with_output(self, host: &str, output: &str) -> Self {
        self.set_output(host, output);
        self
    }

    pub fn set_output(&self, host: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(host.to_string(), output.to_string());
    }

    /// Commands executed or typed, across all sessions, in order
    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellConnector for ScriptedConnector {
    async fn open(
        &self,
        target: &SessionTarget,
        _settings: &SessionSettings,
    ) -> Result<Box<dyn ShellChannel>, CheckError> {
        let output = self
            .outputs
            .lock()
            .unwrap()
            .get(&target.host)
            .cloned()
            .ok_or_else(|| CheckError::connection(&target.host, "No route to host"))?;

        Ok(Box::new(ScriptedChannel {
            output: output.into_bytes(),
            typed: self.typed.clone(),
        }))
    }
}

struct ScriptedChannel {
    output: Vec<u8>,
    typed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ShellChannel for ScriptedChannel {
    async fn exec(&mut self, command: &str) -> Result<(), CheckError> {
        self.typed.lock().unwrap().push(command.to_string());
        Ok(())
    }

    async fn send(&mut self, data: &str) -> Result<(), CheckError> {
        self.typed
            .lock()
            .unwrap()
            .push(data.trim_end_matches('\n').to_string());
        Ok(())
    }

    async fn poll_ready(&mut self) -> Result<bool, CheckError> {
        Ok(true)
    }

    async fn read(&mut self, limit: usize) -> Result<Vec<u8>, CheckError> {
        let take = limit.min(self.output.len());
        Ok(self.output.drain(..take).collect())
    }

    async fn close(&mut self) {}
}

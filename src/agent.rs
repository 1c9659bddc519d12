//! # Agent: host-side glue between a command source and the controller.
//!
//! ```text
//! CommandSource ──line──► Agent::handle_line
//!                           ├─ ShutdownCoordinator::register()   (first command only)
//!                           ├─ line.parse::<Command>()
//!                           └─ Controller::execute(cmd) ──► Reply / ControlError
//!
//! source exhausted ──► wait_non_daemon() ──► ShutdownCoordinator::run("exit")
//! signal           ──► ShutdownCoordinator (drains) ──► serve() returns
//! ```
//!
//! Command errors are rendered as `error: ...` lines and never end the loop;
//! only an I/O failure of the source or the output does.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    command::Command,
    core::{Controller, DrainReport, Reply, ShutdownCoordinator},
    error::ControlError,
    source::CommandSource,
};

/// Reads commands, executes them and writes replies.
pub struct Agent {
    controller: Arc<Controller>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl Agent {
    /// Creates an agent and its (not yet registered) shutdown hook.
    pub fn new(controller: Arc<Controller>) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new(Arc::clone(&controller)));
        Self {
            controller,
            shutdown,
        }
    }

    /// The controller commands are executed against.
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// The shutdown hook owned by this agent.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Parses and executes one command line.
    ///
    /// The first call registers the shutdown hook.
    pub async fn handle_line(&self, line: &str) -> Result<Reply, ControlError> {
        if self.shutdown.register() {
            tracing::debug!(target: "workerctl", "shutdown hook registered");
        }
        let cmd: Command = line.parse()?;
        tracing::debug!(target: "workerctl", command = %cmd, "executing");
        self.controller.execute(cmd).await
    }

    /// Serves commands from `source` until it is exhausted or a termination
    /// signal drains the controller.
    ///
    /// On exhaustion waits for non-daemon workers, then drains. Returns the
    /// drain report if this call performed the drain; otherwise returns only
    /// after the drain started elsewhere has completed.
    pub async fn serve<S, W>(&self, mut source: S, mut out: W) -> io::Result<Option<DrainReport>>
    where
        S: CommandSource,
        W: AsyncWrite + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.completed() => return Ok(None),
                next = source.next_command() => next?,
            };
            let Some(line) = next else { break };
            if line.trim().is_empty() {
                continue;
            }

            let text = match self.handle_line(&line).await {
                Ok(reply) => reply.to_string(),
                Err(e) => {
                    tracing::warn!(
                        target: "workerctl",
                        label = e.as_label(),
                        line = %line.trim(),
                        "command rejected: {e}"
                    );
                    format!("error: {e}")
                }
            };
            out.write_all(text.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
        }

        tokio::select! {
            biased;
            _ = self.shutdown.completed() => return Ok(None),
            _ = self.controller.wait_non_daemon() => {}
        }
        match self.shutdown.run("exit").await {
            Some(report) => Ok(Some(report)),
            None => {
                // Drain fired elsewhere; let it finish its grace window.
                self.shutdown.completed().await;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::source::ScriptSource;

    #[tokio::test]
    async fn first_command_registers_hook() {
        let agent = Agent::new(Arc::new(Controller::new(ControllerConfig::default())));
        assert!(!agent.shutdown().is_registered());

        let err = agent.handle_line("bogus").await.unwrap_err();
        assert_eq!(err.as_label(), "unknown_command");
        assert!(agent.shutdown().is_registered());
    }

    #[tokio::test]
    async fn serve_renders_replies_and_drains_on_exit() {
        let agent = Agent::new(Arc::new(Controller::new(ControllerConfig::default())));
        let source = ScriptSource::new(["add:tick:true:10", "", "add:tick", "create,nap,0", "list"]);
        let mut out = Vec::new();

        let report = agent.serve(source, &mut out).await.unwrap().unwrap();
        assert_eq!(report.stopped, vec!["tick".to_string()]);
        assert!(agent.controller().list().await.is_empty());
        assert!(agent.shutdown().run("again").await.is_none());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("worker 'tick' started"));
        assert_eq!(lines[1], "error: worker 'tick' already exists");
        assert!(lines[2].starts_with("worker 'nap' started"));
    }
}

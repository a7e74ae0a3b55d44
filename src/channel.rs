//! Remote command channel
//!
//! Fire-and-forget delivery of command text to a named component on the
//! host (the script runtime, the audio engine). Independent of the buffer
//! cache; nothing comes back through this path.

use crate::error::ApiError;
use tokio::sync::mpsc;
use tracing::debug;

/// Script runtime component
pub const MATRON_COMPONENT: &str = "matron";
/// Audio engine component
pub const CRONE_COMPONENT: &str = "crone";

pub trait CommandChannel: Send + Sync {
    fn send(&self, target: &str, text: &str) -> Result<(), ApiError>;
}

/// Command text that loads and runs the script at `path` on the runtime
pub fn script_load_command(path: &str) -> String {
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    format!("norns.script.load(\"{}\")", escaped)
}

/// A command addressed to one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCommand {
    pub target: String,
    pub text: String,
}

/// Channel that queues commands for a transport task to drain
pub struct QueuedChannel {
    tx: mpsc::UnboundedSender<OutgoingCommand>,
}

impl QueuedChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutgoingCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CommandChannel for QueuedChannel {
    fn send(&self, target: &str, text: &str) -> Result<(), ApiError> {
        debug!(target_component = target, "Queueing remote command");
        self.tx
            .send(OutgoingCommand {
                target: target.to_string(),
                text: text.to_string(),
            })
            .map_err(|_| ApiError::RemoteFailure("command channel closed".to_string()))
    }
}

/// Channel that prints each command as `[target] text`
#[derive(Debug, Default)]
pub struct StdoutChannel;

impl CommandChannel for StdoutChannel {
    fn send(&self, target: &str, text: &str) -> Result<(), ApiError> {
        println!("[{}] {}", target, text);
        Ok(())
    }
}

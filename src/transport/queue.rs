//! Serialized command submission.
//!
//! Every command goes through one FIFO worker, so at most one
//! connect-or-send cycle runs against the session at a time. A command is
//! settled when the socket accepts the write; the protocol has no replies
//! to wait for.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::Command;

use super::connection::ConnectionManager;

// ============================================================================
// PendingCommand
// ============================================================================

/// A submitted command waiting for its turn.
struct PendingCommand {
    /// Serialized frame.
    payload: String,
    /// Settled once the write completed or failed.
    outcome: oneshot::Sender<Result<()>>,
}

// ============================================================================
// CommandQueue
// ============================================================================

/// FIFO queue in front of the [`ConnectionManager`].
///
/// The worker task is spawned on first use. A failed command does not
/// affect the ones queued behind it; each makes its own connect attempt.
pub struct CommandQueue {
    manager: Arc<ConnectionManager>,
    sender: Mutex<Option<mpsc::UnboundedSender<PendingCommand>>>,
}

impl CommandQueue {
    /// Creates a queue feeding `manager`.
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            sender: Mutex::new(None),
        }
    }

    /// Sends `command` once every earlier submission has settled.
    ///
    /// Dropping the returned future does not cancel the write.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the command cannot be serialized
    /// - the classified connect failure
    /// - [`Error::SocketNotReady`] or [`Error::SendFailed`] from the write
    pub async fn submit(&self, command: &Command) -> Result<()> {
        let payload = serde_json::to_string(command)?;
        trace!(method = command.method(), "Queueing command");

        let (outcome, outcome_rx) = oneshot::channel();
        self.worker()
            .send(PendingCommand { payload, outcome })
            .map_err(|_| Error::protocol("command queue stopped"))?;

        outcome_rx
            .await
            .map_err(|_| Error::protocol("command queue stopped"))?
    }

    /// Returns the worker's inbox, spawning the worker if needed.
    fn worker(&self) -> mpsc::UnboundedSender<PendingCommand> {
        let mut sender = self.sender.lock();
        if let Some(tx) = sender.as_ref()
            && !tx.is_closed()
        {
            return tx.clone();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run_worker(Arc::clone(&self.manager), rx));
        *sender = Some(tx.clone());
        tx
    }

    /// Executes queued commands one at a time.
    async fn run_worker(
        manager: Arc<ConnectionManager>,
        mut inbox: mpsc::UnboundedReceiver<PendingCommand>,
    ) {
        while let Some(pending) = inbox.recv().await {
            let result = Self::execute(&manager, pending.payload).await;
            if let Err(e) = &result {
                debug!(error = %e, "Command failed");
            }
            let _ = pending.outcome.send(result);
        }
        debug!("Command queue stopped");
    }

    async fn execute(manager: &ConnectionManager, payload: String) -> Result<()> {
        let connection = manager.ensure_open().await?;

        // The socket may have closed between acknowledgement and now
        if !connection.is_open() {
            return Err(Error::SocketNotReady);
        }

        connection.send_text(payload).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use parking_lot::RwLock;
    use serde_json::json;
    use tokio_tungstenite::tungstenite::Message;

    use crate::config::{MemorySettings, Settings, SettingsStore};
    use crate::error::ErrorKind;
    use crate::protocol::{Key, KeyAction};
    use crate::remote::AppCatalog;
    use crate::transport::testing::FakeTv;

    fn queue_for(config: crate::config::Config) -> Arc<CommandQueue> {
        let settings: Arc<dyn SettingsStore> =
            Arc::new(MemorySettings::new(Settings::new("127.0.0.1")));
        let manager = Arc::new(ConnectionManager::new(
            config.shared(),
            settings,
            Arc::new(RwLock::new(AppCatalog::new())),
        ));
        Arc::new(CommandQueue::new(manager))
    }

    #[tokio::test]
    async fn test_submit_connects_then_writes() {
        let mut tv = FakeTv::acknowledging(None).await;
        let queue = queue_for(tv.config());

        queue
            .submit(&Command::key(&Key::Home, KeyAction::Click))
            .await
            .expect("submit");

        assert_eq!(tv.accepted(), 1);
        let frame = tv.next_text().await;
        assert_eq!(frame["method"], "ms.remote.control");
        assert_eq!(frame["params"]["DataOfCmd"], "KEY_HOME");
    }

    #[tokio::test]
    async fn test_concurrent_submits_share_one_connect_and_keep_order() {
        let mut tv = FakeTv::acknowledging(None).await;
        let queue = queue_for(tv.config());

        let keys = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Enter];
        let submissions: Vec<_> = keys
            .iter()
            .map(|key| {
                let queue = Arc::clone(&queue);
                let command = Command::key(key, KeyAction::Click);
                async move { queue.submit(&command).await }
            })
            .collect();

        for result in futures_util::future::join_all(submissions).await {
            result.expect("submit");
        }

        assert_eq!(tv.accepted(), 1);
        for key in &keys {
            assert_eq!(tv.next_text().await["params"]["DataOfCmd"], json!(key.code()));
        }
    }

    #[tokio::test]
    async fn test_failed_connect_writes_nothing_and_next_command_retries() {
        let mut tv = FakeTv::start(vec![Message::Close(None)]).await;
        let queue = queue_for(tv.config());

        let err = queue.submit(&Command::input_end()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthTokenMissing);

        let err = queue.submit(&Command::input_end()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthTokenMissing);

        assert_eq!(tv.accepted(), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(tv.nothing_received());
    }
}

//! Market-data stream (MDS) client: config loading, the outgoing command
//! queue, the subscription controller, and the WebSocket session driver.

pub mod config;
pub mod controller;
pub mod queue;
pub mod session;

pub use config::{ConfigError, MdsConfig, load_config};
pub use controller::SubscriptionController;
pub use session::{SessionError, run};

use tokio::sync::watch;

/// A handle to a running MDS client: drop it (or flip the shutdown flag)
/// to request a clean disconnect.
pub struct MdsClientHandle {
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl MdsClientHandle {
    /// Signal cooperative shutdown and wait for the session driver to
    /// finish unsubscribing and closing its socket.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the MDS session driver on the current Tokio runtime.
#[must_use]
pub fn spawn(config: MdsConfig) -> MdsClientHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(session::run(config, shutdown_rx));
    MdsClientHandle { shutdown_tx, task }
}

//! Order stack (OS) client: config loading, protocol event callbacks,
//! and the TCP connection driver.

pub mod config;
pub mod connection;
pub mod events;

pub use config::{ConfigError, OsConfig, load_config};
pub use connection::{ConnectionError, run};
pub use events::{Callback, CallbackRegistry, Notification};

use os_protocol::{BodyPayload, RequestEncoder, RequestEncoderConfig};
use tokio::sync::{mpsc, watch};

/// A handle to a running OS client: send outgoing payloads, or drop the
/// handle (after flipping shutdown) for a clean disconnect.
pub struct OsClientHandle {
    outgoing_tx: mpsc::Sender<BodyPayload>,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<Result<(), ConnectionError>>,
}

impl OsClientHandle {
    /// Queue a payload to be encoded and written to the socket.
    pub async fn send(&self, payload: BodyPayload) -> Result<(), mpsc::error::SendError<BodyPayload>> {
        self.outgoing_tx.send(payload).await
    }

    /// Signal cooperative shutdown and wait for the connection driver to
    /// finish.
    pub async fn shutdown(self) -> Result<(), ConnectionError> {
        let _ = self.shutdown_tx.send(true);
        self.task.await.unwrap_or(Ok(()))
    }
}

/// Spawn the OS connection driver on the current Tokio runtime.
#[must_use]
pub fn spawn(config: OsConfig, events: CallbackRegistry) -> OsClientHandle {
    let encoder = RequestEncoder::new(RequestEncoderConfig {
        virtual_punter_id: config.virtual_punter_id,
        virtual_punter_session_key: config.virtual_punter_session_key,
        source: String::new(),
        transport: "lwps1_tcp1".to_owned(),
        currency: config.currency.clone(),
        decimal_as_string: config.decimal_as_string,
        datetime_as_posix_seconds: config.datetime_as_timestamp,
    });

    let (outgoing_tx, outgoing_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(connection::run(
        config,
        encoder,
        outgoing_rx,
        events,
        shutdown_rx,
    ));

    OsClientHandle {
        outgoing_tx,
        shutdown_tx,
        task,
    }
}

//! The OS TCP connection driver (§4.8): resumable envelope framing over
//! a byte stream, the two-strike corrupt-frame policy, the heartbeat
//! task, and cooperative shutdown.
//!
//! Grounded in `services/receiver/src/session.rs`'s
//! `tokio::select! { biased; ... }` cooperative-shutdown shape, adapted
//! from a WebSocket text stream to a raw TCP byte stream with resumable
//! length-prefixed framing.

use std::time::Duration;

use chrono::Utc;
use os_protocol::{BodyPayload, CodecError, Envelope, RequestEncoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, error, warn};

use crate::config::OsConfig;
use crate::events::{CallbackRegistry, Notification};

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connect: {0}")]
    Connect(std::io::Error),
    #[error("read: {0}")]
    Read(std::io::Error),
    #[error("write: {0}")]
    Write(std::io::Error),
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("connection closed by peer")]
    Disconnected,
}

/// How many consecutive corrupt frames are tolerated before the buffered
/// bytes are dropped (§4.8 "two-strike policy"). A successful parse, or
/// a `Truncated` (partial-frame, not-an-error) result, does not count as
/// a strike.
const STRIKE_LIMIT: u32 = 2;

/// Drive one TCP connection until it closes, a protocol error occurs, or
/// `shutdown` fires. Envelopes to send arrive on `outgoing`; incoming
/// envelopes, and every other protocol event, are reported via `events`.
pub async fn run(
    config: OsConfig,
    encoder: RequestEncoder,
    mut outgoing: mpsc::Receiver<BodyPayload>,
    mut events: CallbackRegistry,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    let mut stream = TcpStream::connect(&config.server_addr)
        .await
        .map_err(ConnectionError::Connect)?;
    events.dispatch(&Notification::ConnectionMade);

    let result = drive(&config, &encoder, &mut stream, &mut outgoing, &mut events, &mut shutdown).await;
    events.dispatch(&Notification::ConnectionLost);
    result
}

async fn drive(
    config: &OsConfig,
    encoder: &RequestEncoder,
    stream: &mut TcpStream,
    outgoing: &mut mpsc::Receiver<BodyPayload>,
    events: &mut CallbackRegistry,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    let mut read_buf = vec![0_u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    let mut strikes: u32 = 0;
    let mut heartbeat = time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return Ok(());
                }
            }
            _ = heartbeat.tick() => {
                stream
                    .write_all(&RequestEncoder::keep_alive())
                    .await
                    .map_err(ConnectionError::Write)?;
            }
            payload = outgoing.recv() => {
                match payload {
                    None => return Ok(()),
                    Some(payload) => {
                        let envelope = encoder.encode(payload, Utc::now(), None);
                        let bytes = envelope.encode(encoder.currency());
                        stream.write_all(&bytes).await.map_err(ConnectionError::Write)?;
                        events.dispatch(&Notification::DataSent(envelope));
                    }
                }
            }
            read_result = stream.read(&mut read_buf) => {
                let n = read_result.map_err(ConnectionError::Read)?;
                if n == 0 {
                    return Err(ConnectionError::Disconnected);
                }
                pending.extend_from_slice(&read_buf[..n]);

                loop {
                    match Envelope::decode(&pending) {
                        Ok((envelope, rest)) => {
                            strikes = 0;
                            let consumed = pending.len() - rest.len();
                            events.dispatch(&Notification::DataReceived(envelope));
                            pending.drain(..consumed);
                            if pending.is_empty() {
                                break;
                            }
                        }
                        Err(CodecError::Truncated(_)) => {
                            // Partial frame: not an error, wait for more bytes.
                            break;
                        }
                        Err(CodecError::UnknownMessageType(kind)) => {
                            warn!(message_type = %kind, "unknown os message type, closing connection");
                            return Err(ConnectionError::UnknownMessageType(kind));
                        }
                        Err(err) => {
                            strikes += 1;
                            if strikes >= STRIKE_LIMIT {
                                error!(buffer_len = pending.len(), error = %err, "corrupt frame, dropping buffer");
                                pending.clear();
                                strikes = 0;
                            } else {
                                debug!(error = %err, "corrupt frame, awaiting more bytes before giving up");
                            }
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_limit_is_two() {
        assert_eq!(STRIKE_LIMIT, 2);
    }
}

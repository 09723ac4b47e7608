//! The MDS session driver (§4.4): WebSocket connect/reconnect with
//! backoff, the 200ms send tick, the ping loop, and cooperative shutdown.
//!
//! Grounded in the reference uplink/session drivers' shape
//! (`services/forwarder/src/uplink.rs`'s connect/send/recv split,
//! `services/receiver/src/session.rs`'s `tokio::select! { biased; ... }`
//! cooperative-shutdown loop) but built against the text-frame MDS wire
//! instead of JSON `WsMessage`s.

use std::collections::HashMap;
use std::time::Duration;

use bd_codes::MdsCommandId;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use md_protocol::{FrameKind, MdsIncoming, decode_frame, dispatch_frame};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::config::MdsConfig;
use crate::controller::SubscriptionController;
use crate::queue::TICK_DELAY;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect: {0}")]
    Connect(String),
    #[error("websocket: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("connection closed by peer")]
    Disconnected,
}

/// Fixed reconnect-delay schedules (§4.4 "Reconnect backoff"): the first
/// connection attempt ever uses a longer initial ramp; every later
/// reconnect uses a shorter ramp before settling at the steady-state
/// connection timeout.
struct Backoff {
    attempt: usize,
    ever_connected: bool,
}

const INITIAL_SCHEDULE: [Duration; 5] = [
    Duration::from_secs(5),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(60),
    Duration::from_secs(60),
];

const SUBSEQUENT_SCHEDULE: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(30),
    Duration::from_secs(60),
];

impl Backoff {
    const fn new() -> Self {
        Self {
            attempt: 0,
            ever_connected: false,
        }
    }

    fn mark_connected(&mut self) {
        self.ever_connected = true;
        self.attempt = 0;
    }

    fn next_delay(&mut self, connection_timeout: Duration) -> Duration {
        let schedule: &[Duration] = if self.ever_connected {
            &SUBSEQUENT_SCHEDULE
        } else {
            &INITIAL_SCHEDULE
        };
        let delay = schedule.get(self.attempt).copied().unwrap_or(connection_timeout);
        self.attempt += 1;
        delay
    }
}

/// Drive the MDS session until `shutdown` is signalled: connect, run the
/// subscription controller's send/receive loop, and reconnect with
/// backoff on every disconnect, until told to stop.
pub async fn run(config: MdsConfig, mut shutdown: watch::Receiver<bool>) {
    let mut backoff = Backoff::new();
    let mut controller = SubscriptionController::new(config.clone(), Instant::now());

    loop {
        if *shutdown.borrow() {
            return;
        }

        match connect_async(config.stream_url.as_str()).await {
            Ok((ws, _response)) => {
                info!(url = %config.stream_url, "mds session connected");
                backoff.mark_connected();
                controller.start();

                match run_session_loop(ws, &mut controller, &config, &mut shutdown).await {
                    Ok(()) => {
                        info!("mds session shut down cleanly");
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, "mds session dropped, reconnecting");
                    }
                }
                controller.reset_on_disconnect(Instant::now());
            }
            Err(err) => {
                warn!(error = %err, "mds connect failed");
            }
        }

        let delay = backoff.next_delay(config.connection_timeout);
        tokio::select! {
            biased;
            _ = shutdown.changed() => { if *shutdown.borrow() { return; } }
            () = time::sleep(delay) => {}
        }
    }
}

/// Run one connected session: drain the controller's outgoing queues on
/// a 200ms tick, send pings on `ping_frequency`, and dispatch incoming
/// frames to the controller, until the socket closes or shutdown fires.
async fn run_session_loop(
    mut ws: WsStream,
    controller: &mut SubscriptionController,
    config: &MdsConfig,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), SessionError> {
    let mut awaiting: HashMap<u32, MdsCommandId> = HashMap::new();
    let mut send_tick = time::interval(TICK_DELAY);
    let mut ping_tick = time::interval(config.ping_frequency);
    send_tick.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    ping_tick.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    // An empty id list asks the server to drop every
                    // subscription this session holds (§4.4 "Shutdown").
                    controller.enqueue_unsubscribe(Vec::new());
                    if let Some(cmd) = controller.next_to_send(Instant::now()) {
                        awaiting.insert(cmd.correlation_id(), cmd.command_id());
                        let _ = ws.send(Message::Text(cmd.encode().into())).await;
                    }
                    let _ = ws.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
            _ = ping_tick.tick() => {
                let cmd = controller.ping_command(Utc::now());
                awaiting.insert(cmd.correlation_id(), cmd.command_id());
                ws.send(Message::Text(cmd.encode().into())).await?;
            }
            _ = send_tick.tick() => {
                if controller.should_start_sweep() {
                    controller.sweep_classifiers();
                }
                while let Some(cmd) = controller.next_to_send(Instant::now()) {
                    awaiting.insert(cmd.correlation_id(), cmd.command_id());
                    ws.send(Message::Text(cmd.encode().into())).await?;
                }
            }
            msg = ws.next() => {
                match msg {
                    None => return Err(SessionError::Disconnected),
                    Some(Err(e)) => return Err(SessionError::Ws(e)),
                    Some(Ok(Message::Text(text))) => {
                        handle_incoming_text(&text, controller, &mut awaiting);
                    }
                    Some(Ok(Message::Close(_))) => return Err(SessionError::Disconnected),
                    Some(Ok(Message::Ping(data))) => { let _ = ws.send(Message::Pong(data)).await; }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

fn handle_incoming_text(
    text: &str,
    controller: &mut SubscriptionController,
    awaiting: &mut HashMap<u32, MdsCommandId>,
) {
    let frame = match decode_frame(text) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "failed to decode mds frame, dropping");
            return;
        }
    };

    let incoming = match dispatch_frame(&frame, |correlation_id| awaiting.get(&correlation_id).copied()) {
        Ok(incoming) => incoming,
        Err(err) => {
            warn!(error = %err, "failed to dispatch mds frame, dropping");
            return;
        }
    };

    if let MdsIncoming::Response(resp) = &incoming {
        awaiting.remove(&resp.correlation_id);
    }

    if let MdsIncoming::Topic {
        resolution,
        frame_kind: Some(FrameKind::Delete),
        ..
    } = &incoming
        && resolution.class == "Language4"
        && let Some(event_id) = resolution.keywords.event_classifier_id.event_id
    {
        controller.forget_event(event_id);
    }

    controller.handle_incoming(&incoming);
    debug!(?incoming, "mds frame dispatched");
}

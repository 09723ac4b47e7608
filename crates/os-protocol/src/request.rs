//! OS request encoder (§4.7).
//!
//! The reference implementation threads a "decimal as string" /
//! "datetime as POSIX seconds" presentation toggle through every
//! schema-level `Decimal`/`DateTime`/`MoneyAmount` at construction time,
//! since its host language has no static types to pick between at the
//! call site. In Rust the wire format is unaffected by either toggle —
//! only the *dynamic*-language caller's input shape would be — so this
//! port keeps the toggle as a recorded configuration value (for parity
//! with the environment-variable table) without threading it through
//! the builder API: callers simply pass native [`Decimal`]/
//! `DateTime<Utc>` values. See `DESIGN.md`.

use chrono::{DateTime, Duration, Utc};

use crate::body::BodyPayload;
use crate::envelope::{Envelope, EnvelopeHeader, MessageBody, MessageHeader, ProtocolHeader};

const INTERFACE: &str = "lightweightpriceserverexternal";
const FORMAT: &str = "binary";

/// Construction-time configuration for one deployed request encoder —
/// one currency, one punter identity, one transport string.
#[derive(Debug, Clone)]
pub struct RequestEncoderConfig {
    pub virtual_punter_id: i64,
    pub virtual_punter_session_key: i64,
    /// Defaults to the decimal string of `virtual_punter_id` when empty
    /// (§9 "Automatic `source` default").
    pub source: String,
    pub transport: String,
    pub currency: String,
    pub decimal_as_string: bool,
    pub datetime_as_posix_seconds: bool,
}

pub struct RequestEncoder {
    config: RequestEncoderConfig,
}

impl RequestEncoder {
    #[must_use]
    pub fn new(mut config: RequestEncoderConfig) -> Self {
        if config.source.is_empty() {
            config.source = config.virtual_punter_id.to_string();
        }
        Self { config }
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Build a complete envelope for `payload`. `now` is the command
    /// clock reading; `expire_at` defaults to `now + 1 hour` when absent
    /// (§4.7).
    #[must_use]
    pub fn encode(
        &self,
        payload: BodyPayload,
        now: DateTime<Utc>,
        expire_at: Option<DateTime<Utc>>,
    ) -> Envelope {
        Envelope {
            protocol_header: ProtocolHeader { version: 1 },
            envelope_header: EnvelopeHeader {
                version: 1,
                item_count: 2,
            },
            message_header: MessageHeader {
                version: 1,
                message_type: payload.wire_type().to_owned(),
                type_version: 1,
                format: FORMAT.to_owned(),
                source: self.config.source.clone(),
                transport: self.config.transport.clone(),
                priority: 3,
                interface: INTERFACE.to_owned(),
            },
            message_body: MessageBody {
                command_version: 1,
                command_time: Some(now),
                expire_at: Some(expire_at.unwrap_or_else(|| now + Duration::hours(1))),
                virtual_punter_id: self.config.virtual_punter_id,
                virtual_punter_session_key: self.config.virtual_punter_session_key,
                payload,
            },
        }
    }

    /// The bytes sent by the heartbeat task: a single `0x00` byte.
    #[must_use]
    pub fn keep_alive() -> [u8; 1] {
        [0x00]
    }
}

//! The four nested length-prefixed `BaseFrame`s of §4.6: `ProtocolHeader`,
//! `EnvelopeHeader`, `MessageHeader`, `MessageBody`.

use chrono::{DateTime, Utc};

use crate::body::BodyPayload;
use crate::datetime::{decode_datetime, encode_datetime};
use crate::primitive::{
    CodecError, decode_byte, decode_int, decode_length_value, decode_long, decode_reversed_int,
    decode_string, encode_byte, encode_int, encode_length_value, encode_long, encode_reversed_int,
    encode_string,
};

fn wrap(body: Vec<u8>) -> Vec<u8> {
    let mut out = encode_length_value(body.len() as u64);
    out.extend(body);
    out
}

fn unwrap(bytes: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let (len, rest) = decode_length_value(bytes)?;
    #[allow(clippy::cast_possible_truncation)]
    let len = len as usize;
    if rest.len() < len {
        return Err(CodecError::Truncated("length-prefixed block"));
    }
    Ok(rest.split_at(len))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    pub version: i8,
}

impl ProtocolHeader {
    pub fn encode(self) -> Vec<u8> {
        wrap(encode_byte(self.version).to_vec())
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (body, rest) = unwrap(bytes)?;
        let (version, _) = decode_byte(body)?;
        Ok((Self { version }, rest))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: i8,
    pub item_count: i8,
}

impl EnvelopeHeader {
    pub fn encode(self) -> Vec<u8> {
        let mut body = encode_byte(self.version).to_vec();
        body.extend(encode_byte(self.item_count));
        wrap(body)
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (body, rest) = unwrap(bytes)?;
        let (version, body) = decode_byte(body)?;
        let (item_count, _) = decode_byte(body)?;
        Ok((
            Self {
                version,
                item_count,
            },
            rest,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: i32,
    pub message_type: String,
    pub type_version: i32,
    pub format: String,
    pub source: String,
    pub transport: String,
    pub priority: i32,
    pub interface: String,
}

impl MessageHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut body = encode_reversed_int(self.version).to_vec();
        body.extend(encode_string(&self.message_type));
        body.extend(encode_int(self.type_version));
        body.extend(encode_string(&self.format));
        body.extend(encode_string(&self.source));
        body.extend(encode_string(&self.transport));
        body.extend(encode_int(self.priority));
        body.extend(encode_string(&self.interface));
        wrap(body)
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (body, rest) = unwrap(bytes)?;
        let (version, body) = decode_reversed_int(body)?;
        let (message_type, body) = decode_string(body)?;
        let (type_version, body) = decode_int(body)?;
        let (format, body) = decode_string(body)?;
        let (source, body) = decode_string(body)?;
        let (transport, body) = decode_string(body)?;
        let (priority, body) = decode_int(body)?;
        let (interface, _) = decode_string(body)?;
        Ok((
            Self {
                version,
                message_type,
                type_version,
                format,
                source,
                transport,
                priority,
                interface,
            },
            rest,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageBody {
    pub command_version: i32,
    pub command_time: Option<DateTime<Utc>>,
    pub expire_at: Option<DateTime<Utc>>,
    pub virtual_punter_id: i64,
    pub virtual_punter_session_key: i64,
    pub payload: BodyPayload,
}

impl MessageBody {
    pub fn encode(&self, currency: &str) -> Vec<u8> {
        let mut body = encode_int(self.command_version).to_vec();
        body.extend(encode_datetime(self.command_time));
        body.extend(encode_datetime(self.expire_at));
        body.extend(encode_long(self.virtual_punter_id));
        body.extend(encode_long(self.virtual_punter_session_key));
        body.extend(self.payload.encode(currency));
        wrap(body)
    }

    pub fn decode<'a>(
        bytes: &'a [u8],
        message_type: &str,
    ) -> Result<(Self, &'a [u8]), CodecError> {
        let (body, rest) = unwrap(bytes)?;
        let (command_version, body) = decode_int(body)?;
        let (command_time, body) = decode_datetime(body)?;
        let (expire_at, body) = decode_datetime(body)?;
        let (virtual_punter_id, body) = decode_long(body)?;
        let (virtual_punter_session_key, body) = decode_long(body)?;
        let (payload, _) = BodyPayload::decode(message_type, body)?;
        Ok((
            Self {
                command_version,
                command_time,
                expire_at,
                virtual_punter_id,
                virtual_punter_session_key,
                payload,
            },
            rest,
        ))
    }
}

/// A complete envelope: all four nested frames, decoded in sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub protocol_header: ProtocolHeader,
    pub envelope_header: EnvelopeHeader,
    pub message_header: MessageHeader,
    pub message_body: MessageBody,
}

impl Envelope {
    pub fn encode(&self, currency: &str) -> Vec<u8> {
        let mut out = self.protocol_header.encode();
        out.extend(self.envelope_header.encode());
        out.extend(self.message_header.encode());
        out.extend(self.message_body.encode(currency));
        out
    }

    /// Decode one complete envelope from the front of `bytes`, returning
    /// it along with any trailing (unconsumed) bytes.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let (protocol_header, rest) = ProtocolHeader::decode(bytes)?;
        let (envelope_header, rest) = EnvelopeHeader::decode(rest)?;
        let (message_header, rest) = MessageHeader::decode(rest)?;
        let (message_body, rest) = MessageBody::decode(rest, &message_header.message_type)?;
        Ok((
            Self {
                protocol_header,
                envelope_header,
                message_header,
                message_body,
            },
            rest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::LightWeightPriceToAdd;
    use crate::decimal::Decimal;
    use chrono::TimeZone;

    #[test]
    fn add_lightweight_price_envelope_round_trip_scenario() {
        let expire_at = Utc.with_ymd_and_hms(2007, 6, 13, 6, 46, 42).unwrap();
        let envelope = Envelope {
            protocol_header: ProtocolHeader { version: 1 },
            envelope_header: EnvelopeHeader {
                version: 1,
                item_count: 2,
            },
            message_header: MessageHeader {
                version: 1,
                message_type: "addLightweightPrices".to_owned(),
                type_version: 1,
                format: "binary".to_owned(),
                source: "3233".to_owned(),
                transport: "lwps1_tcp1".to_owned(),
                priority: 3,
                interface: "lightweightpriceserverexternal".to_owned(),
            },
            message_body: MessageBody {
                command_version: 1,
                command_time: Some(expire_at),
                expire_at: Some(expire_at),
                virtual_punter_id: 3233,
                virtual_punter_session_key: 1,
                payload: BodyPayload::AddLightweightPrices {
                    prices: vec![LightWeightPriceToAdd {
                        selection_id: 1_807_723,
                        market_id: 338_396,
                        polarity: 1,
                        odds: Decimal::parse("3").unwrap(),
                        delta_stake: Decimal::parse("3").unwrap(),
                        expire_price_at: Some(expire_at),
                        expected_selection_reset_count: 0,
                        expected_withdrawal_sequence_number: 0,
                        punter_reference_number: 1,
                    }],
                },
            },
        };

        let bytes = envelope.encode("GBP");
        let (decoded, rest) = Envelope::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn envelope_length_prefixes_consume_exactly_the_encoded_bytes() {
        let header = MessageHeader {
            version: 1,
            message_type: "ping".to_owned(),
            type_version: 1,
            format: "binary".to_owned(),
            source: "1".to_owned(),
            transport: "lwps_tcp1".to_owned(),
            priority: 3,
            interface: "lightweightpriceserverexternal".to_owned(),
        };
        let encoded = header.encode();
        let (_, rest) = MessageHeader::decode(&encoded).unwrap();
        assert!(rest.is_empty());
    }
}

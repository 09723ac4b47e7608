//! Binary wire protocol for the order stack: primitive codecs, the
//! `Decimal`/`DateTime`/`MoneyAmount` composite types, the four-level
//! envelope codec, message body layouts, and the request encoder.

pub mod body;
pub mod datetime;
pub mod decimal;
pub mod envelope;
pub mod money;
pub mod primitive;
pub mod request;

pub use body::BodyPayload;
pub use decimal::Decimal;
pub use envelope::{Envelope, EnvelopeHeader, MessageBody, MessageHeader, ProtocolHeader};
pub use primitive::CodecError;
pub use request::{RequestEncoder, RequestEncoderConfig};

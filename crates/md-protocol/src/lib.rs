//! Text-frame wire protocol for the market-data stack: framing, the
//! declarative field-table schema layer, command encoding, response
//! decoding, and the topic-name resolver.

pub mod commands;
pub mod error;
pub mod frame;
pub mod responses;
pub mod schema;
pub mod topic;
pub mod value;

pub use commands::MdsCommand;
pub use error::{FieldError, FrameError};
pub use frame::{FrameKind, RawFrame, decode_frame};
pub use responses::{MdsResponse, ResponseError, decode_response};
pub use topic::{TopicKeywords, TopicResolution, resolve_topic_path};
pub use value::{FieldValue, RawNode};

use bd_codes::MdsCommandId;

/// What a decoded frame turned out to be, per §4.1's dispatch rule: the
/// message identifier disambiguates a command response from a topic
/// message.
#[derive(Debug, Clone, PartialEq)]
pub enum MdsIncoming {
    Response(MdsResponse),
    Topic {
        resolution: TopicResolution,
        frame_kind: Option<FrameKind>,
        fields: std::collections::BTreeMap<&'static str, FieldValue>,
    },
}

/// Dispatch a raw, already-delimiter-decoded frame to either response or
/// topic handling.
///
/// `awaiting` resolves a correlation id to the command it answers, since
/// the wire frame alone does not carry the original command kind.
pub fn dispatch_frame(
    frame: &RawFrame,
    awaiting: impl Fn(u32) -> Option<MdsCommandId>,
) -> Result<MdsIncoming, FrameError> {
    if let Some(message_id) = frame.message_id() {
        if message_id != 0
            && let Some(correlation_id) = frame.body.get(&0).and_then(RawNode::as_leaf)
            && let Ok(correlation_id) = correlation_id.parse::<u32>()
            && let Some(command_id) = awaiting(correlation_id)
        {
            let resp = decode_response(command_id, frame)
                .map_err(|_| FrameError::MalformedKey("response".to_owned()))?;
            return Ok(MdsIncoming::Response(resp));
        }
    }

    let topic_name = frame
        .topic_name()
        .ok_or(FrameError::MissingBlockDelimiter)?;
    let resolution = resolve_topic_path(topic_name)?;
    let schema = schema::schema_for_topic_class(resolution.class);
    let fields = schema::decode_body(&schema, &frame.body);
    Ok(MdsIncoming::Topic {
        resolution,
        frame_kind: frame.message_type().and_then(FrameKind::from_wire_char),
        fields,
    })
}

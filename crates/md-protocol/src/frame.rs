//! Text-frame codec: framing with the two sentinel bytes and the
//! recursive "order / V-index / suffix" body-key grammar (§4.1).

use std::collections::BTreeMap;

use crate::error::FrameError;
use crate::value::RawNode;

/// Non-printable frame delimiter separating a block (header segment or
/// body key=value pair) from the next one.
pub const BLOCK_DELIMITER: char = '\u{0001}';
/// Non-printable delimiter separating a key from its value, and the
/// header segments from each other.
pub const VALUE_DELIMITER: char = '\u{0002}';
/// Delimiter joining elements of a delimited-list field rendering.
pub const LIST_DELIMITER: char = '~';

/// Header message-type marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    TopicLoad,
    Delete,
    Delta,
}

impl FrameKind {
    #[must_use]
    pub const fn from_wire_char(c: char) -> Option<Self> {
        Some(match c {
            'T' => Self::TopicLoad,
            'X' => Self::Delete,
            'F' => Self::Delta,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn wire_char(self) -> char {
        match self {
            Self::TopicLoad => 'T',
            Self::Delete => 'X',
            Self::Delta => 'F',
        }
    }
}

/// A raw decoded frame: ordered header segments and an order-keyed body.
///
/// This is the pre-schema representation; callers interpret `body`
/// against a [`crate::schema::MessageSchema`] to get typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    pub headers: Vec<String>,
    pub body: BTreeMap<u32, RawNode>,
}

impl RawFrame {
    /// The topic name / response prefix, always the first header segment.
    #[must_use]
    pub fn topic_name(&self) -> Option<&str> {
        self.headers.first().map(String::as_str)
    }

    /// The numeric message identifier (second header segment), if present
    /// and non-empty.
    #[must_use]
    pub fn message_id(&self) -> Option<u32> {
        self.headers.get(1).and_then(|s| {
            if s.is_empty() {
                None
            } else {
                s.parse().ok()
            }
        })
    }

    /// The frame kind (third header segment).
    #[must_use]
    pub fn message_type(&self) -> Option<char> {
        self.headers.get(2).and_then(|s| s.chars().next())
    }
}

/// Decode one complete frame (delimiters already stripped of any
/// surrounding framing the transport applied).
pub fn decode_frame(text: &str) -> Result<RawFrame, FrameError> {
    let (head, body) = text
        .split_once(BLOCK_DELIMITER)
        .ok_or(FrameError::MissingBlockDelimiter)?;

    let headers: Vec<String> = head.split(VALUE_DELIMITER).map(str::to_owned).collect();

    let mut raw_body: BTreeMap<u32, RawNode> = BTreeMap::new();
    for block in body.split(BLOCK_DELIMITER) {
        if block.is_empty() {
            continue;
        }
        let (key, value) = block
            .split_once(VALUE_DELIMITER)
            .ok_or_else(|| FrameError::MalformedKey(block.to_owned()))?;
        insert_keyed(&mut raw_body, key, value)?;
    }

    Ok(RawFrame {
        headers,
        body: raw_body,
    })
}

/// Insert one `(key, value)` body pair into `root`, recursing through the
/// `NVk-S` grammar for nested-group keys.
///
/// A key is split on the first literal `V` into `(order, rest)`; if
/// `rest` is empty, the key addressed a plain leaf at `order`. Otherwise
/// `rest` is split on the first literal `-` into `(index, suffix)`: a
/// 1-based slot is ensured in the list at `order`, and `suffix` is
/// recursively inserted into that slot's map.
fn insert_keyed(
    root: &mut BTreeMap<u32, RawNode>,
    key: &str,
    value: &str,
) -> Result<(), FrameError> {
    match key.split_once('V') {
        None => {
            let order: u32 = key
                .parse()
                .map_err(|_| FrameError::NonIntegerOrder(key.to_owned()))?;
            root.insert(order, RawNode::Leaf(value.to_owned()));
            Ok(())
        }
        Some((order_str, rest)) => {
            let order: u32 = order_str
                .parse()
                .map_err(|_| FrameError::NonIntegerOrder(order_str.to_owned()))?;
            let (index_str, suffix) = rest
                .split_once('-')
                .ok_or_else(|| FrameError::MalformedKey(key.to_owned()))?;
            let index: usize = index_str
                .parse()
                .map_err(|_| FrameError::MalformedKey(key.to_owned()))?;
            if index == 0 {
                return Err(FrameError::MalformedKey(key.to_owned()));
            }

            let list = match root.entry(order).or_insert_with(|| RawNode::List(Vec::new())) {
                RawNode::List(l) => l,
                RawNode::Leaf(_) => return Err(FrameError::MalformedKey(key.to_owned())),
            };
            while list.len() < index {
                list.push(BTreeMap::new());
            }
            insert_keyed(&mut list[index - 1], suffix, value)
        }
    }
}

/// Render one header/value pair as it appears on the wire: the field's
/// order number, the value delimiter, the rendering, then the block
/// delimiter. Absent values are omitted by the caller before reaching
/// this function.
#[must_use]
pub fn render_field(order: u32, rendering: &str) -> String {
    format!("{order}{VALUE_DELIMITER}{rendering}{BLOCK_DELIMITER}")
}

/// Encode a command frame head: `VALUE command_id BLOCK`.
#[must_use]
pub fn encode_command_head(command_id: u32) -> String {
    format!("{VALUE_DELIMITER}{command_id}{BLOCK_DELIMITER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_unsubscribe_response() {
        let text = "AAPI/6/D\u{2}20\u{2}F\u{1}0\u{2}1984840034\u{1}1\u{2}0\u{1}3\u{2}2~3\u{1}";
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.topic_name(), Some("AAPI/6/D"));
        assert_eq!(frame.message_id(), Some(20));
        assert_eq!(frame.message_type(), Some('F'));
        assert_eq!(
            frame.body.get(&0).and_then(RawNode::as_leaf),
            Some("1984840034")
        );
        assert_eq!(frame.body.get(&1).and_then(RawNode::as_leaf), Some("0"));
        assert_eq!(frame.body.get(&3).and_then(RawNode::as_leaf), Some("2~3"));
    }

    #[test]
    fn decode_event_topic() {
        let text = "AAPI/6/E/E_1/E/E_100003\u{2}\u{2}T\u{1}1\u{2}1\u{1}";
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.topic_name(), Some("AAPI/6/E/E_1/E/E_100003"));
        assert_eq!(frame.message_id(), None);
        assert_eq!(frame.message_type(), Some('T'));
        assert_eq!(frame.body.get(&1).and_then(RawNode::as_leaf), Some("1"));
    }

    #[test]
    fn decode_nested_group_key() {
        // "2V1-0" => data[2][0][0] = "x" ; "2V2-0" => data[2][1][0] = "y"
        let text = format!(
            "T\u{1}2V1-0\u{2}x\u{1}2V2-0\u{2}y\u{1}",
        );
        let frame = decode_frame(&text).unwrap();
        let list = frame.body.get(&2).and_then(RawNode::as_list).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].get(&0).and_then(RawNode::as_leaf), Some("x"));
        assert_eq!(list[1].get(&0).and_then(RawNode::as_leaf), Some("y"));
    }

    #[test]
    fn malformed_key_is_an_error_not_a_panic() {
        let text = "T\u{1}abc\u{2}x\u{1}";
        assert!(matches!(
            decode_frame(text),
            Err(FrameError::NonIntegerOrder(_))
        ));
    }

    #[test]
    fn empty_body_blocks_are_skipped() {
        let text = "T\u{1}\u{1}0\u{2}1\u{1}";
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.body.len(), 1);
    }
}

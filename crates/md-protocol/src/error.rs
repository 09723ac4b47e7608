use thiserror::Error;

/// Errors from the market-data text-frame codec and schema layer.
///
/// Per the frame parser's error policy, most of these are recovered from
/// by the caller (drop-and-continue); they are typed so call sites can
/// log them with the right severity rather than so callers must always
/// propagate them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has no head/body delimiter")]
    MissingBlockDelimiter,
    #[error("malformed body key: {0:?}")]
    MalformedKey(String),
    #[error("non-integer field order in key: {0:?}")]
    NonIntegerOrder(String),
    #[error("unknown topic path segment at {0:?}")]
    UnknownTopicSegment(String),
}

/// Field-level decode failure. Per §7, a field decode error does not fail
/// the whole frame: the field is set to its default (usually absent) and
/// decoding continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field {order} required but missing")]
    MissingRequired { order: u32 },
    #[error("field {order} could not be parsed as {expected}: {value:?}")]
    Unparseable {
        order: u32,
        expected: &'static str,
        value: String,
    },
}

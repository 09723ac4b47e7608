//! Binary primitive codecs for the order stack (§4.5).
//!
//! Every codec here follows the same shape as the reference
//! implementation's `dumps`/`loads` pair: encode appends bytes, decode
//! consumes a prefix of the input and returns what remains.

use bd_varint::{VarIntError, decode_length, decode_string_len, encode_length, encode_string_len};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("ran out of bytes decoding {0}")]
    Truncated(&'static str),
    #[error("invalid UTF-8 in String field")]
    InvalidUtf8,
    #[error("decimal scale {0} exceeds the maximum of 28")]
    ScaleOutOfRange(u8),
    #[error("unknown message body type {0:?}")]
    UnknownMessageType(String),
    #[error(transparent)]
    VarInt(#[from] VarIntError),
}

pub fn encode_byte(v: i8) -> [u8; 1] {
    v.to_le_bytes()
}

pub fn decode_byte(bytes: &[u8]) -> Result<(i8, &[u8]), CodecError> {
    let (head, rest) = split(bytes, 1, "Byte")?;
    Ok((head[0] as i8, rest))
}

pub fn encode_int(v: i32) -> [u8; 4] {
    v.to_le_bytes()
}

pub fn decode_int(bytes: &[u8]) -> Result<(i32, &[u8]), CodecError> {
    let (head, rest) = split(bytes, 4, "Int")?;
    Ok((i32::from_le_bytes(head.try_into().unwrap()), rest))
}

pub fn encode_reversed_int(v: i32) -> [u8; 4] {
    v.to_be_bytes()
}

pub fn decode_reversed_int(bytes: &[u8]) -> Result<(i32, &[u8]), CodecError> {
    let (head, rest) = split(bytes, 4, "ReversedInt")?;
    Ok((i32::from_be_bytes(head.try_into().unwrap()), rest))
}

pub fn encode_long(v: i64) -> [u8; 8] {
    v.to_le_bytes()
}

pub fn decode_long(bytes: &[u8]) -> Result<(i64, &[u8]), CodecError> {
    let (head, rest) = split(bytes, 8, "Long")?;
    Ok((i64::from_le_bytes(head.try_into().unwrap()), rest))
}

/// `Length`: a variable-length size prefix, MSB-group-first (§4.5, §9
/// "String length-prefix encoding vs. Length codec").
pub fn encode_length_value(v: u64) -> Vec<u8> {
    encode_length(v)
}

pub fn decode_length_value(bytes: &[u8]) -> Result<(u64, &[u8]), CodecError> {
    Ok(decode_length(bytes)?)
}

/// `String`: a `String`-flavoured length prefix (LSB-group-first,
/// distinct from `Length`) followed by UTF-8 bytes. Empty string is a
/// single `0x00` byte.
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut out = encode_string_len(s.len() as u64);
    out.extend_from_slice(s.as_bytes());
    out
}

pub fn decode_string(bytes: &[u8]) -> Result<(String, &[u8]), CodecError> {
    let (len, rest) = decode_string_len(bytes)?;
    #[allow(clippy::cast_possible_truncation)]
    let len = len as usize;
    let (head, tail) = split(rest, len, "String")?;
    let s = std::str::from_utf8(head)
        .map_err(|_| CodecError::InvalidUtf8)?
        .to_owned();
    Ok((s, tail))
}

/// `Optional<T>`: presence byte then `T` if present.
pub fn encode_optional<T>(value: Option<&T>, encode_inner: impl FnOnce(&T) -> Vec<u8>) -> Vec<u8> {
    match value {
        None => vec![0x00],
        Some(v) => {
            let mut out = vec![0x01];
            out.extend(encode_inner(v));
            out
        }
    }
}

pub fn decode_optional<'a, T>(
    bytes: &'a [u8],
    decode_inner: impl FnOnce(&'a [u8]) -> Result<(T, &'a [u8]), CodecError>,
) -> Result<(Option<T>, &'a [u8]), CodecError> {
    let (flag, rest) = split(bytes, 1, "Optional flag")?;
    match flag[0] {
        0x00 => Ok((None, rest)),
        _ => {
            let (v, rest) = decode_inner(rest)?;
            Ok((Some(v), rest))
        }
    }
}

/// `Array<T>`: a `Length` count followed by that many `T`s.
pub fn encode_array<T>(items: &[T], mut encode_item: impl FnMut(&T) -> Vec<u8>) -> Vec<u8> {
    let mut out = encode_length_value(items.len() as u64);
    for item in items {
        out.extend(encode_item(item));
    }
    out
}

pub fn decode_array<'a, T>(
    bytes: &'a [u8],
    mut decode_item: impl FnMut(&'a [u8]) -> Result<(T, &'a [u8]), CodecError>,
) -> Result<(Vec<T>, &'a [u8]), CodecError> {
    let (count, mut rest) = decode_length_value(bytes)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (item, tail) = decode_item(rest)?;
        out.push(item);
        rest = tail;
    }
    Ok((out, rest))
}

fn split(bytes: &[u8], n: usize, what: &'static str) -> Result<(&[u8], &[u8]), CodecError> {
    if bytes.len() < n {
        return Err(CodecError::Truncated(what));
    }
    Ok(bytes.split_at(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trip_vectors() {
        assert_eq!(encode_int(-2_147_483_648), [0x00, 0x00, 0x00, 0x80]);
        assert_eq!(encode_int(1_234_567_890), [0xd2, 0x02, 0x96, 0x49]);
        let (v, rest) = decode_int(&[0x00, 0x00, 0x00, 0x80]).unwrap();
        assert_eq!(v, -2_147_483_648);
        assert!(rest.is_empty());
    }

    #[test]
    fn length_round_trip_vectors() {
        for &(value, bytes) in &[(123_456u64, &[0x87u8, 0xc4, 0x40][..]), (255, &[0x81, 0x7f]), (1234, &[0x89, 0x52])]
        {
            assert_eq!(encode_length_value(value), bytes);
            assert_eq!(decode_length_value(bytes).unwrap().0, value);
        }
    }

    #[test]
    fn string_length_prefix_vectors() {
        assert_eq!(encode_string("").as_slice(), &[0x00]);
        let (s, rest) = decode_string(&[0x00]).unwrap();
        assert_eq!(s, "");
        assert!(rest.is_empty());
    }

    #[test]
    fn string_length_prefix_distinguishes_from_length_codec() {
        let long = "x".repeat(1234);
        let encoded = encode_string(&long);
        assert_eq!(&encoded[..2], &[0xd2, 0x09]);
    }

    #[test]
    fn optional_round_trips_absent_and_present() {
        let absent = encode_optional::<i32>(None, |v| encode_int(*v).to_vec());
        assert_eq!(absent, vec![0x00]);
        let (v, rest) = decode_optional(&absent, |b| decode_int(b)).unwrap();
        assert_eq!(v, None);
        assert!(rest.is_empty());

        let present = encode_optional(Some(&42i32), |v| encode_int(*v).to_vec());
        let (v, rest) = decode_optional(&present, |b| decode_int(b)).unwrap();
        assert_eq!(v, Some(42));
        assert!(rest.is_empty());
    }

    #[test]
    fn array_round_trips() {
        let items = vec![1i64, 2, 3];
        let bytes = encode_array(&items, |v| encode_long(*v).to_vec());
        let (decoded, rest) = decode_array(&bytes, |b| decode_long(b)).unwrap();
        assert_eq!(decoded, items);
        assert!(rest.is_empty());
    }
}

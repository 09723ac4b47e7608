//! The order stack's 128-bit .NET-layout `Decimal` (§3, §4.5, §9 "Decimal
//! 96-bit magnitude masking").
//!
//! The 96-bit unsigned magnitude is carried as `low: u64` (bits 0..64)
//! and `mid: u32` (bits 64..96), with no separate "high" word and no bit
//! dropped from `low` — the reference implementation masks `low` to 63
//! bits before packing it, which silently corrupts any magnitude with
//! bit 63 set; this port does not replicate that defect.

use crate::primitive::CodecError;

pub const MAX_SCALE: u8 = 28;

/// A `Decimal`: an unsigned magnitude, a sign, and a base-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    negative: bool,
    magnitude: u128,
    scale: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecimalParseError {
    #[error("empty decimal string")]
    Empty,
    #[error("decimal string has non-digit characters: {0:?}")]
    NotDigits(String),
    #[error("decimal scale {0} exceeds the maximum of {max}", max = MAX_SCALE)]
    ScaleOutOfRange(usize),
    #[error("decimal magnitude does not fit in 96 bits")]
    MagnitudeOverflow,
}

impl Decimal {
    pub fn from_parts(negative: bool, magnitude: u128, scale: u8) -> Result<Self, CodecError> {
        if scale > MAX_SCALE {
            return Err(CodecError::ScaleOutOfRange(scale));
        }
        if magnitude >> 96 != 0 {
            return Err(CodecError::ScaleOutOfRange(scale));
        }
        Ok(Self {
            negative,
            magnitude,
            scale,
        })
    }

    /// Parse a decimal literal such as `"1234567890.123456789012345678"`
    /// or `"-1.0"`.
    pub fn parse(s: &str) -> Result<Self, DecimalParseError> {
        if s.is_empty() {
            return Err(DecimalParseError::Empty);
        }
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(DecimalParseError::NotDigits(s.to_owned()));
        }
        if frac_part.len() > usize::from(MAX_SCALE) {
            return Err(DecimalParseError::ScaleOutOfRange(frac_part.len()));
        }
        let scale = frac_part.len() as u8;
        let digits = format!("{int_part}{frac_part}");
        let digits = digits.trim_start_matches('0');
        let magnitude: u128 = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|_| DecimalParseError::MagnitudeOverflow)?
        };
        if magnitude >> 96 != 0 {
            return Err(DecimalParseError::MagnitudeOverflow);
        }
        Ok(Self {
            negative,
            magnitude,
            scale,
        })
    }

    #[must_use]
    pub fn render(&self) -> String {
        let digits = self.magnitude.to_string();
        let scale = usize::from(self.scale);
        let body = if scale == 0 {
            digits
        } else {
            let padded = if digits.len() <= scale {
                format!("{digits:0>width$}", width = scale + 1)
            } else {
                digits
            };
            let split_at = padded.len() - scale;
            format!("{}.{}", &padded[..split_at], &padded[split_at..])
        };
        if self.negative && self.magnitude != 0 {
            format!("-{body}")
        } else {
            body
        }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    #[must_use]
    pub fn magnitude(&self) -> u128 {
        self.magnitude
    }

    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }
}

pub fn encode_decimal(value: &Decimal) -> [u8; 16] {
    let low = (value.magnitude & u128::from(u64::MAX)) as u64;
    let mid = ((value.magnitude >> 64) & u128::from(u32::MAX)) as u32;
    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&low.to_le_bytes());
    out[8..12].copy_from_slice(&mid.to_le_bytes());
    out[12..14].copy_from_slice(&[0, 0]);
    out[14] = value.scale;
    out[15] = if value.negative { 0x80 } else { 0x00 };
    out
}

pub fn decode_decimal(bytes: &[u8]) -> Result<(Decimal, &[u8]), CodecError> {
    if bytes.len() < 16 {
        return Err(CodecError::Truncated("Decimal"));
    }
    let (head, rest) = bytes.split_at(16);
    let low = u64::from_le_bytes(head[0..8].try_into().unwrap());
    let mid = u32::from_le_bytes(head[8..12].try_into().unwrap());
    let scale = head[14];
    let negative = head[15] & 0x80 != 0;
    if scale > MAX_SCALE {
        return Err(CodecError::ScaleOutOfRange(scale));
    }
    let magnitude = u128::from(low) | (u128::from(mid) << 64);
    let decimal = Decimal {
        negative,
        magnitude,
        scale,
    };
    Ok((decimal, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_round_trip() {
        let one = Decimal::parse("1").unwrap();
        let mut expected = [0u8; 16];
        expected[0] = 0x01;
        assert_eq!(encode_decimal(&one), expected);

        let one_point_zero = Decimal::parse("1.0").unwrap();
        let mut expected = [0u8; 16];
        expected[0] = 0x0a;
        expected[14] = 0x01;
        assert_eq!(encode_decimal(&one_point_zero), expected);
        assert_eq!(one_point_zero.render(), "1.0");

        let neg = Decimal::parse("-1.0").unwrap();
        let mut expected_neg = expected;
        expected_neg[15] = 0x80;
        assert_eq!(encode_decimal(&neg), expected_neg);
        assert_eq!(neg.render(), "-1.0");
    }

    #[test]
    fn large_magnitude_scenario() {
        let value = Decimal::parse("1234567890.123456789012345678").unwrap();
        let bytes = encode_decimal(&value);
        let expected: [u8; 16] = [
            0x4e, 0xf3, 0x38, 0xbe, 0x91, 0x7a, 0x79, 0x6d, 0xeb, 0x35, 0xfd, 0x03, 0x00, 0x00,
            0x12, 0x00,
        ];
        assert_eq!(bytes, expected);
        let (decoded, rest) = decode_decimal(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded.render(), "1234567890.123456789012345678");
    }

    #[test]
    fn same_magnitude_scale_zero() {
        let value = Decimal::parse("1234567890123456789012345678").unwrap();
        let bytes = encode_decimal(&value);
        let expected: [u8; 16] = [
            0x4e, 0xf3, 0x38, 0xbe, 0x91, 0x7a, 0x79, 0x6d, 0xeb, 0x35, 0xfd, 0x03, 0x00, 0x00,
            0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn round_trips_bit_63_of_low_without_truncation() {
        let magnitude = 1u128 << 63;
        let value = Decimal::from_parts(false, magnitude, 0).unwrap();
        let (decoded, _) = decode_decimal(&encode_decimal(&value)).unwrap();
        assert_eq!(decoded.magnitude(), magnitude);
    }
}

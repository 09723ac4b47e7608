//! `MoneyAmount` (§4.5, §9 "MoneyAmount currency parameter"): a `Decimal`
//! followed by a currency code `String`. The reference implementation
//! fixes the currency at encoder-construction time rather than per call;
//! on decode the currency is consumed off the wire but not returned,
//! matching `MoneyAmount.loads` in the reference implementation.

use crate::decimal::{Decimal, decode_decimal, encode_decimal};
use crate::primitive::{CodecError, decode_string, encode_string};

pub fn encode_money_amount(amount: &Decimal, currency: &str) -> Vec<u8> {
    let mut out = encode_decimal(amount).to_vec();
    out.extend(encode_string(currency));
    out
}

pub fn decode_money_amount(bytes: &[u8]) -> Result<(Decimal, &[u8]), CodecError> {
    let (amount, rest) = decode_decimal(bytes)?;
    let (_currency, rest) = decode_string(rest)?;
    Ok((amount, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_amount_round_trip_scenario() {
        let amount = Decimal::parse("3").unwrap();
        let bytes = encode_money_amount(&amount, "EUR");
        let mut expected = vec![0x03];
        expected.extend(std::iter::repeat(0).take(15));
        expected.push(0x03);
        expected.extend(b"EUR");
        assert_eq!(bytes, expected);

        let (decoded_amount, rest) = decode_money_amount(&bytes).unwrap();
        assert_eq!(decoded_amount.render(), "3");
        assert!(rest.is_empty());
    }
}

//! Message body layouts (§4.6) and their nested item types.
//!
//! Every body shares the five common fields, then appends kind-specific
//! fields. `Polarity` here is the raw wire `Int` (0 Against, 1 For), not
//! the unrelated display-concern `Polarity` enum in `bd-codes` — see §9
//! "Polarity wire encoding".

use bd_codes::LwpActionType;
use chrono::{DateTime, Utc};

use crate::datetime::{decode_datetime, encode_datetime};
use crate::decimal::{Decimal, decode_decimal, encode_decimal};
use crate::money::{decode_money_amount, encode_money_amount};
use crate::primitive::{
    CodecError, decode_array, decode_int, decode_long, decode_optional, encode_array, encode_int,
    encode_long, encode_optional,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LightWeightPriceToAdd {
    pub selection_id: i64,
    pub market_id: i64,
    pub polarity: i32,
    pub odds: Decimal,
    pub delta_stake: Decimal,
    pub expire_price_at: Option<DateTime<Utc>>,
    pub expected_selection_reset_count: i32,
    pub expected_withdrawal_sequence_number: i32,
    pub punter_reference_number: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightWeightPriceToCancel {
    pub selection_id: i64,
    pub polarity: i32,
    pub odds: Decimal,
    pub punter_reference_number: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightWeightPriceNotification {
    pub market_id: i64,
    pub selection_id: i64,
    pub polarity: i32,
    pub odds: Decimal,
    pub punter_reference_number: i64,
    pub expire_at: Option<DateTime<Utc>>,
    pub expected_selection_reset_count: i32,
    pub expected_withdrawal_sequence_number: i32,
    pub remaining_stake: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightWeightPriceChangeNotification {
    pub market_id: i64,
    pub selection_id: i64,
    pub polarity: i32,
    pub odds: Decimal,
    pub punter_reference_number: i64,
    pub expire_at: Option<DateTime<Utc>>,
    pub expected_selection_reset_count: i32,
    pub expected_withdrawal_sequence_number: i32,
    pub lwp_action_type: LwpActionType,
    pub remaining_stake: Decimal,
    pub matched_stake: Option<Decimal>,
    pub order_id: Option<i64>,
    pub matched_against_side_stake: Option<Decimal>,
}

fn encode_polarity_triplet(selection_id: i64, market_or_none: Option<i64>, polarity: i32) -> Vec<u8> {
    let mut out = encode_long(selection_id).to_vec();
    if let Some(market_id) = market_or_none {
        out.extend(encode_long(market_id));
    }
    out.extend(encode_int(polarity));
    out
}

pub fn encode_lwp_to_add(item: &LightWeightPriceToAdd, currency: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(encode_long(item.selection_id));
    out.extend(encode_long(item.market_id));
    out.extend(encode_int(item.polarity));
    out.extend(encode_decimal(&item.odds));
    out.extend(encode_money_amount(&item.delta_stake, currency));
    out.extend(encode_datetime(item.expire_price_at));
    out.extend(encode_int(item.expected_selection_reset_count));
    out.extend(encode_int(item.expected_withdrawal_sequence_number));
    out.extend(encode_long(item.punter_reference_number));
    out
}

pub fn decode_lwp_to_add(
    bytes: &[u8],
) -> Result<(LightWeightPriceToAdd, &[u8]), CodecError> {
    let (selection_id, rest) = decode_long(bytes)?;
    let (market_id, rest) = decode_long(rest)?;
    let (polarity, rest) = decode_int(rest)?;
    let (odds, rest) = decode_decimal(rest)?;
    let (delta_stake, rest) = decode_money_amount(rest)?;
    let (expire_price_at, rest) = decode_datetime(rest)?;
    let (expected_selection_reset_count, rest) = decode_int(rest)?;
    let (expected_withdrawal_sequence_number, rest) = decode_int(rest)?;
    let (punter_reference_number, rest) = decode_long(rest)?;
    Ok((
        LightWeightPriceToAdd {
            selection_id,
            market_id,
            polarity,
            odds,
            delta_stake,
            expire_price_at,
            expected_selection_reset_count,
            expected_withdrawal_sequence_number,
            punter_reference_number,
        },
        rest,
    ))
}

pub fn encode_lwp_to_cancel(item: &LightWeightPriceToCancel) -> Vec<u8> {
    let mut out = encode_polarity_triplet(item.selection_id, None, item.polarity);
    out.extend(encode_decimal(&item.odds));
    out.extend(encode_long(item.punter_reference_number));
    out
}

pub fn decode_lwp_to_cancel(bytes: &[u8]) -> Result<(LightWeightPriceToCancel, &[u8]), CodecError> {
    let (selection_id, rest) = decode_long(bytes)?;
    let (polarity, rest) = decode_int(rest)?;
    let (odds, rest) = decode_decimal(rest)?;
    let (punter_reference_number, rest) = decode_long(rest)?;
    Ok((
        LightWeightPriceToCancel {
            selection_id,
            polarity,
            odds,
            punter_reference_number,
        },
        rest,
    ))
}

pub fn encode_lwp_notification(item: &LightWeightPriceNotification, currency: &str) -> Vec<u8> {
    let mut out = encode_long(item.market_id).to_vec();
    out.extend(encode_long(item.selection_id));
    out.extend(encode_int(item.polarity));
    out.extend(encode_decimal(&item.odds));
    out.extend(encode_long(item.punter_reference_number));
    out.extend(encode_datetime(item.expire_at));
    out.extend(encode_int(item.expected_selection_reset_count));
    out.extend(encode_int(item.expected_withdrawal_sequence_number));
    out.extend(encode_money_amount(&item.remaining_stake, currency));
    out
}

pub fn decode_lwp_notification(
    bytes: &[u8],
) -> Result<(LightWeightPriceNotification, &[u8]), CodecError> {
    let (market_id, rest) = decode_long(bytes)?;
    let (selection_id, rest) = decode_long(rest)?;
    let (polarity, rest) = decode_int(rest)?;
    let (odds, rest) = decode_decimal(rest)?;
    let (punter_reference_number, rest) = decode_long(rest)?;
    let (expire_at, rest) = decode_datetime(rest)?;
    let (expected_selection_reset_count, rest) = decode_int(rest)?;
    let (expected_withdrawal_sequence_number, rest) = decode_int(rest)?;
    let (remaining_stake, rest) = decode_money_amount(rest)?;
    Ok((
        LightWeightPriceNotification {
            market_id,
            selection_id,
            polarity,
            odds,
            punter_reference_number,
            expire_at,
            expected_selection_reset_count,
            expected_withdrawal_sequence_number,
            remaining_stake,
        },
        rest,
    ))
}

pub fn encode_lwp_change_notification(
    item: &LightWeightPriceChangeNotification,
    currency: &str,
) -> Vec<u8> {
    let mut out = encode_long(item.market_id).to_vec();
    out.extend(encode_long(item.selection_id));
    out.extend(encode_int(item.polarity));
    out.extend(encode_decimal(&item.odds));
    out.extend(encode_long(item.punter_reference_number));
    out.extend(encode_datetime(item.expire_at));
    out.extend(encode_int(item.expected_selection_reset_count));
    out.extend(encode_int(item.expected_withdrawal_sequence_number));
    #[allow(clippy::cast_possible_wrap)]
    out.extend(encode_int(item.lwp_action_type.wire_value() as i32));
    out.extend(encode_money_amount(&item.remaining_stake, currency));
    out.extend(encode_optional(item.matched_stake.as_ref(), |d| {
        encode_money_amount(d, currency)
    }));
    out.extend(encode_optional(item.order_id.as_ref(), |v| {
        encode_long(*v).to_vec()
    }));
    out.extend(encode_optional(
        item.matched_against_side_stake.as_ref(),
        |d| encode_money_amount(d, currency),
    ));
    out
}

pub fn decode_lwp_change_notification(
    bytes: &[u8],
) -> Result<(LightWeightPriceChangeNotification, &[u8]), CodecError> {
    let (market_id, rest) = decode_long(bytes)?;
    let (selection_id, rest) = decode_long(rest)?;
    let (polarity, rest) = decode_int(rest)?;
    let (odds, rest) = decode_decimal(rest)?;
    let (punter_reference_number, rest) = decode_long(rest)?;
    let (expire_at, rest) = decode_datetime(rest)?;
    let (expected_selection_reset_count, rest) = decode_int(rest)?;
    let (expected_withdrawal_sequence_number, rest) = decode_int(rest)?;
    let (raw_action, rest) = decode_int(rest)?;
    #[allow(clippy::cast_sign_loss)]
    let lwp_action_type = LwpActionType::from_wire_value(raw_action as u32);
    if matches!(lwp_action_type, LwpActionType::Unknown(17)) {
        tracing::warn!("unassigned LWP action code 17 received");
    }
    let (remaining_stake, rest) = decode_money_amount(rest)?;
    let (matched_stake, rest) = decode_optional(rest, decode_money_amount)?;
    let (order_id, rest) = decode_optional(rest, |b| decode_long(b))?;
    let (matched_against_side_stake, rest) = decode_optional(rest, decode_money_amount)?;
    Ok((
        LightWeightPriceChangeNotification {
            market_id,
            selection_id,
            polarity,
            odds,
            punter_reference_number,
            expire_at,
            expected_selection_reset_count,
            expected_withdrawal_sequence_number,
            lwp_action_type,
            remaining_stake,
            matched_stake,
            order_id,
            matched_against_side_stake,
        },
        rest,
    ))
}

/// Kind-specific payload, keyed on the message header's `type` string.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPayload {
    AddLightweightPrices {
        prices: Vec<LightWeightPriceToAdd>,
    },
    CancelAllLightweightPrices,
    CancelAllLightweightPricesOnMarkets {
        market_ids: Vec<i64>,
    },
    CancelAllLightweightPricesOnSelections {
        selection_ids: Vec<i64>,
    },
    CancelLightweightPrices {
        prices: Vec<LightWeightPriceToCancel>,
    },
    Ping {
        punter_query_reference_number: i64,
    },
    QueryAllLightweightPrices {
        punter_query_reference_number: i64,
    },
    QueryAllLightweightPricesOnMarkets {
        punter_query_reference_number: i64,
        market_ids: Vec<i64>,
    },
    QueryAllLightweightPricesOnSelections {
        punter_query_reference_number: i64,
        selection_ids: Vec<i64>,
    },
    LightweightPriceSummary {
        punter_query_reference_number: i64,
        total_summary_notifications: i32,
        prices: Vec<LightWeightPriceNotification>,
    },
    LwpChangeNotification {
        prices: Vec<LightWeightPriceChangeNotification>,
    },
    PingResponse {
        punter_query_reference_number: i64,
        total_summary_notifications: i32,
    },
    ResetOccurred,
}

impl BodyPayload {
    #[must_use]
    pub fn wire_type(&self) -> &'static str {
        match self {
            Self::AddLightweightPrices { .. } => "addLightweightPrices",
            Self::CancelAllLightweightPrices => "cancelAllLightweightPrices",
            Self::CancelAllLightweightPricesOnMarkets { .. } => {
                "cancelAllLightweightPricesOnMarkets"
            }
            Self::CancelAllLightweightPricesOnSelections { .. } => {
                "cancelAllLightweightPricesOnSelections"
            }
            Self::CancelLightweightPrices { .. } => "cancelLightweightPrices",
            Self::Ping { .. } => "ping",
            Self::QueryAllLightweightPrices { .. } => "queryAllLightweightPrices",
            Self::QueryAllLightweightPricesOnMarkets { .. } => {
                "queryAllLightweightPricesOnMarkets"
            }
            Self::QueryAllLightweightPricesOnSelections { .. } => {
                "queryAllLightweightPricesOnSelections"
            }
            Self::LightweightPriceSummary { .. } => "lightweightPriceSummary",
            Self::LwpChangeNotification { .. } => "LWPChangeNotification",
            Self::PingResponse { .. } => "pingResponse",
            Self::ResetOccurred => "resetOccurred",
        }
    }

    pub fn encode(&self, currency: &str) -> Vec<u8> {
        match self {
            Self::AddLightweightPrices { prices } => {
                encode_array(prices, |p| encode_lwp_to_add(p, currency))
            }
            Self::CancelAllLightweightPrices | Self::ResetOccurred => Vec::new(),
            Self::CancelAllLightweightPricesOnMarkets { market_ids }
            | Self::CancelAllLightweightPricesOnSelections {
                selection_ids: market_ids,
            } => encode_array(market_ids, |v| encode_long(*v).to_vec()),
            Self::CancelLightweightPrices { prices } => {
                encode_array(prices, |p| encode_lwp_to_cancel(p))
            }
            Self::Ping {
                punter_query_reference_number,
            }
            | Self::QueryAllLightweightPrices {
                punter_query_reference_number,
            } => encode_long(*punter_query_reference_number).to_vec(),
            Self::QueryAllLightweightPricesOnMarkets {
                punter_query_reference_number,
                market_ids,
            }
            | Self::QueryAllLightweightPricesOnSelections {
                punter_query_reference_number,
                selection_ids: market_ids,
            } => {
                let mut out = encode_long(*punter_query_reference_number).to_vec();
                out.extend(encode_array(market_ids, |v| encode_long(*v).to_vec()));
                out
            }
            Self::LightweightPriceSummary {
                punter_query_reference_number,
                total_summary_notifications,
                prices,
            } => {
                let mut out = encode_long(*punter_query_reference_number).to_vec();
                out.extend(encode_int(*total_summary_notifications));
                out.extend(encode_array(prices, |p| encode_lwp_notification(p, currency)));
                out
            }
            Self::LwpChangeNotification { prices } => {
                encode_array(prices, |p| encode_lwp_change_notification(p, currency))
            }
            Self::PingResponse {
                punter_query_reference_number,
                total_summary_notifications,
            } => {
                let mut out = encode_long(*punter_query_reference_number).to_vec();
                out.extend(encode_int(*total_summary_notifications));
                out
            }
        }
    }

    pub fn decode<'a>(wire_type: &str, bytes: &'a [u8]) -> Result<(Self, &'a [u8]), CodecError> {
        match wire_type {
            "addLightweightPrices" => {
                let (prices, rest) = decode_array(bytes, decode_lwp_to_add)?;
                Ok((Self::AddLightweightPrices { prices }, rest))
            }
            "cancelAllLightweightPrices" => Ok((Self::CancelAllLightweightPrices, bytes)),
            "resetOccurred" => Ok((Self::ResetOccurred, bytes)),
            "cancelAllLightweightPricesOnMarkets" => {
                let (market_ids, rest) = decode_array(bytes, |b| decode_long(b))?;
                Ok((Self::CancelAllLightweightPricesOnMarkets { market_ids }, rest))
            }
            "cancelAllLightweightPricesOnSelections" => {
                let (selection_ids, rest) = decode_array(bytes, |b| decode_long(b))?;
                Ok((
                    Self::CancelAllLightweightPricesOnSelections { selection_ids },
                    rest,
                ))
            }
            "cancelLightweightPrices" => {
                let (prices, rest) = decode_array(bytes, |b| decode_lwp_to_cancel(b))?;
                Ok((Self::CancelLightweightPrices { prices }, rest))
            }
            "ping" => {
                let (v, rest) = decode_long(bytes)?;
                Ok((
                    Self::Ping {
                        punter_query_reference_number: v,
                    },
                    rest,
                ))
            }
            "queryAllLightweightPrices" => {
                let (v, rest) = decode_long(bytes)?;
                Ok((
                    Self::QueryAllLightweightPrices {
                        punter_query_reference_number: v,
                    },
                    rest,
                ))
            }
            "queryAllLightweightPricesOnMarkets" => {
                let (v, rest) = decode_long(bytes)?;
                let (market_ids, rest) = decode_array(rest, |b| decode_long(b))?;
                Ok((
                    Self::QueryAllLightweightPricesOnMarkets {
                        punter_query_reference_number: v,
                        market_ids,
                    },
                    rest,
                ))
            }
            "queryAllLightweightPricesOnSelections" => {
                let (v, rest) = decode_long(bytes)?;
                let (selection_ids, rest) = decode_array(rest, |b| decode_long(b))?;
                Ok((
                    Self::QueryAllLightweightPricesOnSelections {
                        punter_query_reference_number: v,
                        selection_ids,
                    },
                    rest,
                ))
            }
            "lightweightPriceSummary" => {
                let (v, rest) = decode_long(bytes)?;
                let (total, rest) = decode_int(rest)?;
                let (prices, rest) = decode_array(rest, decode_lwp_notification)?;
                Ok((
                    Self::LightweightPriceSummary {
                        punter_query_reference_number: v,
                        total_summary_notifications: total,
                        prices,
                    },
                    rest,
                ))
            }
            "LWPChangeNotification" => {
                let (prices, rest) = decode_array(bytes, decode_lwp_change_notification)?;
                Ok((Self::LwpChangeNotification { prices }, rest))
            }
            "pingResponse" => {
                let (v, rest) = decode_long(bytes)?;
                let (total, rest) = decode_int(rest)?;
                Ok((
                    Self::PingResponse {
                        punter_query_reference_number: v,
                        total_summary_notifications: total,
                    },
                    rest,
                ))
            }
            other => {
                tracing::error!(message_type = other, "unknown message body type");
                Err(CodecError::UnknownMessageType(other.to_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lwp_to_add_round_trips() {
        let item = LightWeightPriceToAdd {
            selection_id: 1_807_723,
            market_id: 338_396,
            polarity: 1,
            odds: Decimal::parse("3").unwrap(),
            delta_stake: Decimal::parse("3").unwrap(),
            expire_price_at: Some(Utc.with_ymd_and_hms(2007, 6, 13, 6, 46, 42).unwrap()),
            expected_selection_reset_count: 0,
            expected_withdrawal_sequence_number: 0,
            punter_reference_number: 1,
        };
        let bytes = encode_lwp_to_add(&item, "GBP");
        let (decoded, rest) = decode_lwp_to_add(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, item);
    }

    #[test]
    fn ping_payload_round_trips() {
        let payload = BodyPayload::Ping {
            punter_query_reference_number: 42,
        };
        let bytes = payload.encode("GBP");
        let (decoded, rest) = BodyPayload::decode("ping", &bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, payload);
    }

    #[test]
    fn unknown_message_type_is_a_protocol_error() {
        assert!(BodyPayload::decode("bogus", &[]).is_err());
    }
}

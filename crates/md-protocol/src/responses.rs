//! Command response decoding (§3 "Response").
//!
//! Every response shares order 0 (correlation id) and order 1 (return
//! code); kind-specific fields follow. As with `commands.rs`, orders
//! beyond what a concrete §8 scenario pins down are a reconstruction —
//! see `DESIGN.md`.

use std::collections::BTreeMap;

use bd_codes::{MdsCommandId, ReturnCode};

use crate::frame::RawFrame;
use crate::schema::{FieldSpec, FieldType, MessageSchema, decode_body};
use crate::value::FieldValue;

const COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        order: 0,
        name: "correlation_id",
        ty: FieldType::Int,
        required: true,
    },
    FieldSpec {
        order: 1,
        name: "return_code",
        ty: FieldType::Int,
        required: true,
    },
];

const UNSUBSCRIBE_EXTRA: &[FieldSpec] = &[FieldSpec {
    order: 3,
    name: "subscription_ids",
    ty: FieldType::DelimitedList,
    required: false,
}];

const SUBSCRIPTION_EXTRA: &[FieldSpec] = &[FieldSpec {
    order: 2,
    name: "available_markets_count",
    ty: FieldType::Int,
    required: false,
}];

const REFRESH_PERIOD_EXTRA: &[FieldSpec] = &[FieldSpec {
    order: 2,
    name: "refresh_period_ms",
    ty: FieldType::Int,
    required: false,
}];

/// Field tables indexed by command id, common fields first.
fn schema_for(command_id: MdsCommandId) -> Vec<FieldSpec> {
    let extra: &[FieldSpec] = match command_id {
        MdsCommandId::Unsubscribe => UNSUBSCRIBE_EXTRA,
        MdsCommandId::SubscribeEventHierarchy
        | MdsCommandId::SubscribeDetailedMarketPrices
        | MdsCommandId::SubscribeMarketInformation
        | MdsCommandId::SubscribeMarketMatchedAmounts => SUBSCRIPTION_EXTRA,
        MdsCommandId::SetRefreshPeriod | MdsCommandId::GetRefreshPeriod => REFRESH_PERIOD_EXTRA,
        MdsCommandId::SetAnonymousSessionContext
        | MdsCommandId::LogonPunter
        | MdsCommandId::LogoffPunter
        | MdsCommandId::Ping => &[],
    };
    COMMON_FIELDS.iter().chain(extra).copied().collect()
}

/// A decoded command response.
#[derive(Debug, Clone, PartialEq)]
pub struct MdsResponse {
    pub command_id: MdsCommandId,
    pub correlation_id: u32,
    pub return_code: ReturnCode,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("response missing required correlation_id")]
    MissingCorrelationId,
    #[error("response missing required return_code")]
    MissingReturnCode,
}

/// Decode `frame`'s body as a response to `command_id`.
pub fn decode_response(
    command_id: MdsCommandId,
    frame: &RawFrame,
) -> Result<MdsResponse, ResponseError> {
    let owned_fields = schema_for(command_id);
    let schema = MessageSchema {
        fields: &owned_fields,
    };
    let mut fields = decode_body(&schema, &frame.body);

    let correlation_id = fields
        .remove("correlation_id")
        .and_then(|v| v.as_int())
        .ok_or(ResponseError::MissingCorrelationId)?;
    let return_code = fields
        .remove("return_code")
        .and_then(|v| v.as_int())
        .ok_or(ResponseError::MissingReturnCode)?;

    Ok(MdsResponse {
        command_id,
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        correlation_id: correlation_id as u32,
        return_code: ReturnCode::from_wire_value(
            i32::try_from(return_code).unwrap_or(i32::MAX),
        ),
        fields,
    })
}

impl MdsResponse {
    /// Subscription ids acknowledged by an `Unsubscribe` response.
    #[must_use]
    pub fn subscription_ids(&self) -> Vec<u32> {
        self.fields
            .get("subscription_ids")
            .and_then(FieldValue::as_list)
            .map(|v| v.iter().filter_map(|s| s.parse().ok()).collect())
            .unwrap_or_default()
    }

    /// Whether the server reports this subscription as fully exhausted
    /// (§4.3 "Available-markets policy").
    #[must_use]
    pub fn available_markets_exhausted(&self) -> bool {
        self.fields
            .get("available_markets_count")
            .and_then(FieldValue::as_int)
            == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode_frame;

    #[test]
    fn decode_unsubscribe_response_scenario() {
        let text = "AAPI/6/D\u{2}20\u{2}F\u{1}0\u{2}1984840034\u{1}1\u{2}0\u{1}3\u{2}2~3\u{1}";
        let frame = decode_frame(text).unwrap();
        let resp = decode_response(MdsCommandId::Unsubscribe, &frame).unwrap();
        assert_eq!(resp.correlation_id, 1_984_840_034);
        assert_eq!(resp.return_code, ReturnCode::Success);
        assert_eq!(resp.subscription_ids(), vec![2, 3]);
    }

    #[test]
    fn available_markets_count_zero_is_detected() {
        let text = "AAPI/6/D\u{2}10\u{2}F\u{1}0\u{2}5\u{1}1\u{2}0\u{1}2\u{2}0\u{1}";
        let frame = decode_frame(text).unwrap();
        let resp = decode_response(MdsCommandId::SubscribeDetailedMarketPrices, &frame).unwrap();
        assert!(resp.available_markets_exhausted());
    }

    #[test]
    fn terminal_return_code_is_not_benign() {
        let text = "AAPI/6/D\u{2}61\u{2}F\u{1}0\u{2}1\u{1}1\u{2}9\u{1}";
        let frame = decode_frame(text).unwrap();
        let resp = decode_response(MdsCommandId::GetRefreshPeriod, &frame).unwrap();
        assert!(!resp.return_code.is_benign());
    }
}

//! Outbound command encoding (§4.1, §6 command identifier table).
//!
//! Every command shares field order 0 for its correlation id; kind-
//! specific fields follow starting at order 1. The orders chosen here for
//! fields not pinned down by a concrete wire scenario in §8 (e.g. the
//! username/password split of `LogonPunter`) are a reconstruction, not a
//! verbatim server spec — see `DESIGN.md`.

use bd_codes::MdsCommandId;

use crate::frame::encode_command_head;
use crate::schema::encode_fields;
use crate::value::FieldValue;

/// One outbound command, fully resolved to its wire fields.
#[derive(Debug, Clone, PartialEq)]
pub enum MdsCommand {
    SetAnonymousSessionContext {
        correlation_id: u32,
    },
    LogonPunter {
        correlation_id: u32,
        username: String,
        password: String,
    },
    LogoffPunter {
        correlation_id: u32,
    },
    SubscribeMarketInformation {
        correlation_id: u32,
        event_id: i64,
    },
    SubscribeDetailedMarketPrices {
        correlation_id: u32,
        market_id: i64,
        prices_number: i64,
        filter_by_volume: bool,
    },
    SubscribeEventHierarchy {
        correlation_id: u32,
        classifier_id: i64,
    },
    SubscribeMarketMatchedAmounts {
        correlation_id: u32,
        market_id: i64,
    },
    Unsubscribe {
        correlation_id: u32,
        subscription_ids: Vec<u32>,
    },
    Ping {
        correlation_id: u32,
        current_client_time: chrono::DateTime<chrono::Utc>,
    },
    SetRefreshPeriod {
        correlation_id: u32,
        refresh_period_ms: i64,
    },
    GetRefreshPeriod {
        correlation_id: u32,
    },
}

impl MdsCommand {
    #[must_use]
    pub const fn command_id(&self) -> MdsCommandId {
        match self {
            Self::SetAnonymousSessionContext { .. } => MdsCommandId::SetAnonymousSessionContext,
            Self::LogonPunter { .. } => MdsCommandId::LogonPunter,
            Self::LogoffPunter { .. } => MdsCommandId::LogoffPunter,
            Self::SubscribeMarketInformation { .. } => MdsCommandId::SubscribeMarketInformation,
            Self::SubscribeDetailedMarketPrices { .. } => {
                MdsCommandId::SubscribeDetailedMarketPrices
            }
            Self::SubscribeEventHierarchy { .. } => MdsCommandId::SubscribeEventHierarchy,
            Self::SubscribeMarketMatchedAmounts { .. } => {
                MdsCommandId::SubscribeMarketMatchedAmounts
            }
            Self::Unsubscribe { .. } => MdsCommandId::Unsubscribe,
            Self::Ping { .. } => MdsCommandId::Ping,
            Self::SetRefreshPeriod { .. } => MdsCommandId::SetRefreshPeriod,
            Self::GetRefreshPeriod { .. } => MdsCommandId::GetRefreshPeriod,
        }
    }

    #[must_use]
    pub const fn correlation_id(&self) -> u32 {
        match self {
            Self::SetAnonymousSessionContext { correlation_id }
            | Self::LogonPunter { correlation_id, .. }
            | Self::LogoffPunter { correlation_id }
            | Self::SubscribeMarketInformation { correlation_id, .. }
            | Self::SubscribeDetailedMarketPrices { correlation_id, .. }
            | Self::SubscribeEventHierarchy { correlation_id, .. }
            | Self::SubscribeMarketMatchedAmounts { correlation_id, .. }
            | Self::Unsubscribe { correlation_id, .. }
            | Self::Ping { correlation_id, .. }
            | Self::SetRefreshPeriod { correlation_id, .. }
            | Self::GetRefreshPeriod { correlation_id } => *correlation_id,
        }
    }

    /// Is this one of the four rate-limited subscription kinds (§4.3)?
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.command_id().is_rate_limited()
    }

    /// Render this command to its complete wire text.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut fields = vec![(0u32, FieldValue::Int(i64::from(self.correlation_id())))];
        match self {
            Self::SetAnonymousSessionContext { .. }
            | Self::LogoffPunter { .. }
            | Self::GetRefreshPeriod { .. } => {}
            Self::LogonPunter {
                username, password, ..
            } => {
                fields.push((1, FieldValue::Str(username.clone())));
                fields.push((2, FieldValue::Str(password.clone())));
            }
            Self::SubscribeMarketInformation { event_id, .. } => {
                fields.push((1, FieldValue::Int(*event_id)));
            }
            Self::SubscribeDetailedMarketPrices {
                market_id,
                prices_number,
                filter_by_volume,
                ..
            } => {
                fields.push((1, FieldValue::Int(*market_id)));
                fields.push((2, FieldValue::Int(*prices_number)));
                fields.push((3, FieldValue::Bool(*filter_by_volume)));
            }
            Self::SubscribeEventHierarchy { classifier_id, .. } => {
                fields.push((1, FieldValue::Int(*classifier_id)));
            }
            Self::SubscribeMarketMatchedAmounts { market_id, .. } => {
                fields.push((1, FieldValue::Int(*market_id)));
            }
            Self::Unsubscribe {
                subscription_ids, ..
            } => {
                fields.push((
                    1,
                    FieldValue::List(subscription_ids.iter().map(ToString::to_string).collect()),
                ));
            }
            Self::Ping {
                current_client_time,
                ..
            } => {
                fields.push((1, FieldValue::Timestamp(*current_client_time)));
            }
            Self::SetRefreshPeriod {
                refresh_period_ms, ..
            } => {
                fields.push((1, FieldValue::Int(*refresh_period_ms)));
            }
        }
        format!(
            "{}{}",
            encode_command_head(self.command_id().wire_value()),
            encode_fields(&fields)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encode_ping_matches_wire_scenario() {
        let cmd = MdsCommand::Ping {
            correlation_id: 1,
            current_client_time: chrono::Utc.with_ymd_and_hms(2020, 12, 31, 15, 59, 0).unwrap(),
        };
        let wire = cmd.encode();
        assert_eq!(
            wire,
            "\u{2}22\u{1}0\u{2}1\u{1}1\u{2}2020-12-31T15:59:00.000000Z\u{1}"
        );
    }

    #[test]
    fn unsubscribe_renders_delimited_list() {
        let cmd = MdsCommand::Unsubscribe {
            correlation_id: 5,
            subscription_ids: vec![2, 3],
        };
        assert!(cmd.encode().contains("1\u{2}2~3\u{1}"));
    }

    #[test]
    fn rate_limited_kinds_flagged_correctly() {
        let cmd = MdsCommand::SubscribeEventHierarchy {
            correlation_id: 1,
            classifier_id: 100_004,
        };
        assert!(cmd.is_rate_limited());
        let cmd = MdsCommand::Ping {
            correlation_id: 1,
            current_client_time: chrono::Utc::now(),
        };
        assert!(!cmd.is_rate_limited());
    }
}

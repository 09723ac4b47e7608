//! Closed enumerations shared by the market-data and order stacks.
//!
//! Every type here is a fixed, server-documented code set. None of these
//! are extensible at runtime; unknown wire values fall back to an
//! `Unknown` variant rather than an error, since new codes are added by
//! the exchange faster than clients are updated.

use std::fmt;

/// Command identifiers used in the market-data text protocol's numeric
/// message-identifier header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdsCommandId {
    SetAnonymousSessionContext,
    LogonPunter,
    LogoffPunter,
    SubscribeMarketInformation,
    SubscribeDetailedMarketPrices,
    SubscribeEventHierarchy,
    SubscribeMarketMatchedAmounts,
    Unsubscribe,
    Ping,
    SetRefreshPeriod,
    GetRefreshPeriod,
}

impl MdsCommandId {
    #[must_use]
    pub const fn wire_value(self) -> u32 {
        match self {
            Self::SetAnonymousSessionContext => 1,
            Self::LogonPunter => 2,
            Self::LogoffPunter => 3,
            Self::SubscribeMarketInformation => 9,
            Self::SubscribeDetailedMarketPrices => 10,
            Self::SubscribeEventHierarchy => 12,
            Self::SubscribeMarketMatchedAmounts => 14,
            Self::Unsubscribe => 20,
            Self::Ping => 22,
            Self::SetRefreshPeriod => 60,
            Self::GetRefreshPeriod => 61,
        }
    }

    #[must_use]
    pub const fn from_wire_value(v: u32) -> Option<Self> {
        Some(match v {
            1 => Self::SetAnonymousSessionContext,
            2 => Self::LogonPunter,
            3 => Self::LogoffPunter,
            9 => Self::SubscribeMarketInformation,
            10 => Self::SubscribeDetailedMarketPrices,
            12 => Self::SubscribeEventHierarchy,
            14 => Self::SubscribeMarketMatchedAmounts,
            20 => Self::Unsubscribe,
            22 => Self::Ping,
            60 => Self::SetRefreshPeriod,
            61 => Self::GetRefreshPeriod,
            _ => return None,
        })
    }

    /// Is this one of the four rate-limited subscription kinds?
    #[must_use]
    pub const fn is_rate_limited(self) -> bool {
        matches!(
            self,
            Self::SubscribeEventHierarchy
                | Self::SubscribeDetailedMarketPrices
                | Self::SubscribeMarketInformation
                | Self::SubscribeMarketMatchedAmounts
        )
    }
}

/// Frame head `message_type` marker on the market-data wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdsMessageType {
    TopicLoad,
    Delete,
    Delta,
}

impl MdsMessageType {
    #[must_use]
    pub const fn wire_char(self) -> char {
        match self {
            Self::TopicLoad => 'T',
            Self::Delete => 'X',
            Self::Delta => 'F',
        }
    }

    #[must_use]
    pub const fn from_wire_char(c: char) -> Option<Self> {
        Some(match c {
            'T' => Self::TopicLoad,
            'X' => Self::Delete,
            'F' => Self::Delta,
            _ => return None,
        })
    }
}

/// Return code on a command response. Any value other than `Success` or
/// `EventClassifierDoesNotExist` is terminal for the owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Success,
    EventClassifierDoesNotExist,
    Other(i32),
}

impl ReturnCode {
    #[must_use]
    pub const fn from_wire_value(v: i32) -> Self {
        match v {
            0 => Self::Success,
            5 => Self::EventClassifierDoesNotExist,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn wire_value(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::EventClassifierDoesNotExist => 5,
            Self::Other(v) => v,
        }
    }

    /// Whether this return code is benign and the session should continue.
    #[must_use]
    pub const fn is_benign(self) -> bool {
        matches!(self, Self::Success | Self::EventClassifierDoesNotExist)
    }
}

/// Bet side, encoded as a raw `Int` on the order-stack wire: 0 = Against
/// (Lay), 1 = For (Back). This is distinct from the display-only
/// `Polarity` enumeration used elsewhere in the exchange's domain
/// vocabulary (For=1, Against=2); the wire field here is the one and
/// only encoding this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Against,
    For,
}

impl Polarity {
    #[must_use]
    pub const fn wire_value(self) -> i32 {
        match self {
            Self::Against => 0,
            Self::For => 1,
        }
    }

    #[must_use]
    pub const fn from_wire_value(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Against,
            1 => Self::For,
            _ => return None,
        })
    }
}

/// Reason code on an `LWPChangeNotification`. Code 17 is not assigned by
/// the server; it decodes to `Unknown(17)` rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LwpActionType {
    CancelledExplicitly,
    CancelledAll,
    Matched,
    ChangedOrAdded,
    SelectionCompleted,
    ResetOccurred,
    WithdrawalOccurred,
    Expired,
    CancelledAllOnSelection,
    PunterDisabled,
    LwpDoesNotExist,
    InvalidPrice,
    InvalidWithdrawalSequenceNumber,
    InvalidSelectionResetCount,
    InvalidCurrency,
    CancelledAllOnMarket,
    IncorrectMarketId,
    PlayForFreeViolation,
    RingFencedLiquidityViolation,
    UnmatchableAmount,
    Unknown(u32),
}

impl LwpActionType {
    #[must_use]
    pub const fn wire_value(self) -> u32 {
        match self {
            Self::CancelledExplicitly => 1,
            Self::CancelledAll => 2,
            Self::Matched => 3,
            Self::ChangedOrAdded => 4,
            Self::SelectionCompleted => 5,
            Self::ResetOccurred => 6,
            Self::WithdrawalOccurred => 7,
            Self::Expired => 8,
            Self::CancelledAllOnSelection => 9,
            Self::PunterDisabled => 10,
            Self::LwpDoesNotExist => 11,
            Self::InvalidPrice => 12,
            Self::InvalidWithdrawalSequenceNumber => 13,
            Self::InvalidSelectionResetCount => 14,
            Self::InvalidCurrency => 15,
            Self::CancelledAllOnMarket => 16,
            Self::IncorrectMarketId => 18,
            Self::PlayForFreeViolation => 19,
            Self::RingFencedLiquidityViolation => 20,
            Self::UnmatchableAmount => 21,
            Self::Unknown(v) => v,
        }
    }

    #[must_use]
    pub const fn from_wire_value(v: u32) -> Self {
        match v {
            1 => Self::CancelledExplicitly,
            2 => Self::CancelledAll,
            3 => Self::Matched,
            4 => Self::ChangedOrAdded,
            5 => Self::SelectionCompleted,
            6 => Self::ResetOccurred,
            7 => Self::WithdrawalOccurred,
            8 => Self::Expired,
            9 => Self::CancelledAllOnSelection,
            10 => Self::PunterDisabled,
            11 => Self::LwpDoesNotExist,
            12 => Self::InvalidPrice,
            13 => Self::InvalidWithdrawalSequenceNumber,
            14 => Self::InvalidSelectionResetCount,
            15 => Self::InvalidCurrency,
            16 => Self::CancelledAllOnMarket,
            18 => Self::IncorrectMarketId,
            19 => Self::PlayForFreeViolation,
            20 => Self::RingFencedLiquidityViolation,
            21 => Self::UnmatchableAmount,
            other => Self::Unknown(other),
        }
    }
}

/// Message-type string in an order-stack envelope's `MessageHeader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsMessageKind {
    AddLightweightPrices,
    CancelAllLightweightPrices,
    CancelAllLightweightPricesOnMarkets,
    CancelAllLightweightPricesOnSelections,
    CancelLightweightPrices,
    Ping,
    QueryAllLightweightPrices,
    QueryAllLightweightPricesOnMarkets,
    QueryAllLightweightPricesOnSelections,
    LightweightPriceSummary,
    LwpChangeNotification,
    PingResponse,
    ResetOccurred,
}

impl OsMessageKind {
    #[must_use]
    pub const fn wire_str(self) -> &'static str {
        match self {
            Self::AddLightweightPrices => "addLightweightPrices",
            Self::CancelAllLightweightPrices => "cancelAllLightweightPrices",
            Self::CancelAllLightweightPricesOnMarkets => "cancelAllLightweightPricesOnMarkets",
            Self::CancelAllLightweightPricesOnSelections => {
                "cancelAllLightweightPricesOnSelections"
            }
            Self::CancelLightweightPrices => "cancelLightweightPrices",
            Self::Ping => "ping",
            Self::QueryAllLightweightPrices => "queryAllLightweightPrices",
            Self::QueryAllLightweightPricesOnMarkets => "queryAllLightweightPricesOnMarkets",
            Self::QueryAllLightweightPricesOnSelections => {
                "queryAllLightweightPricesOnSelections"
            }
            Self::LightweightPriceSummary => "lightweightPriceSummary",
            Self::LwpChangeNotification => "LWPChangeNotification",
            Self::PingResponse => "pingResponse",
            Self::ResetOccurred => "resetOccurred",
        }
    }

    #[must_use]
    pub fn from_wire_str(s: &str) -> Option<Self> {
        Some(match s {
            "addLightweightPrices" => Self::AddLightweightPrices,
            "cancelAllLightweightPrices" => Self::CancelAllLightweightPrices,
            "cancelAllLightweightPricesOnMarkets" => Self::CancelAllLightweightPricesOnMarkets,
            "cancelAllLightweightPricesOnSelections" => {
                Self::CancelAllLightweightPricesOnSelections
            }
            "cancelLightweightPrices" => Self::CancelLightweightPrices,
            "ping" => Self::Ping,
            "queryAllLightweightPrices" => Self::QueryAllLightweightPrices,
            "queryAllLightweightPricesOnMarkets" => Self::QueryAllLightweightPricesOnMarkets,
            "queryAllLightweightPricesOnSelections" => {
                Self::QueryAllLightweightPricesOnSelections
            }
            "lightweightPriceSummary" => Self::LightweightPriceSummary,
            "LWPChangeNotification" => Self::LwpChangeNotification,
            "pingResponse" => Self::PingResponse,
            "resetOccurred" => Self::ResetOccurred,
            _ => return None,
        })
    }
}

impl fmt::Display for OsMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_str())
    }
}

/// Callback registration kinds on the order-stack connection driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolEvent {
    ConnectionMade,
    DataReceived,
    DataSent,
    ConnectionLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mds_command_id_round_trips() {
        for id in [
            MdsCommandId::SetAnonymousSessionContext,
            MdsCommandId::LogonPunter,
            MdsCommandId::LogoffPunter,
            MdsCommandId::SubscribeMarketInformation,
            MdsCommandId::SubscribeDetailedMarketPrices,
            MdsCommandId::SubscribeEventHierarchy,
            MdsCommandId::SubscribeMarketMatchedAmounts,
            MdsCommandId::Unsubscribe,
            MdsCommandId::Ping,
            MdsCommandId::SetRefreshPeriod,
            MdsCommandId::GetRefreshPeriod,
        ] {
            assert_eq!(MdsCommandId::from_wire_value(id.wire_value()), Some(id));
        }
    }

    #[test]
    fn rate_limited_kinds_are_exactly_the_four_subscriptions() {
        assert!(MdsCommandId::SubscribeEventHierarchy.is_rate_limited());
        assert!(MdsCommandId::SubscribeDetailedMarketPrices.is_rate_limited());
        assert!(MdsCommandId::SubscribeMarketInformation.is_rate_limited());
        assert!(MdsCommandId::SubscribeMarketMatchedAmounts.is_rate_limited());
        assert!(!MdsCommandId::Ping.is_rate_limited());
        assert!(!MdsCommandId::Unsubscribe.is_rate_limited());
    }

    #[test]
    fn return_code_benign_set() {
        assert!(ReturnCode::from_wire_value(0).is_benign());
        assert!(ReturnCode::from_wire_value(5).is_benign());
        assert!(!ReturnCode::from_wire_value(1).is_benign());
        assert!(!ReturnCode::from_wire_value(-1).is_benign());
    }

    #[test]
    fn lwp_action_type_code_17_is_unknown() {
        assert_eq!(LwpActionType::from_wire_value(17), LwpActionType::Unknown(17));
        assert_eq!(LwpActionType::from_wire_value(17).wire_value(), 17);
    }

    #[test]
    fn lwp_action_type_round_trips_known_codes() {
        for code in (1..=16).chain(18..=21) {
            let decoded = LwpActionType::from_wire_value(code);
            assert_eq!(decoded.wire_value(), code);
        }
    }

    #[test]
    fn os_message_kind_round_trips() {
        for kind in [
            OsMessageKind::AddLightweightPrices,
            OsMessageKind::CancelAllLightweightPrices,
            OsMessageKind::CancelAllLightweightPricesOnMarkets,
            OsMessageKind::CancelAllLightweightPricesOnSelections,
            OsMessageKind::CancelLightweightPrices,
            OsMessageKind::Ping,
            OsMessageKind::QueryAllLightweightPrices,
            OsMessageKind::QueryAllLightweightPricesOnMarkets,
            OsMessageKind::QueryAllLightweightPricesOnSelections,
            OsMessageKind::LightweightPriceSummary,
            OsMessageKind::LwpChangeNotification,
            OsMessageKind::PingResponse,
            OsMessageKind::ResetOccurred,
        ] {
            assert_eq!(OsMessageKind::from_wire_str(kind.wire_str()), Some(kind));
        }
    }

    #[test]
    fn polarity_matches_glossary_not_the_display_enum() {
        assert_eq!(Polarity::Against.wire_value(), 0);
        assert_eq!(Polarity::For.wire_value(), 1);
    }
}

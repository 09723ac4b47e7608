//! Topic-name resolver (§4.2).
//!
//! The topic tree is cyclic (`Event1` is reachable as its own descendant)
//! so it is built as an arena of nodes addressed by index rather than by
//! ownership, populated in a second pass once every node exists (§9
//! "Cyclic topic tree").
//!
//! The nesting below follows the reference topic classes directly:
//! `Market1`, `MExchangeInfo`, `EExchangeInfo` and `Tab1` are each real
//! intermediate nodes carrying their own children rather than flattened
//! onto `Event1` — `MEI`/`S`/`TV`/`ML` only exist under a resolved
//! `Market1`, `MMA`/`MEL`/`MDP` only exist under a resolved
//! `MExchangeInfo`, and the tagged-language leaves only exist under the
//! gateway class that actually owns them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::FrameError;

/// What a parameterized segment feeds into.
#[derive(Debug, Clone, Copy)]
enum FieldTarget {
    /// Advances the next unfilled slot of the ordered event-classifier
    /// key sequence (`parent, sport_id, sport_group_id, location_id,
    /// event_id`).
    EventClassifierStep,
    /// A flat integer keyword, e.g. `market_id` or `selection_id`
    /// (`E_`-stripped before parsing, per the reference normalizer).
    Flat(&'static str),
    /// A flat string keyword taken verbatim (no `E_` strip, no integer
    /// parse) — grouping names and language codes.
    Raw(&'static str),
}

struct Node {
    class: &'static str,
    literal: &'static [&'static str],
    literal_targets: Vec<usize>,
    param: Option<FieldTarget>,
    param_target: Option<usize>,
}

const EVENTS: usize = 0;
const EVENT1: usize = 1;
const MARKET_GATEWAY: usize = 2;
const MARKET1: usize = 3;
const SELECTION_GATEWAY: usize = 4;
const SELECTION1: usize = 5;
const M_EXCHANGE_INFO: usize = 6;
const MARKET_DETAILED_PRICES: usize = 7;
const MATCHED_AMOUNTS: usize = 8;
const LANGUAGE4: usize = 9;
const EVENT_LANGUAGE_GATEWAY: usize = 10;
const MARKET_TAGGED_VALUE: usize = 11;
const E_EXCHANGE_INFO: usize = 12;
const TABS_GATEWAY: usize = 13;
const TAB1: usize = 14;
const TAB_LANGUAGE_GATEWAY: usize = 15;
const LANGUAGE14: usize = 16;
const MARKET_LANGUAGE_GATEWAY: usize = 17;
const LANGUAGE7: usize = 18;
const MARKET_EXCHANGE_LANGUAGE_GATEWAY: usize = 19;
const LANGUAGE3: usize = 20;
const E_EXCHANGE_LANGUAGE_GATEWAY: usize = 21;
const LANGUAGE2: usize = 22;

static TREE: LazyLock<Vec<Node>> = LazyLock::new(build_tree);

fn build_tree() -> Vec<Node> {
    let mut nodes = Vec::new();
    for class in [
        "Events",                      // EVENTS
        "Event1",                      // EVENT1
        "__MarketGateway",             // MARKET_GATEWAY
        "Market1",                     // MARKET1
        "__SelectionGateway",          // SELECTION_GATEWAY
        "Selection1",                  // SELECTION1
        "MExchangeInfo",               // M_EXCHANGE_INFO
        "MarketDetailedPrices",        // MARKET_DETAILED_PRICES
        "MatchedAmounts",              // MATCHED_AMOUNTS
        "Language4",                   // LANGUAGE4
        "__EventLanguageGateway",      // EVENT_LANGUAGE_GATEWAY
        "MarketTaggedValues",          // MARKET_TAGGED_VALUE
        "EExchangeInfo",               // E_EXCHANGE_INFO
        "__TabsGateway",               // TABS_GATEWAY
        "Tab1",                        // TAB1
        "__TabLanguageGateway",        // TAB_LANGUAGE_GATEWAY
        "Language14",                  // LANGUAGE14
        "__MarketLanguageGateway",     // MARKET_LANGUAGE_GATEWAY
        "Language7",                   // LANGUAGE7
        "__MarketExchangeLanguageGateway", // MARKET_EXCHANGE_LANGUAGE_GATEWAY
        "Language3",                   // LANGUAGE3
        "__EExchangeLanguageGateway",  // E_EXCHANGE_LANGUAGE_GATEWAY
        "Language2",                   // LANGUAGE2
    ] {
        nodes.push(Node {
            class,
            literal: &[],
            literal_targets: Vec::new(),
            param: None,
            param_target: None,
        });
    }

    nodes[EVENTS].param = Some(FieldTarget::EventClassifierStep);
    nodes[EVENTS].param_target = Some(EVENT1);

    // Event1.children = (Markets, EExchangeInfo, EventLanguage, Events) —
    // the trailing `Events` child is the self-loop that makes the tree
    // cyclic; `Markets` and `Selections` etc. are transparent single-child
    // gateways collapsed directly onto their one real descendant.
    nodes[EVENT1].literal = &["M", "EEI", "EL", "E"];
    nodes[EVENT1].literal_targets = vec![MARKET_GATEWAY, E_EXCHANGE_INFO, EVENT_LANGUAGE_GATEWAY, EVENT1];
    nodes[EVENT1].param = Some(FieldTarget::EventClassifierStep);
    nodes[EVENT1].param_target = Some(EVENT1);

    nodes[MARKET_GATEWAY].param = Some(FieldTarget::Flat("market_id"));
    nodes[MARKET_GATEWAY].param_target = Some(MARKET1);

    // Market1.children = (MExchangeInfo, Selections, MarketTaggedValues,
    // MarketLanguage).
    nodes[MARKET1].literal = &["MEI", "S", "TV", "ML"];
    nodes[MARKET1].literal_targets = vec![
        M_EXCHANGE_INFO,
        SELECTION_GATEWAY,
        MARKET_TAGGED_VALUE,
        MARKET_LANGUAGE_GATEWAY,
    ];

    nodes[SELECTION_GATEWAY].param = Some(FieldTarget::Flat("selection_id"));
    nodes[SELECTION_GATEWAY].param_target = Some(SELECTION1);

    // MExchangeInfo.children = (MMatchedAmount, MExchangeLanguage,
    // MarketDetailedPrices).
    nodes[M_EXCHANGE_INFO].literal = &["MMA", "MEL", "MDP"];
    nodes[M_EXCHANGE_INFO].literal_targets =
        vec![MATCHED_AMOUNTS, MARKET_EXCHANGE_LANGUAGE_GATEWAY, MARKET_DETAILED_PRICES];

    nodes[MARKET_LANGUAGE_GATEWAY].param = Some(FieldTarget::Raw("market_language_code"));
    nodes[MARKET_LANGUAGE_GATEWAY].param_target = Some(LANGUAGE7);

    nodes[MARKET_EXCHANGE_LANGUAGE_GATEWAY].param = Some(FieldTarget::Raw("market_exchange_info_language_code"));
    nodes[MARKET_EXCHANGE_LANGUAGE_GATEWAY].param_target = Some(LANGUAGE3);

    // EventLanguage.children = (Language4,); the language-code segment is
    // consumed on the way in, not a literal leaf.
    nodes[EVENT_LANGUAGE_GATEWAY].param = Some(FieldTarget::Raw("event_language_code"));
    nodes[EVENT_LANGUAGE_GATEWAY].param_target = Some(LANGUAGE4);

    // EExchangeInfo.children = (Tabs, EExchangeLanguage).
    nodes[E_EXCHANGE_INFO].literal = &["TAB", "EEL"];
    nodes[E_EXCHANGE_INFO].literal_targets = vec![TABS_GATEWAY, E_EXCHANGE_LANGUAGE_GATEWAY];

    nodes[E_EXCHANGE_LANGUAGE_GATEWAY].param = Some(FieldTarget::Raw("exchange_info_language_code"));
    nodes[E_EXCHANGE_LANGUAGE_GATEWAY].param_target = Some(LANGUAGE2);

    nodes[TABS_GATEWAY].param = Some(FieldTarget::Raw("grouping_name"));
    nodes[TABS_GATEWAY].param_target = Some(TAB1);

    // Tab1.children = (TabLanguage,).
    nodes[TAB1].literal = &["TL"];
    nodes[TAB1].literal_targets = vec![TAB_LANGUAGE_GATEWAY];

    nodes[TAB_LANGUAGE_GATEWAY].param = Some(FieldTarget::Raw("tab_language_code"));
    nodes[TAB_LANGUAGE_GATEWAY].param_target = Some(LANGUAGE14);

    nodes
}

/// The ordered event-classifier keyword slots (§4.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventClassifierId {
    pub parent: Option<i64>,
    pub sport_id: Option<i64>,
    pub sport_group_id: Option<i64>,
    pub location_id: Option<i64>,
    pub event_id: Option<i64>,
}

impl EventClassifierId {
    fn push(&mut self, v: i64) {
        if self.parent.is_none() {
            self.parent = Some(v);
        } else if self.sport_id.is_none() {
            self.sport_id = Some(v);
        } else if self.sport_group_id.is_none() {
            self.sport_group_id = Some(v);
        } else if self.location_id.is_none() {
            self.location_id = Some(v);
        } else if self.event_id.is_none() {
            self.event_id = Some(v);
        }
        // A 6th occurrence has no slot left; the reference schema never
        // nests this deep, so it is dropped rather than treated as fatal.
    }
}

/// Keyword state accumulated while walking a topic path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicKeywords {
    pub event_classifier_id: EventClassifierId,
    pub market_id: Option<i64>,
    pub selection_id: Option<i64>,
    /// Keys that aren't common enough to warrant their own field: tab
    /// grouping names and the various language-code leaves.
    pub extra: BTreeMap<&'static str, String>,
}

/// The outcome of resolving a topic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResolution {
    pub class: &'static str,
    pub keywords: TopicKeywords,
}

/// Strip a leading run of `E`/`_` characters, per the reference
/// implementation's `lstrip('E_')` (a character-set strip, not a fixed
/// two-character prefix strip).
fn strip_e_underscore(segment: &str) -> &str {
    segment.trim_start_matches(['E', '_'])
}

/// Resolve a full topic name (e.g. `"AAPI/6/E/E_1/E/E_100003"`) to its
/// message class and extracted keywords.
///
/// The first three slash-separated segments (`AAPI`, session id, root)
/// are not part of the tree walk; only the tail is resolved.
pub fn resolve_topic_path(topic_name: &str) -> Result<TopicResolution, FrameError> {
    let segments: Vec<&str> = topic_name.split('/').collect();
    let tail = segments.get(3..).unwrap_or(&[]);
    resolve_segments(tail)
}

fn resolve_segments(segments: &[&str]) -> Result<TopicResolution, FrameError> {
    let tree = &*TREE;
    let mut current = EVENTS;
    let mut keywords = TopicKeywords::default();

    for seg in segments {
        let node = &tree[current];
        if let Some(pos) = node.literal.iter().position(|l| l == seg) {
            current = node.literal_targets[pos];
            continue;
        }
        if let Some(target) = node.param {
            match target {
                FieldTarget::EventClassifierStep => {
                    let stripped = strip_e_underscore(seg);
                    let Ok(value) = stripped.parse::<i64>() else {
                        return Err(FrameError::UnknownTopicSegment((*seg).to_owned()));
                    };
                    keywords.event_classifier_id.push(value);
                }
                FieldTarget::Flat(name) => {
                    let stripped = strip_e_underscore(seg);
                    let Ok(value) = stripped.parse::<i64>() else {
                        return Err(FrameError::UnknownTopicSegment((*seg).to_owned()));
                    };
                    match name {
                        "market_id" => keywords.market_id = Some(value),
                        "selection_id" => keywords.selection_id = Some(value),
                        _ => {}
                    }
                }
                FieldTarget::Raw(name) => {
                    keywords.extra.insert(name, (*seg).to_owned());
                }
            }
            current = node.param_target.expect("param target set alongside param");
            continue;
        }
        return Err(FrameError::UnknownTopicSegment((*seg).to_owned()));
    }

    Ok(TopicResolution {
        class: tree[current].class,
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_event_topic_scenario() {
        let res = resolve_topic_path("AAPI/6/E/E_1/E/E_100003").unwrap();
        assert_eq!(res.class, "Event1");
        assert_eq!(res.keywords.event_classifier_id.parent, Some(1));
        assert_eq!(res.keywords.event_classifier_id.sport_id, Some(100_003));
        assert_eq!(res.keywords.event_classifier_id.sport_group_id, None);
    }

    #[test]
    fn resolve_market_topic_scenario() {
        let res = resolve_topic_path(
            "AAPI/3/E/E_1/E/E_100004/E/E_100289/E/E_5100309/E/E_5100394/M/E_12759206",
        )
        .unwrap();
        assert_eq!(res.class, "Market1");
        assert_eq!(res.keywords.market_id, Some(12_759_206));
        let ec = res.keywords.event_classifier_id;
        assert_eq!(ec.parent, Some(1));
        assert_eq!(ec.sport_id, Some(100_004));
        assert_eq!(ec.sport_group_id, Some(100_289));
        assert_eq!(ec.location_id, Some(5_100_309));
        assert_eq!(ec.event_id, Some(5_100_394));
    }

    #[test]
    fn unknown_segment_preserves_partial_keywords() {
        let err = resolve_segments(&["E_1", "ZZZ"]).unwrap_err();
        assert!(matches!(err, FrameError::UnknownTopicSegment(s) if s == "ZZZ"));
    }

    #[test]
    fn selection_path_resolves_under_market1() {
        let res = resolve_topic_path("AAPI/6/E/E_1/M/E_12759206/S/E_555").unwrap();
        assert_eq!(res.class, "Selection1");
        assert_eq!(res.keywords.market_id, Some(12_759_206));
        assert_eq!(res.keywords.selection_id, Some(555));
    }

    #[test]
    fn market_exchange_info_is_reached_through_market1() {
        let res = resolve_topic_path("AAPI/6/E/E_1/M/E_12759206/MEI").unwrap();
        assert_eq!(res.class, "MExchangeInfo");
        assert_eq!(res.keywords.market_id, Some(12_759_206));
    }

    #[test]
    fn exchange_info_without_a_market_segment_is_unknown() {
        // MEI is not a direct child of Event1 — it only exists once a
        // Market1 has been resolved.
        let err = resolve_topic_path("AAPI/6/E/E_1/MEI").unwrap_err();
        assert!(matches!(err, FrameError::UnknownTopicSegment(s) if s == "MEI"));
    }

    #[test]
    fn event_language_resolves_through_its_own_gateway() {
        let res = resolve_topic_path("AAPI/6/E/E_1/EL/EN").unwrap();
        assert_eq!(res.class, "Language4");
        assert_eq!(res.keywords.extra.get("event_language_code"), Some(&"EN".to_owned()));
    }

    #[test]
    fn tab_language_is_reached_through_exchange_info_and_tab1() {
        let res = resolve_topic_path("AAPI/6/E/E_1/EEI/TAB/MainMarkets/TL/EN").unwrap();
        assert_eq!(res.class, "Language14");
        assert_eq!(res.keywords.extra.get("grouping_name"), Some(&"MainMarkets".to_owned()));
        assert_eq!(res.keywords.extra.get("tab_language_code"), Some(&"EN".to_owned()));
    }
}

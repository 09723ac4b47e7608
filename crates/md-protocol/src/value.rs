use std::collections::BTreeMap;

/// Raw body structure after splitting on delimiters but before schema
/// interpretation: either a string leaf, or a 1-based-on-the-wire list of
/// sub-frames (each itself a map from order to `RawNode`).
///
/// This mirrors the data model in §3: "body: mapping from non-negative
/// integer index to either a string leaf, a list of sub-frames, or a
/// nested mapping" — the nested-mapping case is just an entry of a
/// single-element list in this representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    Leaf(String),
    List(Vec<BTreeMap<u32, RawNode>>),
}

impl RawNode {
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(s) => Some(s.as_str()),
            Self::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[BTreeMap<u32, RawNode>]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            Self::Leaf(_) => None,
        }
    }
}

/// A schema-interpreted field value, per the semantic types enumerated
/// in §3 ("Field descriptor").
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(chrono::DateTime<chrono::Utc>),
    /// Delimited list over `~`, each element rendered as its own leaf text.
    List(Vec<String>),
    /// Nested repeated group: one typed sub-record per 1-based list slot.
    Group(Vec<BTreeMap<u32, RawNode>>),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&[BTreeMap<u32, RawNode>]> {
        match self {
            Self::Group(v) => Some(v),
            _ => None,
        }
    }
}

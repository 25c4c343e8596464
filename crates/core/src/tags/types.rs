//! Tag field and value types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A descriptive tag field.
///
/// The declaration order is the injection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    Album,
    Artist,
    Title,
    Comment,
    Genre,
    Year,
    Track,
}

impl TagField {
    /// All fields in injection order.
    pub const ALL: [TagField; 7] = [
        Self::Album,
        Self::Artist,
        Self::Title,
        Self::Comment,
        Self::Genre,
        Self::Year,
        Self::Track,
    ];

    /// Lowercase field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Title => "title",
            Self::Comment => "comment",
            Self::Genre => "genre",
            Self::Year => "year",
            Self::Track => "track",
        }
    }

    /// Whether the field holds a number rather than text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Year | Self::Track)
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown tag field: {}", s))
    }
}

/// A tag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Number(u32),
}

impl TagValue {
    /// Empty text and zero numbers carry no information.
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Number(n) => *n == 0,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        Self::Number(value)
    }
}

/// Tags extracted from a source track.
///
/// Absent fields are omitted; blank values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    fields: BTreeMap<TagField, TagValue>,
}

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: TagField, value: impl Into<TagValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a value, trimming text and dropping blanks.
    ///
    /// Returns whether the value was stored.
    pub fn insert(&mut self, field: TagField, value: impl Into<TagValue>) -> bool {
        let value = match value.into() {
            TagValue::Text(text) => TagValue::Text(text.trim().to_string()),
            number => number,
        };

        if value.is_blank() {
            self.fields.remove(&field);
            return false;
        }

        self.fields.insert(field, value);
        true
    }

    /// Returns the value for a field.
    pub fn get(&self, field: TagField) -> Option<&TagValue> {
        self.fields.get(&field)
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates present fields in injection order.
    pub fn iter(&self) -> impl Iterator<Item = (TagField, &TagValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }
}

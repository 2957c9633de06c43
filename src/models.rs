use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use crate::tag::base_tag;

/// One parsed message: an insertion-ordered mapping from field name to value.
///
/// Field names are unique by construction. The only way to add a field is
/// [`FixMessage::add_tag`], which never overwrites an existing entry, and
/// there is no removal API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixMessage {
    pub(crate) fields: Vec<(String, String)>,
}

impl FixMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value stored under an exact field name (`"638"` or `"638_1"`)
    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, field_name: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field_name)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// Every value recorded for a base tag, in order of appearance
    pub fn fields_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(name, _)| base_tag(name) == tag)
            .map(|(_, value)| value.as_str())
    }
}

impl<'a> IntoIterator for &'a FixMessage {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

// Serialized as a JSON object whose keys keep insertion order
impl Serialize for FixMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A message together with where it came from in the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedMessage {
    /// 1-based index of the source line
    pub line_number: usize,

    /// Timestamp stripped from the line prefix, when present and parseable
    pub timestamp: Option<NaiveDateTime>,

    /// The parsed fields
    pub message: FixMessage,
}

impl ParsedMessage {
    pub fn new(line_number: usize, timestamp: Option<NaiveDateTime>, message: FixMessage) -> Self {
        Self {
            line_number,
            timestamp,
            message,
        }
    }
}

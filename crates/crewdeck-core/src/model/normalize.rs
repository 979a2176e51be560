//! Canonicalization of duck-typed wire values.
//!
//! The persistence layer's schema grew out of a dynamically-typed client and
//! still carries three union-shaped fields:
//!
//! - `tags` / `skills`: either an array of strings or one comma-joined
//!   string;
//! - assignee/manager references: either a bare id string, an object with
//!   an `id` field, or null;
//! - `estimatedHours`: either a JSON number or a numeric string.
//!
//! Every one of them is normalized to a single canonical shape **here**, at
//! the deserialization boundary, so nothing downstream (store, coordinator,
//! aggregation) ever branches on input shape.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MemberId;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// A normalized, ordered tag list.
///
/// Accepts `["api", "backend"]` or `"api, backend"` on input; always stores
/// trimmed, non-empty entries in input order and always serializes as an
/// array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Empty tag list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from any iterable of strings, trimming and dropping empties.
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            items
                .into_iter()
                .map(|item| item.as_ref().trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-joined tag string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_list(raw.split(','))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact-match membership test on the normalized entries.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl From<Vec<String>> for Tags {
    fn from(items: Vec<String>) -> Self {
        Self::from_list(items)
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Wire shape of a tag field before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagsWire {
    List(Vec<String>),
    Joined(String),
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = Option::<TagsWire>::deserialize(deserializer)?;
        Ok(match wire {
            Some(TagsWire::List(items)) => Self::from_list(items),
            Some(TagsWire::Joined(raw)) => Self::parse(&raw),
            None => Self::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Member references
// ---------------------------------------------------------------------------

/// Wire shape of an assignee/manager reference before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum MemberRefWire {
    Id(String),
    Object { id: String },
}

/// Deserialize a member reference that may arrive as a bare id string, an
/// object carrying an `id` field, or null. Empty ids normalize to `None`.
///
/// # Errors
///
/// Fails only when the value matches none of the accepted shapes.
pub fn member_ref<'de, D>(deserializer: D) -> Result<Option<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<MemberRefWire>::deserialize(deserializer)?;
    let id = match wire {
        Some(MemberRefWire::Id(id) | MemberRefWire::Object { id }) => id,
        None => return Ok(None),
    };

    let trimmed = id.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(MemberId::new(trimmed)))
    }
}

// ---------------------------------------------------------------------------
// Numeric strings
// ---------------------------------------------------------------------------

/// Wire shape of `estimatedHours` before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum HoursWire {
    Number(f64),
    Text(String),
}

/// Deserialize an hours estimate that may arrive as a number or a numeric
/// string. Non-numeric or non-finite values normalize to `None` rather than
/// failing the whole entity.
///
/// # Errors
///
/// Fails only when the value is neither a number, a string, nor null.
pub fn estimated_hours<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<HoursWire>::deserialize(deserializer)?;
    Ok(match wire {
        Some(HoursWire::Number(hours)) => Some(hours).filter(|h| h.is_finite()),
        Some(HoursWire::Text(raw)) => raw.trim().parse::<f64>().ok().filter(|h| h.is_finite()),
        None => None,
    })
}

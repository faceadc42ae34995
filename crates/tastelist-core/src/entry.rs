//! Shared bulk-add types passed between the parser, the resolver, and the orchestrator.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// One user-submitted restaurant entry, parsed but not yet matched to a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    /// The trimmed segment text this entry was parsed from.
    pub raw_text: String,
    pub name: String,
    pub description_hint: String,
    pub location_hint: String,
    /// Lowercased `#tag` tokens, without the leading `#`.
    pub tags: BTreeSet<String>,
}

impl DraftEntry {
    /// Text sent to the place search: name followed by the location hint.
    pub fn search_query(&self) -> String {
        [self.name.as_str(), self.location_hint.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn field(&self, field: EntryField) -> &str {
        match field {
            EntryField::Name => &self.name,
            EntryField::Description => &self.description_hint,
            EntryField::Location => &self.location_hint,
        }
    }

    pub(crate) fn field_mut(&mut self, field: EntryField) -> &mut String {
        match field {
            EntryField::Name => &mut self.name,
            EntryField::Description => &mut self.description_hint,
            EntryField::Location => &mut self.location_hint,
        }
    }

    /// Render back to the bulk-add line syntax, e.g. `"Joe's Pizza, NYC #italian"`.
    ///
    /// Fields are written in `order`; trailing empty fields are left out.
    pub fn render(&self, order: &FieldOrder) -> String {
        let mut fields: Vec<&str> = order.fields().iter().map(|f| self.field(*f)).collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        let mut line = fields.join(", ");
        for tag in &self.tags {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push('#');
            line.push_str(tag);
        }
        line
    }
}

/// One tentative match returned by the place search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque provider-assigned identifier.
    pub candidate_id: String,
    pub display_description: String,
}

/// Full place record for a chosen candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDetails {
    pub candidate_id: String,
    pub display_name: String,
    pub formatted_address: String,
}

/// A positional text field of a bulk-add line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Name,
    Description,
    Location,
}

impl EntryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::Name => "name",
            EntryField::Description => "description",
            EntryField::Location => "location",
        }
    }
}

impl FromStr for EntryField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(EntryField::Name),
            "description" | "desc" => Ok(EntryField::Description),
            "location" | "loc" => Ok(EntryField::Location),
            other => Err(ConfigError::UnknownField(other.to_string())),
        }
    }
}

/// Which field each comma-separated position of a line populates.
///
/// Always a permutation of the three [`EntryField`]s. Parses from and
/// serialises to a comma-separated string such as `"name,description,location"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldOrder([EntryField; 3]);

impl FieldOrder {
    pub fn new(fields: [EntryField; 3]) -> Result<Self, ConfigError> {
        let [a, b, c] = fields;
        if a == b || a == c || b == c {
            return Err(ConfigError::DuplicateField(
                FieldOrder(fields).to_string(),
            ));
        }
        Ok(Self(fields))
    }

    pub fn fields(&self) -> &[EntryField; 3] {
        &self.0
    }
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self([EntryField::Name, EntryField::Description, EntryField::Location])
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{},{},{}", a.as_str(), b.as_str(), c.as_str())
    }
}

impl FromStr for FieldOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(EntryField::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        let fields: [EntryField; 3] = parts
            .try_into()
            .map_err(|_| ConfigError::FieldCount(s.to_string()))?;
        Self::new(fields)
    }
}

impl TryFrom<String> for FieldOrder {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldOrder> for String {
    fn from(order: FieldOrder) -> Self {
        order.to_string()
    }
}

//! Free-text parser for bulk-add input.
//!
//! Each input line may hold several entries separated by `;`. Within an entry,
//! whitespace-delimited tokens starting with `#` are tags; the remaining text
//! is split on `,` and assigned positionally per the configured [`FieldOrder`].
//!
//! ```text
//! Joe's Pizza, slices, Carmine St #italian; Katz's, pastrami
//! └── name ──┘ └desc┘  └─ loc ──┘ └ tag ┘   └name┘ └ desc ┘
//! ```
//!
//! Positions past the third fold into the last field, so addresses with commas
//! survive. Malformed segments are dropped and reported, never fatal.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::entry::{DraftEntry, FieldOrder};

/// Why a segment produced no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    /// Empty or whitespace only.
    Blank,
    /// Nothing but `#tag` tokens.
    TagsOnly,
    /// Only separators, e.g. `" , , "`.
    NoFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseAnomaly {
    /// 1-based input line number.
    pub line: usize,
    pub segment: String,
    pub reason: AnomalyReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// Entries in input order.
    pub entries: Vec<DraftEntry>,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Parse bulk-add input into draft entries, in input order.
pub fn parse(raw: &str, order: &FieldOrder) -> Vec<DraftEntry> {
    parse_report(raw, order).entries
}

/// Parse bulk-add input, also reporting every dropped segment.
pub fn parse_report(raw: &str, order: &FieldOrder) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, line) in raw.lines().enumerate() {
        for segment in line.split(';') {
            match parse_segment(segment, order) {
                Ok(entry) => report.entries.push(entry),
                Err(reason) => {
                    debug!(line = idx + 1, ?reason, segment, "dropping bulk-add segment");
                    report.anomalies.push(ParseAnomaly {
                        line: idx + 1,
                        segment: segment.to_string(),
                        reason,
                    });
                }
            }
        }
    }

    report
}

fn parse_segment(segment: &str, order: &FieldOrder) -> Result<DraftEntry, AnomalyReason> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return Err(AnomalyReason::Blank);
    }

    let mut tags = BTreeSet::new();
    let mut words = Vec::new();
    for token in trimmed.split_whitespace() {
        if !token.contains('#') {
            words.push(token.to_string());
            continue;
        }
        // Commas inside a token still separate fields: `#italian,#cheap` is two tags.
        let pieces: Vec<&str> = token
            .split(',')
            .map(|piece| match piece.strip_prefix('#') {
                Some(tag) => {
                    let tag = tag.trim_start_matches('#').to_lowercase();
                    if !tag.is_empty() {
                        tags.insert(tag);
                    }
                    ""
                }
                None => piece,
            })
            .collect();
        let rest = pieces.join(",");
        if !rest.is_empty() {
            words.push(rest);
        }
    }
    let only_separators = words.iter().all(|w| w.chars().all(|c| c == ','));
    if words.is_empty() || (only_separators && !tags.is_empty()) {
        return Err(AnomalyReason::TagsOnly);
    }

    let text = words.join(" ");
    let mut fields = text.split(',').map(str::trim);
    let mut entry = DraftEntry {
        raw_text: trimmed.to_string(),
        name: String::new(),
        description_hint: String::new(),
        location_hint: String::new(),
        tags,
    };

    let [first, second, last] = *order.fields();
    *entry.field_mut(first) = fields.next().unwrap_or_default().to_string();
    *entry.field_mut(second) = fields.next().unwrap_or_default().to_string();
    *entry.field_mut(last) = fields
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if entry.name.is_empty() && entry.description_hint.is_empty() && entry.location_hint.is_empty()
    {
        return Err(AnomalyReason::NoFields);
    }
    Ok(entry)
}

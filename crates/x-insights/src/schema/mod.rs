//! Schema normalization: header aliasing, cell coercion and the two
//! canonical record normalizers.
//!
//! Each normalizer is a pure function of the parsed rows and header list.
//! Data-quality problems never fail a call; they are counted and reported
//! in [`NormalizationResult::warnings`](crate::types::NormalizationResult).

pub mod alias;
pub mod coerce;
mod content;
mod overview;

pub use alias::{AliasTable, HeaderMap, ResolvedColumn, build_header_map};
pub use coerce::{parse_number, parse_timestamp, to_date_key, to_text, to_timestamp_iso};
pub use content::{CONTENT_ALIASES, CONTENT_OPTIONAL, CONTENT_REQUIRED, normalize_content};
pub use overview::{OVERVIEW_ALIASES, OVERVIEW_OPTIONAL, OVERVIEW_REQUIRED, normalize_overview};

use crate::tokenizer::RawRow;
use crate::types::{CanonicalField, NumericField};

/// Per-field tally of invalid optional values, kept in schema order.
#[derive(Debug)]
pub(crate) struct InvalidCounts {
    counts: Vec<(CanonicalField, usize)>,
}

impl InvalidCounts {
    pub(crate) fn new(fields: &[CanonicalField]) -> Self {
        Self {
            counts: fields.iter().map(|f| (*f, 0)).collect(),
        }
    }

    /// Parse the optional numeric `field` from `row`, counting invalid cells.
    pub(crate) fn parse(
        &mut self,
        header_map: &HeaderMap,
        row: &RawRow,
        field: CanonicalField,
    ) -> NumericField {
        let Some(index) = header_map.index(field) else {
            return NumericField::Missing;
        };
        let value = parse_number(row.cell(index));
        if value.is_invalid()
            && let Some(slot) = self.counts.iter_mut().find(|(f, _)| *f == field)
        {
            slot.1 += 1;
        }
        value
    }

    /// One warning per field with invalid values; `subject` is `"row(s)"` or
    /// `"overview row(s)"`.
    pub(crate) fn into_warnings(self, subject: &str) -> impl Iterator<Item = String> {
        let subject = subject.to_string();
        self.counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(move |(field, count)| {
                format!(
                    "{count} {subject} had invalid \"{}\" values and were treated as missing.",
                    field.label()
                )
            })
    }
}

//! Header alias resolution.

use crate::types::CanonicalField;
use crate::utils::normalize_header;

/// Canonical field -> accepted header spellings, in preference order.
pub type AliasTable = &'static [(CanonicalField, &'static [&'static str])];

/// A literal header that a canonical field resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub header: String,
    pub index: usize,
}

/// Result of resolving one file's headers against an alias table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(CanonicalField, Option<ResolvedColumn>)>,
}

impl HeaderMap {
    /// The literal header `field` resolved to.
    pub fn header(&self, field: CanonicalField) -> Option<&str> {
        self.resolved(field).map(|c| c.header.as_str())
    }

    /// Column position of the header `field` resolved to.
    pub fn index(&self, field: CanonicalField) -> Option<usize> {
        self.resolved(field).map(|c| c.index)
    }

    /// The subset of `fields` with no resolved header, order preserved.
    pub fn missing(&self, fields: &[CanonicalField]) -> Vec<CanonicalField> {
        fields
            .iter()
            .copied()
            .filter(|f| self.resolved(*f).is_none())
            .collect()
    }

    fn resolved(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, c)| c.as_ref())
    }
}

/// Map every canonical field of `aliases` to one of `fields`, or to nothing.
///
/// An exact match on the normalized form wins, trying aliases in order.
/// Otherwise the first header (in header order) whose normalized form
/// contains any normalized alias is taken. Headers that normalize
/// identically collapse onto the last of them.
pub fn build_header_map(fields: &[String], aliases: AliasTable) -> HeaderMap {
    // normalized header -> (literal header, index); first-seen order, last value wins
    let mut normalized: Vec<(String, ResolvedColumn)> = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let key = normalize_header(field);
        let column = ResolvedColumn {
            header: field.clone(),
            index,
        };
        match normalized.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = column,
            None => normalized.push((key, column)),
        }
    }

    let entries = aliases
        .iter()
        .map(|(canonical, alias_list)| {
            let alias_keys: Vec<String> = alias_list.iter().map(|a| normalize_header(a)).collect();

            let exact = alias_keys.iter().find_map(|alias| {
                normalized
                    .iter()
                    .find(|(key, _)| key == alias)
                    .map(|(_, column)| column.clone())
            });

            let matched = exact.or_else(|| {
                normalized
                    .iter()
                    .find(|(key, _)| alias_keys.iter().any(|alias| key.contains(alias.as_str())))
                    .map(|(_, column)| column.clone())
            });

            (*canonical, matched)
        })
        .collect();

    HeaderMap { entries }
}

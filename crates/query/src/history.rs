//! Browser-history token codec.
//!
//! The set of currently shown panel cursors is folded into one short string
//! so back/forward navigation (or an external link) can replay the exact
//! panel configuration: `raw_query&qp=H1.5:W1.4:F1.4.21` where each entry is
//! `TypeIndex.ShownCount[.FirstOffset]` and the offset is omitted when it
//! equals 1.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{PanelKey, QueryType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const PANEL_MARKER: &str = "&qp=";
const PANEL_SEPARATOR: char = ':';

/// Pagination cursor of one panel as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelCursor {
    pub panel: PanelKey,
    /// Number of entries currently shown.
    pub shown: u32,
    /// First shown entry, 1-based.
    pub first: u32,
}

impl PanelCursor {
    pub fn new(panel: PanelKey, shown: u32) -> Self {
        Self {
            panel,
            shown,
            first: 1,
        }
    }

    pub fn with_first(panel: PanelKey, shown: u32, first: u32) -> Self {
        Self {
            panel,
            shown,
            first,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// A token section matched no known panel request shape.
    #[error("no matching panel request for history entry {entry:?}")]
    NoMatchingPanelRequest { entry: String },
}

/// Encode the raw query plus every known panel cursor into one token.
pub fn encode(raw_query: &str, cursors: &[PanelCursor]) -> String {
    if cursors.is_empty() {
        return raw_query.to_string();
    }
    let entries = cursors
        .iter()
        .map(|c| {
            if c.first == 1 {
                format!("{}.{}", c.panel, c.shown)
            } else {
                format!("{}.{}.{}", c.panel, c.shown, c.first)
            }
        })
        .collect::<Vec<_>>()
        .join(&PANEL_SEPARATOR.to_string());
    format!("{}{}{}", raw_query, PANEL_MARKER, entries)
}

/// Decode a token back into the raw query and its panel cursors.
///
/// A token without a panel marker is a bare query with no cursors. Any
/// malformed entry fails the whole decode; navigation then falls back to
/// the deployment default cursor set (see [`decode_or_defaults`]).
pub fn decode(token: &str) -> Result<(String, Vec<PanelCursor>), HistoryError> {
    static ENTRY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^([A-Za-z])([0-9]+)\.([0-9]+)(?:\.([0-9]+))?$").expect("history entry regex")
    });

    let Some(marker_at) = token.rfind(PANEL_MARKER) else {
        return Ok((token.to_string(), Vec::new()));
    };
    let raw_query = &token[..marker_at];
    let entries = &token[marker_at + PANEL_MARKER.len()..];

    let mut cursors = Vec::new();
    for entry in entries.split(PANEL_SEPARATOR) {
        let caps = ENTRY.captures(entry).ok_or_else(|| {
            HistoryError::NoMatchingPanelRequest {
                entry: entry.to_string(),
            }
        })?;
        let letter = caps[1].chars().next().unwrap_or('\0');
        let query_type = QueryType::from_letter(letter).ok_or_else(|| {
            HistoryError::NoMatchingPanelRequest {
                entry: entry.to_string(),
            }
        })?;
        let index: u8 = caps[2]
            .parse()
            .map_err(|_| HistoryError::NoMatchingPanelRequest {
                entry: entry.to_string(),
            })?;
        let shown: u32 = caps[3]
            .parse()
            .map_err(|_| HistoryError::NoMatchingPanelRequest {
                entry: entry.to_string(),
            })?;
        let first: u32 = match caps.get(4) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| HistoryError::NoMatchingPanelRequest {
                    entry: entry.to_string(),
                })?,
            None => 1,
        };
        cursors.push(PanelCursor::with_first(
            PanelKey::new(query_type, index),
            shown,
            first,
        ));
    }
    Ok((raw_query.to_string(), cursors))
}

/// Decode, falling back to `defaults` when the token is malformed. Panels
/// absent from a well-formed token also come from `defaults`.
pub fn decode_or_defaults(token: &str, defaults: &[PanelCursor]) -> (String, Vec<PanelCursor>) {
    match decode(token) {
        Ok((raw, mut cursors)) => {
            for d in defaults {
                if !cursors.iter().any(|c| c.panel == d.panel) {
                    cursors.push(*d);
                }
            }
            (raw, cursors)
        }
        Err(_) => {
            // Malformed token: keep what looks like the query, use the
            // default cursor set for every panel.
            let raw = token
                .rfind(PANEL_MARKER)
                .map(|at| token[..at].to_string())
                .unwrap_or_else(|| token.to_string());
            (raw, defaults.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cursor(letter: char, index: u8, shown: u32, first: u32) -> PanelCursor {
        PanelCursor::with_first(
            PanelKey::new(QueryType::from_letter(letter).unwrap(), index),
            shown,
            first,
        )
    }

    #[test]
    fn encodes_scenario_token() {
        let cursors = [
            cursor('H', 1, 5, 1),
            cursor('W', 1, 4, 1),
            cursor('F', 1, 4, 1),
        ];
        assert_eq!(encode("inf*", &cursors), "inf*&qp=H1.5:W1.4:F1.4");
    }

    #[test]
    fn offset_emitted_only_when_not_one() {
        let cursors = [cursor('H', 1, 5, 21)];
        assert_eq!(encode("tree", &cursors), "tree&qp=H1.5.21");
    }

    #[rstest]
    #[case("inf*", &[])]
    #[case("inf*", &[cursor('H', 1, 5, 1)])]
    #[case("", &[cursor('W', 1, 4, 1), cursor('F', 2, 8, 9)])]
    #[case("a b*", &[cursor('H', 1, 5, 21), cursor('F', 1, 4, 1), cursor('F', 2, 4, 5)])]
    #[case("p[q", &[cursor('P', 1, 4, 1), cursor('Y', 1, 1, 1), cursor('T', 1, 2, 3)])]
    fn round_trip(#[case] raw: &str, #[case] cursors: &[PanelCursor]) {
        let token = encode(raw, cursors);
        let (decoded_raw, decoded) = decode(&token).unwrap();
        assert_eq!(decoded_raw, raw);
        assert_eq!(decoded, cursors);
        // Idempotence: re-encoding the decoded set yields the same token.
        assert_eq!(encode(&decoded_raw, &decoded), token);
    }

    #[test]
    fn bare_query_decodes_without_cursors() {
        assert_eq!(decode("graph*").unwrap(), ("graph*".to_string(), vec![]));
    }

    #[rstest]
    #[case("inf*&qp=H1")]
    #[case("inf*&qp=X1.5")]
    #[case("inf*&qp=H1.5:bogus")]
    #[case("inf*&qp=H.5")]
    fn malformed_entries_are_rejected(#[case] token: &str) {
        assert!(matches!(
            decode(token),
            Err(HistoryError::NoMatchingPanelRequest { .. })
        ));
    }

    #[test]
    fn malformed_token_falls_back_to_defaults() {
        let defaults = [cursor('H', 1, 5, 1), cursor('W', 1, 4, 1)];
        let (raw, cursors) = decode_or_defaults("inf*&qp=garbage", &defaults);
        assert_eq!(raw, "inf*");
        assert_eq!(cursors, defaults);
    }

    #[test]
    fn defaults_fill_in_missing_panels() {
        let defaults = [cursor('H', 1, 5, 1), cursor('W', 1, 4, 1)];
        let (raw, cursors) = decode_or_defaults("inf*&qp=H1.10", &defaults);
        assert_eq!(raw, "inf*");
        assert_eq!(cursors, vec![cursor('H', 1, 10, 1), cursor('W', 1, 4, 1)]);
    }
}

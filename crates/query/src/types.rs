use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One result-panel kind, selected by its single-letter tag.
///
/// The letter set is closed: every panel the UI can show corresponds to
/// exactly one variant, and dispatch happens through a single `match`
/// instead of building method names from letters at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QueryType {
    /// `H` — document hits
    Hits,
    /// `W` — word completions
    Words,
    /// `C` — category refinements
    Categories,
    /// `F` — facet refinements, one box per configured facet name
    Facets,
    /// `J` — join lookups expanded from a trailing open bracket
    Joins,
    /// `Y` — class disambiguation, two-phase
    ClassDisambiguation,
    /// `T` — translation lookups, two-phase
    Translation,
    /// `R` — relation lookups
    Relations,
    /// `P` — precomputed facets, partitioned from one combined query
    PrecomputedFacets,
}

impl QueryType {
    pub const ALL: [QueryType; 9] = [
        QueryType::Hits,
        QueryType::Words,
        QueryType::Categories,
        QueryType::Facets,
        QueryType::Joins,
        QueryType::ClassDisambiguation,
        QueryType::Translation,
        QueryType::Relations,
        QueryType::PrecomputedFacets,
    ];

    pub fn letter(self) -> char {
        match self {
            QueryType::Hits => 'H',
            QueryType::Words => 'W',
            QueryType::Categories => 'C',
            QueryType::Facets => 'F',
            QueryType::Joins => 'J',
            QueryType::ClassDisambiguation => 'Y',
            QueryType::Translation => 'T',
            QueryType::Relations => 'R',
            QueryType::PrecomputedFacets => 'P',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        QueryType::ALL
            .into_iter()
            .find(|t| t.letter() == letter.to_ascii_uppercase())
    }

    /// Panels whose backend reply is a completion list rather than hits.
    pub fn is_completion_panel(self) -> bool {
        !matches!(
            self,
            QueryType::Hits | QueryType::Joins | QueryType::Relations
        )
    }

    /// Panels that render one group per facet name.
    pub fn is_facet_panel(self) -> bool {
        matches!(self, QueryType::Facets | QueryType::PrecomputedFacets)
    }

    /// Panels that must resolve the trailing input token before the main
    /// query can run.
    pub fn is_two_phase(self) -> bool {
        matches!(self, QueryType::ClassDisambiguation | QueryType::Translation)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a query type letter: {0:?}")]
pub struct TypeLetterError(pub char);

impl FromStr for QueryType {
    type Err = TypeLetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => QueryType::from_letter(c).ok_or(TypeLetterError(c)),
            (Some(c), Some(_)) => Err(TypeLetterError(c)),
            (None, _) => Err(TypeLetterError('\0')),
        }
    }
}

/// Identifies one panel: a query type plus a 1-based index.
///
/// The index only matters for facet-shaped panels, which can appear several
/// times (one per facet name); everything else uses index 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelKey {
    pub query_type: QueryType,
    pub index: u8,
}

impl PanelKey {
    pub fn new(query_type: QueryType, index: u8) -> Self {
        Self { query_type, index }
    }

    /// The first (usually only) panel of a type.
    pub fn of(query_type: QueryType) -> Self {
        Self::new(query_type, 1)
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.query_type.letter(), self.index)
    }
}

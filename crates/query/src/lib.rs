pub mod history;
pub mod query;
pub mod rewrite;
pub mod types;

pub use history::{HistoryError, PanelCursor, decode, decode_or_defaults, encode};
pub use query::Query;
pub use rewrite::{
    Followup, RewriteOptions, Rewritten, rewrite, rewrite_facet, substitute_trailing,
};
pub use types::{PanelKey, QueryType, TypeLetterError};

//! The per-type query rewrite pipeline.
//!
//! Raw user input goes through a fixed sequence of textual transformations
//! into the backend query dialect. The rules are ordered; swapping two of
//! them changes behavior (e.g. stars must be appended before the trailing
//! join bracket is expanded, so the join key carries the wildcard).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::QueryType;

#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Tokens at or above this length get a trailing wildcard.
    pub min_word_length_for_star: usize,
    /// Target language for translation lookups.
    pub translation_language: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            min_word_length_for_star: 3,
            translation_language: "en".to_string(),
        }
    }
}

/// A dependent lookup that must run before the panel's main query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    /// Resolve the trailing token to zero, one or many entity classes.
    ResolveClass { token: String },
    /// Resolve the trailing token to zero, one or many translations.
    ResolveTranslation { token: String, language: String },
}

impl Followup {
    /// The backend query that performs the resolve round-trip.
    pub fn resolve_query(&self) -> String {
        match self {
            Followup::ResolveClass { token } => {
                format!(":class:{}*", token.to_lowercase())
            }
            Followup::ResolveTranslation { token, language } => {
                format!(":translation:{}:{}*", language, token.to_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub query: String,
    pub followup: Option<Followup>,
}

impl Rewritten {
    fn plain(query: String) -> Self {
        Self {
            query,
            followup: None,
        }
    }
}

/// Rewrite `raw` into the backend dialect for the given panel type.
///
/// Facet panels take their facet name through [`rewrite_facet`] instead;
/// calling this with [`QueryType::Facets`] yields the bare rewritten query
/// the facet word is appended to.
pub fn rewrite(kind: QueryType, raw: &str, opts: &RewriteOptions) -> Rewritten {
    match kind {
        QueryType::Hits | QueryType::Words | QueryType::Joins | QueryType::Facets => {
            Rewritten::plain(pipeline(raw, opts))
        }
        QueryType::Categories => {
            let base = pipeline(raw, opts);
            Rewritten::plain(append_word(&base, ":category:*"))
        }
        QueryType::PrecomputedFacets => {
            let base = pipeline(raw, opts);
            Rewritten::plain(append_word(&base, ":facetid:*"))
        }
        QueryType::Relations => {
            let base = pipeline(raw, opts);
            Rewritten::plain(relation_form(&base))
        }
        QueryType::ClassDisambiguation => Rewritten {
            query: pipeline(raw, opts),
            followup: last_raw_token(raw).map(|token| Followup::ResolveClass { token }),
        },
        QueryType::Translation => Rewritten {
            query: pipeline(raw, opts),
            followup: last_raw_token(raw).map(|token| Followup::ResolveTranslation {
                token,
                language: opts.translation_language.clone(),
            }),
        },
    }
}

/// Rewrite for one facet box: the base query plus the facet word
/// `:facet:<name>:*`. The facet word is not appended twice.
pub fn rewrite_facet(raw: &str, facet_name: &str, opts: &RewriteOptions) -> String {
    let base = pipeline(raw, opts);
    let facet_word = format!(":facet:{}:*", facet_name.to_lowercase());
    if base.ends_with(&facet_word) {
        return base;
    }
    append_word(&base, &facet_word)
}

/// Replace the trailing whitespace token of `raw` with `replacement`.
///
/// Used after a two-phase resolve found exactly one match: the resolved
/// backend word stands in for what the user typed.
pub fn substitute_trailing(raw: &str, replacement: &str) -> String {
    match raw.trim_end().rsplit_once(char::is_whitespace) {
        Some((head, _)) => format!("{} {}", head.trim_end(), replacement),
        None if raw.trim().is_empty() => replacement.to_string(),
        None => replacement.to_string(),
    }
}

fn last_raw_token(raw: &str) -> Option<String> {
    raw.split_whitespace().last().map(str::to_string)
}

fn append_word(base: &str, word: &str) -> String {
    if base.is_empty() {
        word.to_string()
    } else {
        format!("{} {}", base, word)
    }
}

/// Relations share the hit-shaped path over a `:relation:` word on the
/// trailing token.
fn relation_form(base: &str) -> String {
    match base.rsplit_once(' ') {
        Some((head, last)) => format!("{} :relation:{}", head, last),
        None if base.is_empty() => base.to_string(),
        None => format!(":relation:{}", base),
    }
}

/// The ordered common pipeline (rules 1–5).
fn pipeline(raw: &str, opts: &RewriteOptions) -> String {
    let s = squeeze_whitespace(raw);
    let s = tag_typed_facets(&s);
    let s = collapse_namespace_markers(&s);
    let s = normalize_separators(&s);
    let s = lowercase_and_star(&s, opts.min_word_length_for_star);
    expand_join_bracket(&s)
}

fn squeeze_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rule 1: a token shaped `name:value` is a typed facet expression and
/// becomes the dialect word `:facet:name:value`.
fn tag_typed_facets(s: &str) -> String {
    static TYPED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_]*):(\S+)$").expect("typed facet regex"));
    s.split(' ')
        .map(|token| match TYPED.captures(token) {
            Some(caps) => format!(":facet:{}:{}", &caps[1], &caps[2]),
            None => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rule 2: collapse runs of the namespace marker left over from pasted or
/// already-rewritten input.
fn collapse_namespace_markers(s: &str) -> String {
    static RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r":{2,}").expect("marker regex"));
    RUNS.replace_all(s, ":").into_owned()
}

/// Rule 3: hyphen and apostrophe both become the phrase separator dot,
/// except that `--` range operators are preserved.
fn normalize_separators(s: &str) -> String {
    const RANGE: &str = "\u{1}";
    s.replace("--", RANGE)
        .replace(['-', '\''], ".")
        .replace(RANGE, "--")
}

/// Rule 4: lower-case each plain token and append a trailing wildcard to
/// tokens at or above the minimum length. Namespaced and quoted words pass
/// through verbatim (facet words keep their case); tokens without letters
/// (numbers, ranges) and `$`-anchored tokens never get a star.
fn lowercase_and_star(s: &str, min_len: usize) -> String {
    s.split(' ')
        .map(|token| {
            if token.starts_with(':') || token.starts_with('"') {
                return token.to_string();
            }
            // A trailing open bracket splits the token into independently
            // starred segments so the join key keeps its wildcard.
            token
                .split('[')
                .map(|seg| star_segment(seg, min_len))
                .collect::<Vec<_>>()
                .join("[")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn star_segment(seg: &str, min_len: usize) -> String {
    let lower = seg.to_lowercase();
    if let Some(anchored) = lower.strip_suffix('$') {
        // `word$` means exact match: drop the anchor, never star.
        return anchored.to_string();
    }
    if lower.ends_with('*') || !lower.chars().any(|c| c.is_alphabetic()) {
        return lower;
    }
    if lower.chars().count() >= min_len.max(1) {
        return format!("{}*", lower);
    }
    lower
}

/// Rule 5: a trailing open join bracket `key[a b c` expands into one
/// cross-product clause per bracketed token, joined on the starred key.
fn expand_join_bracket(s: &str) -> String {
    static BRACKET: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(.*?)([^\s\[]+)\[([^\]]*)$").expect("join bracket regex"));
    let Some(caps) = BRACKET.captures(s) else {
        return s.to_string();
    };
    let prefix = &caps[1];
    let key = caps[2].trim_end_matches('*');
    let items: Vec<&str> = caps[3].split_whitespace().collect();
    if items.is_empty() {
        return format!("{}{}*", prefix, key);
    }
    let clauses = items
        .iter()
        .map(|item| format!("{}*.{}", key, item))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}{}", prefix, clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn opts() -> RewriteOptions {
        RewriteOptions::default()
    }

    #[rstest]
    #[case("inf", "inf*")]
    #[case("graph theory", "graph* theory*")]
    #[case("ab", "ab")]
    #[case("INF", "inf*")]
    #[case("inf*", "inf*")]
    #[case("2023", "2023")]
    #[case("1990--2000", "1990--2000")]
    #[case("knuth-morris", "knuth.morris*")]
    #[case("o'reilly", "o.reilly*")]
    #[case("word$", "word")]
    #[case("  spaced   out  ", "spaced* out*")]
    fn star_and_separator_rules(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(rewrite(QueryType::Hits, raw, &opts()).query, expected);
    }

    #[test]
    fn typed_facet_token_is_tagged() {
        assert_eq!(
            rewrite(QueryType::Hits, "author:smith", &opts()).query,
            ":facet:author:smith"
        );
    }

    #[test]
    fn namespaced_words_pass_verbatim() {
        assert_eq!(
            rewrite(QueryType::Hits, ":facet:Author:* graph", &opts()).query,
            ":facet:Author:* graph*"
        );
    }

    #[test]
    fn marker_runs_collapse() {
        assert_eq!(
            rewrite(QueryType::Hits, "::facet:author:smith", &opts()).query,
            ":facet:author:smith"
        );
    }

    #[test]
    fn join_bracket_expands_cross_product() {
        assert_eq!(
            rewrite(QueryType::Joins, "author[john paul", &opts()).query,
            "author*.john* author*.paul*"
        );
    }

    #[test]
    fn join_bracket_keeps_prefix() {
        assert_eq!(
            rewrite(QueryType::Joins, "graph author[erdos", &opts()).query,
            "graph* author*.erdos*"
        );
    }

    #[test]
    fn empty_join_bracket_degrades_to_starred_key() {
        assert_eq!(rewrite(QueryType::Joins, "author[", &opts()).query, "author*");
    }

    #[test]
    fn closed_brackets_left_alone() {
        let rewritten = rewrite(QueryType::Hits, "alpha[x]", &opts());
        assert_eq!(rewritten.query, "alpha*[x]");
    }

    #[test]
    fn categories_append_category_word() {
        assert_eq!(
            rewrite(QueryType::Categories, "inf", &opts()).query,
            "inf* :category:*"
        );
    }

    #[test]
    fn precomputed_facets_use_combined_query() {
        assert_eq!(
            rewrite(QueryType::PrecomputedFacets, "inf", &opts()).query,
            "inf* :facetid:*"
        );
    }

    #[test]
    fn facet_box_query_appends_facet_word_once() {
        let q = rewrite_facet("inf", "Author", &opts());
        assert_eq!(q, "inf* :facet:author:*");
        // Re-running over an already-suffixed query must not double it.
        assert_eq!(rewrite_facet("inf* :facet:author:*", "Author", &opts()), q);
    }

    #[test]
    fn empty_query_facet_box() {
        assert_eq!(rewrite_facet("", "year", &opts()), ":facet:year:*");
    }

    #[test]
    fn relations_wrap_trailing_token() {
        assert_eq!(
            rewrite(QueryType::Relations, "graph euler", &opts()).query,
            "graph* :relation:euler*"
        );
    }

    #[test]
    fn class_disambiguation_requests_resolve() {
        let rewritten = rewrite(QueryType::ClassDisambiguation, "graph Euler", &opts());
        assert_eq!(
            rewritten.followup,
            Some(Followup::ResolveClass {
                token: "Euler".to_string()
            })
        );
        assert_eq!(
            rewritten.followup.unwrap().resolve_query(),
            ":class:euler*"
        );
    }

    #[test]
    fn translation_requests_resolve_in_configured_language() {
        let mut o = opts();
        o.translation_language = "de".to_string();
        let rewritten = rewrite(QueryType::Translation, "tree", &o);
        assert_eq!(
            rewritten.followup.unwrap().resolve_query(),
            ":translation:de:tree*"
        );
    }

    #[test]
    fn substitute_trailing_token() {
        assert_eq!(
            substitute_trailing("graph euler", ":class:person:euler"),
            "graph :class:person:euler"
        );
        assert_eq!(substitute_trailing("euler", ":class:person:euler"), ":class:person:euler");
    }
}

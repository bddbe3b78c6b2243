//! UI strings for panel headings, keyed by language.
//!
//! Lookup never fails: an unknown language falls back to English, an
//! unknown key renders as the bracketed key itself so the gap is visible
//! instead of fatal.

const DEFAULT_LANGUAGE: &str = "en";

static TEXTS: &[(&str, &str, &str)] = &[
    ("en", "hits-title", "Hits {first} - {last} of {total}"),
    ("en", "hits-title-all", "Hits ({total})"),
    ("en", "no-hits-title", "Zoomed in on no document"),
    ("en", "one-hit-title", "Zoomed in on 1 document"),
    ("en", "words-title", "Zoom in on {total} words"),
    ("en", "one-word-title", "Zoom in on 1 word"),
    ("en", "no-words-title", "No completions"),
    ("en", "categories-title", "Refine by category ({total})"),
    ("en", "facet-title", "Refine by {name} ({total})"),
    ("en", "joins-title", "Matching entries ({total})"),
    ("en", "relations-title", "Related entries ({total})"),
    ("en", "classes-title", "Did you mean"),
    ("en", "translation-title", "Also try"),
    ("en", "top", "top {count}"),
    ("en", "all", "all {count}"),
    ("en", "more-hits", "more hits"),
    ("en", "query-too-short", "Please type at least {min} characters"),
    ("en", "backend-error", "Search backend unavailable"),
    ("de", "hits-title", "Treffer {first} - {last} von {total}"),
    ("de", "no-hits-title", "Kein Dokument gefunden"),
    ("de", "one-hit-title", "1 Dokument gefunden"),
    ("de", "words-title", "Verfeinern: {total} W\u{f6}rter"),
    ("de", "top", "top {count}"),
    ("de", "all", "alle {count}"),
    ("de", "backend-error", "Suchserver nicht erreichbar"),
];

pub struct TextStore {
    language: String,
}

impl TextStore {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        TEXTS
            .iter()
            .find(|(lang, k, _)| *lang == self.language && *k == key)
            .or_else(|| {
                TEXTS
                    .iter()
                    .find(|(lang, k, _)| *lang == DEFAULT_LANGUAGE && *k == key)
            })
            .map(|(_, _, text)| *text)
    }

    pub fn get(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(text) => text.to_string(),
            None => format!("[{key}]"),
        }
    }

    /// Fetch and substitute `{placeholder}` occurrences.
    pub fn format(&self, key: &str, substitutions: &[(&str, String)]) -> String {
        let mut text = self.get(key);
        for (placeholder, value) in substitutions {
            text = text.replace(&format!("{{{placeholder}}}"), value);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution() {
        let texts = TextStore::new("en");
        assert_eq!(
            texts.format(
                "hits-title",
                &[
                    ("first", "1".to_string()),
                    ("last", "5".to_string()),
                    ("total", "312".to_string())
                ]
            ),
            "Hits 1 - 5 of 312"
        );
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let texts = TextStore::new("fr");
        assert_eq!(texts.get("no-hits-title"), "Zoomed in on no document");
    }

    #[test]
    fn partially_translated_language_mixes_in_english() {
        let texts = TextStore::new("de");
        assert_eq!(texts.get("no-hits-title"), "Kein Dokument gefunden");
        assert_eq!(texts.get("more-hits"), "more hits");
    }

    #[test]
    fn unknown_key_is_visible_not_fatal() {
        let texts = TextStore::new("en");
        assert_eq!(texts.get("nope"), "[nope]");
    }
}

//! Decoder for the backend's structured payload.
//!
//! The backend replies with JSON of the shape
//! `{"result": {"status", "query", "time": {"text"}, "completions":
//! {"@total", "@sent", "c": [..]}, "hits": {"@total", "@sent", "@first",
//! "hit": [..]}}}`. Counts arrive as strings, a section with exactly one
//! entry arrives as a bare object instead of a one-element array, and any
//! child list may be missing entirely. None of that is an error; malformed
//! JSON or a missing `result` is.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ParseError;

/// One backend-suggested completion with its counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Raw tagged string, e.g. `:facet:author:john_smith` or a plain word.
    pub text: String,
    pub score: f64,
    pub doc_count: u64,
    pub occ_count: u64,
}

impl Completion {
    /// The payload after the last namespace tag segment, e.g.
    /// `john_smith` for `:facet:author:john_smith`.
    pub fn payload(&self) -> &str {
        match self.text.rfind(':') {
            Some(at) if self.text.starts_with(':') => &self.text[at + 1..],
            _ => &self.text,
        }
    }

    /// The facet name embedded in a `:facet:<name>:<payload>` or
    /// `:facetid:<name>:<payload>` word.
    pub fn facet_name(&self) -> Option<&str> {
        let rest = self
            .text
            .strip_prefix(":facetid:")
            .or_else(|| self.text.strip_prefix(":facet:"))?;
        rest.split(':').next().filter(|name| !name.is_empty())
    }
}

/// One backend-returned document.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: f64,
    /// Flat attribute map (title, author, year, url, ...).
    pub attributes: BTreeMap<String, String>,
    pub excerpts: Vec<String>,
}

/// One counted section of the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    pub total: u64,
    pub sent: u64,
    /// First entry of the section, one-based.
    pub first: u64,
    pub items: Vec<T>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            total: 0,
            sent: 0,
            first: 1,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBody {
    pub status: String,
    /// The query string as the backend echoed it.
    pub query: String,
    /// Backend-reported processing time in milliseconds.
    pub backend_ms: f64,
    pub completions: Section<Completion>,
    pub hits: Section<Hit>,
}

/// Decode one payload. Fails closed: anything that does not parse becomes
/// a typed [`ParseError`], never a panic.
pub fn decode(payload: &str) -> Result<ResponseBody, ParseError> {
    if payload.trim().is_empty() {
        return Err(ParseError::MissingPayload);
    }
    let value: Value = serde_json::from_str(payload)?;
    let result = value.get("result").ok_or(ParseError::MissingField("result"))?;

    let status = result
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("OK")
        .to_string();
    let query = result
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let backend_ms = result
        .get("time")
        .and_then(|t| t.get("text"))
        .map(as_f64)
        .unwrap_or(0.0);

    let completions = decode_section(result.get("completions"), "c", decode_completion)?;
    let mut hits = decode_section(result.get("hits"), "hit", decode_hit)?;
    // The wire index is zero-based; everything client-facing is one-based.
    if let Some(section) = result.get("hits") {
        hits.first = as_u64(section.get("@first").unwrap_or(&Value::Null)) + 1;
    }
    Ok(ResponseBody {
        status,
        query,
        backend_ms,
        completions,
        hits,
    })
}

fn decode_section<T>(
    section: Option<&Value>,
    item_key: &'static str,
    decode_item: fn(&Value) -> Result<T, ParseError>,
) -> Result<Section<T>, ParseError> {
    let Some(section) = section else {
        return Ok(Section::default());
    };
    let total = as_u64(section.get("@total").unwrap_or(&Value::Null));
    let sent = as_u64(section.get("@sent").unwrap_or(&Value::Null));
    let items = match section.get(item_key) {
        None | Some(Value::Null) => Vec::new(),
        // A single entry arrives as a bare object, not a one-element array.
        Some(Value::Object(_)) => vec![decode_item(section.get(item_key).unwrap_or(&Value::Null))?],
        Some(Value::Array(values)) => values
            .iter()
            .map(decode_item)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(ParseError::MissingField(item_key)),
    };
    Ok(Section {
        total,
        sent,
        first: 1,
        items,
    })
}

fn decode_completion(value: &Value) -> Result<Completion, ParseError> {
    let text = value
        .get("text")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingField("text"))?
        .to_string();
    Ok(Completion {
        text,
        score: value.get("@sc").map(as_f64).unwrap_or(0.0),
        doc_count: as_u64(value.get("@dc").unwrap_or(&Value::Null)),
        occ_count: as_u64(value.get("@oc").unwrap_or(&Value::Null)),
    })
}

fn decode_hit(value: &Value) -> Result<Hit, ParseError> {
    let id = match value.get("@id") {
        Some(Value::String(s)) => s.clone(),
        Some(v) => as_u64(v).to_string(),
        None => return Err(ParseError::MissingField("@id")),
    };
    let score = value.get("@score").map(as_f64).unwrap_or(0.0);

    let mut attributes = BTreeMap::new();
    let mut excerpts = Vec::new();
    if let Some(Value::String(url)) = value.get("url") {
        attributes.insert("url".to_string(), url.clone());
    }
    match value.get("excerpt") {
        Some(Value::String(e)) => excerpts.push(e.clone()),
        Some(Value::Array(list)) => {
            excerpts.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
        }
        _ => {}
    }
    // The nested `info` map carries the index fields; flatten it.
    if let Some(Value::Object(info)) = value.get("info") {
        for (key, val) in info {
            let text = match val {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attributes.insert(key.clone(), text);
        }
    }
    Ok(Hit {
        id,
        score,
        attributes,
        excerpts,
    })
}

fn as_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches("ms").trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{"result": {
        "status": "OK",
        "query": "inf*",
        "time": {"text": "12.4ms"},
        "completions": {"@total": "40", "@sent": "4", "c": [
            {"text": "information", "@sc": "9", "@dc": "31", "@oc": "57"},
            {"text": "informatik", "@sc": "4", "@dc": "7", "@oc": "11"},
            {"text": "infinite", "@sc": "2", "@dc": "2", "@oc": "2"},
            {"text": "influence", "@sc": "1", "@dc": "1", "@oc": "1"}
        ]},
        "hits": {"@total": "3", "@sent": "3", "@first": "0", "hit": [
            {"@score": "9", "@id": "d1", "url": "http://x/1",
             "excerpt": "... information retrieval ...",
             "info": {"title": "IR", "year": "2008"}},
            {"@score": "5", "@id": "d2", "excerpt": ["a", "b"],
             "info": {"title": "Infinity"}},
            {"@score": "1", "@id": 3, "info": {}}
        ]}
    }}"#;

    #[test]
    fn decodes_full_response() {
        let body = decode(FULL).unwrap();
        assert_eq!(body.status, "OK");
        assert_eq!(body.query, "inf*");
        assert_eq!(body.backend_ms, 12.4);
        assert_eq!(body.completions.total, 40);
        assert_eq!(body.completions.items.len(), 4);
        assert_eq!(body.completions.items[0].doc_count, 31);
        assert_eq!(body.hits.total, 3);
        assert_eq!(body.hits.items[0].attributes["title"], "IR");
        assert_eq!(body.hits.items[0].attributes["url"], "http://x/1");
        assert_eq!(body.hits.items[1].excerpts, vec!["a", "b"]);
        assert_eq!(body.hits.items[2].id, "3");
    }

    #[test]
    fn wire_first_hit_is_rebased_to_one_based() {
        let body = decode(FULL).unwrap();
        assert_eq!(body.hits.first, 1);

        let paged = FULL.replace(r#""@first": "0""#, r#""@first": "20""#);
        assert_eq!(decode(&paged).unwrap().hits.first, 21);
    }

    #[test]
    fn missing_sections_are_empty_not_errors() {
        let body = decode(r#"{"result": {"query": ""}}"#).unwrap();
        assert_eq!(body.completions.items.len(), 0);
        assert_eq!(body.hits.total, 0);
    }

    #[test]
    fn single_completion_arrives_as_bare_object() {
        let body = decode(
            r#"{"result": {"completions": {"@total": "1", "@sent": "1",
                "c": {"text": "graph", "@dc": "5"}}}}"#,
        )
        .unwrap();
        assert_eq!(body.completions.items.len(), 1);
        assert_eq!(body.completions.items[0].text, "graph");
    }

    #[test]
    fn malformed_payload_fails_closed() {
        assert!(matches!(decode("{not json"), Err(ParseError::Json(_))));
        assert!(matches!(decode(""), Err(ParseError::MissingPayload)));
        assert!(matches!(
            decode(r#"{"unexpected": 1}"#),
            Err(ParseError::MissingField("result"))
        ));
    }

    #[test]
    fn completion_tag_helpers() {
        let c = Completion {
            text: ":facet:author:john_smith".to_string(),
            score: 0.0,
            doc_count: 0,
            occ_count: 0,
        };
        assert_eq!(c.payload(), "john_smith");
        assert_eq!(c.facet_name(), Some("author"));

        let precomputed = Completion {
            text: ":facetid:year:2008".to_string(),
            score: 0.0,
            doc_count: 0,
            occ_count: 0,
        };
        assert_eq!(precomputed.payload(), "2008");
        assert_eq!(precomputed.facet_name(), Some("year"));

        let plain = Completion {
            text: "information".to_string(),
            score: 0.0,
            doc_count: 0,
            occ_count: 0,
        };
        assert_eq!(plain.payload(), "information");
        assert_eq!(plain.facet_name(), None);
    }
}

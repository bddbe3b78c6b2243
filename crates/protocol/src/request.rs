use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Query characters that travel unescaped: the dialect's own operators
/// (wildcard, namespace marker, phrase dot, quotes) stay readable in logs.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b':')
    .remove(b'.')
    .remove(b'_')
    .remove(b'-')
    .remove(b'"');

/// One fully rewritten backend request.
///
/// `first_hit` is zero-based on the wire; the decoder re-bases the reply to
/// one-based before anything client-facing sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub query: String,
    pub first_hit: u32,
    pub hit_count: u32,
    pub completion_count: u32,
    pub excerpt_radius: u32,
    pub rank_hits: String,
    pub rank_completions: String,
}

impl WireRequest {
    /// A completions-only request (`h=0`).
    pub fn completions(query: impl Into<String>, count: u32) -> Self {
        Self {
            query: query.into(),
            first_hit: 0,
            hit_count: 0,
            completion_count: count,
            excerpt_radius: 0,
            rank_hits: "1d".to_string(),
            rank_completions: "1d".to_string(),
        }
    }

    /// A hits-only request (`c=0`).
    pub fn hits(query: impl Into<String>, first_hit: u32, count: u32) -> Self {
        Self {
            query: query.into(),
            first_hit,
            hit_count: count,
            completion_count: 0,
            excerpt_radius: 60,
            rank_hits: "1d".to_string(),
            rank_completions: "1d".to_string(),
        }
    }

    /// The single line sent to the backend:
    /// `GET /?<parameters> HTTP/1.0` plus the terminating blank line.
    pub fn request_line(&self) -> String {
        format!(
            "GET /?q={}&h={}&c={}&f={}&er={}&rd={}&rw={}&format=json HTTP/1.0\r\n\r\n",
            utf8_percent_encode(&self.query, QUERY_SET),
            self.hit_count,
            self.completion_count,
            self.first_hit,
            self.excerpt_radius,
            self.rank_hits,
            self.rank_completions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_shape() {
        let line = WireRequest::hits("inf*", 0, 5).request_line();
        assert!(line.starts_with("GET /?q=inf*&h=5&c=0&f=0&"));
        assert!(line.ends_with(" HTTP/1.0\r\n\r\n"));
        assert!(line.contains("&format=json"));
    }

    #[test]
    fn query_is_percent_encoded_but_operators_survive() {
        let req = WireRequest::completions("graph* :facet:author:\"de smith\"", 4);
        let line = req.request_line();
        assert!(line.contains("q=graph*%20:facet:author:\"de%20smith\""));
    }

    #[test]
    fn completions_request_has_zero_hits() {
        let line = WireRequest::completions("inf*", 4).request_line();
        assert!(line.contains("&h=0&c=4&"));
    }
}

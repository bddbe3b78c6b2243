//! Turns decoded backend sections into panel titles and body markup.

use protocol::{Completion, Hit};

use crate::text::TextStore;

/// Shorten a string to at most `max_chars` characters by cutting out the
/// middle. Operates on characters, never mid way through a code point.
pub fn truncate_middle(s: &str, max_chars: usize) -> String {
    let len = s.chars().count();
    if len <= max_chars || max_chars < 5 {
        return s.to_string();
    }
    let keep = max_chars - 3;
    let head = keep / 2 + keep % 2;
    let tail = keep / 2;
    let front: String = s.chars().take(head).collect();
    let back: String = s.chars().skip(len - tail).collect();
    format!("{front}...{back}")
}

/// Heading for the hits panel. Singular and empty cases get their own
/// wording instead of "Hits 1 - 0 of 0".
pub fn hits_title(texts: &TextStore, first: u64, sent: u64, total: u64) -> String {
    match total {
        0 => texts.get("no-hits-title"),
        1 => texts.get("one-hit-title"),
        _ if sent >= total && first == 1 => {
            texts.format("hits-title-all", &[("total", total.to_string())])
        }
        _ => texts.format(
            "hits-title",
            &[
                ("first", first.to_string()),
                ("last", (first + sent.saturating_sub(1)).to_string()),
                ("total", total.to_string()),
            ],
        ),
    }
}

pub fn words_title(texts: &TextStore, total: u64) -> String {
    match total {
        0 => texts.get("no-words-title"),
        1 => texts.get("one-word-title"),
        _ => texts.format("words-title", &[("total", total.to_string())]),
    }
}

pub fn facet_title(texts: &TextStore, name: &str, total: u64) -> String {
    texts.format(
        "facet-title",
        &[("name", name.to_string()), ("total", total.to_string())],
    )
}

/// One step of the "show more" ladder under a completion box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderEntry {
    pub label: String,
    /// Completion count this step requests.
    pub count: u32,
    /// False when the step would show exactly what is already shown.
    pub enabled: bool,
}

/// The ladder offered under a box holding `total` candidates of which
/// `shown` are visible: every configured step up to the total, the first
/// step past it, then an explicit "all".
pub fn ladder(texts: &TextStore, total: u64, shown: u32, thresholds: &[u32]) -> Vec<LadderEntry> {
    // Only attached once the candidates outgrow the first step.
    let Some(&first_step) = thresholds.first() else {
        return Vec::new();
    };
    if total <= u64::from(first_step) {
        return Vec::new();
    }
    let mut entries = Vec::new();
    for &step in thresholds {
        if u64::from(step) >= total {
            entries.push(LadderEntry {
                label: texts.format("top", &[("count", step.to_string())]),
                count: step,
                enabled: shown != step,
            });
            break;
        }
        entries.push(LadderEntry {
            label: texts.format("top", &[("count", step.to_string())]),
            count: step,
            enabled: shown != step,
        });
    }
    let all = u32::try_from(total).unwrap_or(u32::MAX);
    entries.push(LadderEntry {
        label: texts.format("all", &[("count", total.to_string())]),
        count: all,
        enabled: u64::from(shown) != total,
    });
    entries
}

/// Body markup for a completion box: one anchor per candidate with its
/// document count, then the ladder line. Labels wider than `label_chars`
/// are middle-truncated; the anchor target keeps the full word.
pub fn render_completions(items: &[&Completion], ladder: &[LadderEntry], label_chars: usize) -> String {
    let mut body = String::new();
    for completion in items {
        let word = completion.payload();
        let label = truncate_middle(word, label_chars);
        body.push_str(&format!(
            "<a class=\"completion\" href=\"#{word}\">{label}</a> ({})<br>\n",
            completion.doc_count
        ));
    }
    if !ladder.is_empty() {
        let steps: Vec<String> = ladder
            .iter()
            .map(|entry| {
                if entry.enabled {
                    format!("[<a href=\"#more:{}\">{}</a>]", entry.count, entry.label)
                } else {
                    format!("[{}]", entry.label)
                }
            })
            .collect();
        body.push_str(&steps.join(" "));
        body.push('\n');
    }
    body
}

/// Body markup for the hits panel: title line per document, attributes,
/// then the excerpts.
pub fn render_hits(items: &[Hit], excerpt_chars: usize) -> String {
    let mut body = String::new();
    for hit in items {
        let title = hit
            .attributes
            .get("title")
            .map(String::as_str)
            .unwrap_or(hit.id.as_str());
        match hit.attributes.get("url") {
            Some(url) => body.push_str(&format!(
                "<div class=\"hit\"><a href=\"{url}\">{title}</a>"
            )),
            None => body.push_str(&format!("<div class=\"hit\">{title}")),
        }
        for (key, value) in &hit.attributes {
            if key == "title" || key == "url" {
                continue;
            }
            body.push_str(&format!(" <span class=\"{key}\">{value}</span>"));
        }
        for excerpt in &hit.excerpts {
            body.push_str(&format!(
                "<br>\n{}",
                truncate_middle(excerpt, excerpt_chars)
            ));
        }
        body.push_str("</div>\n");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn texts() -> TextStore {
        TextStore::new("en")
    }

    #[rstest]
    #[case("short", 10, "short")]
    #[case("abcdefghijklmnop", 9, "abc...nop")]
    #[case("abcdefghijklmnop", 10, "abcd...nop")]
    fn middle_truncation(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate_middle(input, max), expected);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "\u{4fe1}\u{606f}\u{68c0}\u{7d22}\u{7cfb}\u{7edf}\u{8bbe}\u{8ba1}";
        let cut = truncate_middle(s, 7);
        assert_eq!(cut.chars().count(), 7);
        assert!(cut.contains("..."));
    }

    #[test]
    fn hit_titles_by_count() {
        let t = texts();
        assert_eq!(hits_title(&t, 1, 0, 0), "Zoomed in on no document");
        assert_eq!(hits_title(&t, 1, 1, 1), "Zoomed in on 1 document");
        assert_eq!(hits_title(&t, 1, 5, 312), "Hits 1 - 5 of 312");
        assert_eq!(hits_title(&t, 21, 5, 312), "Hits 21 - 25 of 312");
        assert_eq!(hits_title(&t, 1, 3, 3), "Hits (3)");
    }

    #[test]
    fn ladder_for_forty_candidates() {
        let steps = ladder(&texts(), 40, 4, &[4, 50, 250]);
        let labels: Vec<&str> = steps.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["top 4", "top 50", "all 40"]);
        // 4 are shown, so the first step is a no-op.
        assert!(!steps[0].enabled);
        assert!(steps[1].enabled);
        assert!(steps[2].enabled);
    }

    #[test]
    fn ladder_stops_at_first_step_past_the_total() {
        let steps = ladder(&texts(), 500, 4, &[4, 50, 250]);
        let labels: Vec<&str> = steps.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["top 4", "top 50", "top 250", "all 500"]);
    }

    #[test]
    fn no_ladder_for_trivial_boxes() {
        assert!(ladder(&texts(), 1, 1, &[4, 50]).is_empty());
        assert!(ladder(&texts(), 0, 0, &[4, 50]).is_empty());
    }

    #[test]
    fn no_ladder_when_the_first_step_covers_everything() {
        // A box whose candidates all fit the first step has nothing to
        // zoom into.
        assert!(ladder(&texts(), 3, 3, &[4, 50, 250]).is_empty());
        assert!(ladder(&texts(), 4, 4, &[4, 50, 250]).is_empty());
        assert!(!ladder(&texts(), 5, 4, &[4, 50, 250]).is_empty());
    }

    #[test]
    fn completion_markup_uses_payload_and_counts() {
        let completion = Completion {
            text: ":facet:author:john_smith".to_string(),
            score: 1.0,
            doc_count: 12,
            occ_count: 15,
        };
        let body = render_completions(&[&completion], &[], 40);
        assert!(body.contains(">john_smith</a> (12)"));
        assert!(!body.contains(":facet:"));
    }

    #[test]
    fn overlong_completion_labels_are_middle_truncated() {
        let completion = Completion {
            text: "pneumonoultramicroscopicsilicovolcanoconiosis".to_string(),
            score: 1.0,
            doc_count: 2,
            occ_count: 2,
        };
        let body = render_completions(&[&completion], &[], 20);
        assert!(body.contains(">pneumonou...coniosis</a> (2)"));
        // The anchor still targets the full word.
        assert!(body.contains("href=\"#pneumonoultramicroscopicsilicovolcanoconiosis\""));
    }
}

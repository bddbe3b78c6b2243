use serde::{Deserialize, Serialize};

/// How one panel request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PanelStatus {
    #[default]
    Ok,
    /// The query was below the launch threshold; nothing was sent.
    QueryTooShort,
    TransportFailed,
    ParseFailed,
}

/// Whether the panel body replaces what is shown or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PanelMode {
    #[default]
    Replace,
    Append,
}

/// One fully formatted panel, ready to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PanelResult {
    /// Heading line, e.g. `Hits 1 - 5 of 312` or `Zoom in on 40 words`.
    pub title: String,
    /// Rendered body markup.
    pub body: String,
    /// One-based rank of the first entry shown.
    pub first_shown: u32,
    /// Entries carried by this result.
    pub sent_count: u32,
    /// Entries the backend holds in total.
    pub total_count: u32,
    pub mode: PanelMode,
    pub status: PanelStatus,
}

impl PanelResult {
    /// A blank panel carrying only a heading. Used when a query matched
    /// nothing, or when a panel is reset.
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            first_shown: 1,
            ..Self::default()
        }
    }

    /// Fold an append-mode continuation into this panel: the body grows,
    /// the cursor stays where it was, the heading follows the newest page.
    pub fn extend(&mut self, more: PanelResult) {
        self.title = more.title;
        self.body.push_str(&more.body);
        self.sent_count += more.sent_count;
        self.total_count = more.total_count;
    }
}

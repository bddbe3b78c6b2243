//! The per-panel dispatch pipeline: gate, rewrite, fetch, format.
//!
//! One [`PanelRequest`] comes in, one [`SessionDelta`] goes out. A request
//! for a facet-shaped panel fans out into several panels inside the same
//! delta. Backend failures are per-panel: the affected panel carries an
//! error status and the interaction keeps its other boxes.

use std::time::Instant;

use protocol::{Completion, Exchange, ParseError, ProtocolError, ResponseBody, WireRequest, decode};
use query::{
    PanelKey, Query, QueryType, RewriteOptions, rewrite, rewrite_facet, substitute_trailing,
};
use rpc::panels::PanelRequest;
use session::{PanelResult, PanelStatus, SessionDelta};
use tracing::{info, warn};

use crate::config::Config;
use crate::format;
use crate::prefs::Preferences;
use crate::text::TextStore;

pub struct Dispatcher<E: Exchange> {
    exchange: E,
    config: Config,
    texts: TextStore,
}

/// Backend time and transfer accounting for one answered request.
#[derive(Debug, Default)]
struct Tally {
    backend_ms: f64,
    bytes: u64,
}

impl<E: Exchange> Dispatcher<E> {
    pub fn new(exchange: E, config: Config) -> Self {
        let texts = TextStore::new(config.language.clone());
        Self {
            exchange,
            config,
            texts,
        }
    }

    /// Answer one panel request. Never fails: every failure mode becomes a
    /// panel with an error status inside the returned delta.
    pub fn answer(&self, req: &PanelRequest) -> SessionDelta {
        let started = Instant::now();
        let mut delta = SessionDelta::for_query(req.query_id);
        let prefs = Preferences::new(req.prefs.clone());

        let input = self.effective_input(&req.raw_input);
        if !self.should_launch(&input) {
            let title = self
                .texts
                .format("query-too-short", &[("min", self.config.min_query_length.to_string())]);
            let mut panel = PanelResult::empty(title);
            panel.status = PanelStatus::QueryTooShort;
            delta.panels.insert(req.panel, panel);
            return delta;
        }

        let opts = RewriteOptions {
            min_word_length_for_star: self.config.min_word_length_for_star,
            translation_language: prefs.language(&self.config).to_string(),
        };

        let mut tally = Tally::default();
        match req.panel.query_type {
            QueryType::Hits | QueryType::Joins | QueryType::Relations => {
                self.answer_hits(req, &input, &prefs, &opts, &mut delta, &mut tally);
            }
            QueryType::Words | QueryType::Categories => {
                self.answer_completions(req, &input, &prefs, &opts, &mut delta, &mut tally);
            }
            QueryType::Facets => {
                self.answer_facets(req, &input, &prefs, &opts, &mut delta, &mut tally);
            }
            QueryType::PrecomputedFacets => {
                self.answer_precomputed(req, &input, &prefs, &opts, &mut delta, &mut tally);
            }
            QueryType::ClassDisambiguation | QueryType::Translation => {
                self.answer_two_phase(req, &input, &prefs, &opts, &mut delta, &mut tally);
            }
        }

        let mut base = Query::new(input);
        base.id = req.query_id;
        base.request_id = req.request_id;
        base.first_hit = req.first_hit;
        base.hits_per_page = prefs.hits_per_page(&self.config);
        base.completions_per_box = prefs.completions_per_box(&self.config);
        delta.query = Some(base);

        delta.backend_ms = Some(tally.backend_ms);
        delta.bytes_transferred = Some(tally.bytes);
        delta.total_ms = Some(started.elapsed().as_secs_f64() * 1000.0);

        info!(
            query_id = req.query_id,
            request_id = req.request_id,
            panel = %req.panel,
            backend_ms = tally.backend_ms,
            bytes = tally.bytes,
            "panel answered"
        );
        delta
    }

    /// An empty input may stand for a configured catch-all query.
    fn effective_input(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            self.config.replacement_for_empty_query.clone()
        } else {
            raw.to_string()
        }
    }

    /// Whether the input is long enough to launch a backend query. Operator
    /// input (wildcards, namespaced or quoted words) always launches.
    fn should_launch(&self, input: &str) -> bool {
        let Some(last) = input.split_whitespace().last() else {
            return false;
        };
        if last.contains('*') || last.starts_with(':') || last.starts_with('"') {
            return true;
        }
        last.chars().count() >= self.config.min_query_length
    }

    fn answer_hits(
        &self,
        req: &PanelRequest,
        input: &str,
        prefs: &Preferences,
        opts: &RewriteOptions,
        delta: &mut SessionDelta,
        tally: &mut Tally,
    ) {
        let rewritten = rewrite(req.panel.query_type, input, opts).query;
        let per_page = prefs.hits_per_page(&self.config);
        let mut wire = WireRequest::hits(rewritten, req.first_hit.saturating_sub(1), per_page);
        wire.rank_hits = prefs.rank_hits();

        match self.fetch(&wire, tally) {
            Ok(body) => {
                let hits = &body.hits;
                let title =
                    format::hits_title(&self.texts, hits.first, hits.sent, hits.total);
                let panel = PanelResult {
                    title,
                    body: format::render_hits(&hits.items, 160),
                    first_shown: u32::try_from(hits.first).unwrap_or(1),
                    sent_count: u32::try_from(hits.items.len()).unwrap_or(u32::MAX),
                    total_count: u32::try_from(hits.total).unwrap_or(u32::MAX),
                    mode: req.mode,
                    status: PanelStatus::Ok,
                };
                delta.panels.insert(req.panel, panel);
                delta.total_documents = Some(hits.total);
            }
            Err(err) => self.fail_panel(req.panel, &err, delta),
        }
    }

    fn answer_completions(
        &self,
        req: &PanelRequest,
        input: &str,
        prefs: &Preferences,
        opts: &RewriteOptions,
        delta: &mut SessionDelta,
        tally: &mut Tally,
    ) {
        // A trailing :-word is operator input, not a prefix; there is
        // nothing to complete from it.
        if input
            .split_whitespace()
            .last()
            .is_some_and(|t| t.starts_with(':'))
        {
            delta
                .panels
                .insert(req.panel, PanelResult::empty(self.texts.get("no-words-title")));
            return;
        }

        let rewritten = rewrite(req.panel.query_type, input, opts).query;
        let count = self.completion_count(req, prefs);
        let mut wire = WireRequest::completions(rewritten, count);
        wire.rank_completions = prefs.rank_completions();

        match self.fetch(&wire, tally) {
            Ok(body) => {
                let panel = self.completion_panel(req, input, &body);
                delta.panels.insert(req.panel, panel);
            }
            Err(err) => self.fail_panel(req.panel, &err, delta),
        }
    }

    fn completion_panel(
        &self,
        req: &PanelRequest,
        input: &str,
        body: &ResponseBody,
    ) -> PanelResult {
        let section = &body.completions;
        let visible = self.visible(&section.items);

        // A box whose sole candidate is the word already typed offers no
        // refinement; it is shown empty.
        if let [only] = visible.as_slice() {
            let typed = input
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .trim_end_matches('*')
                .to_lowercase();
            if only.payload().eq_ignore_ascii_case(&typed) {
                return PanelResult::empty(self.texts.get("no-words-title"));
            }
        }

        let shown = u32::try_from(visible.len()).unwrap_or(u32::MAX);
        let ladder =
            format::ladder(&self.texts, section.total, shown, &self.config.more_thresholds);
        let title = match req.panel.query_type {
            QueryType::Categories => self
                .texts
                .format("categories-title", &[("total", section.total.to_string())]),
            _ => format::words_title(&self.texts, section.total),
        };
        PanelResult {
            title,
            body: format::render_completions(&visible, &ladder, self.config.max_completion_length),
            first_shown: 1,
            sent_count: shown,
            total_count: u32::try_from(section.total).unwrap_or(u32::MAX),
            mode: req.mode,
            status: PanelStatus::Ok,
        }
    }

    /// One box per configured facet name, all inside one delta. A failing
    /// name marks its own box and leaves the others standing.
    fn answer_facets(
        &self,
        req: &PanelRequest,
        input: &str,
        prefs: &Preferences,
        opts: &RewriteOptions,
        delta: &mut SessionDelta,
        tally: &mut Tally,
    ) {
        let count = self.completion_count(req, prefs);
        for (i, name) in self.config.facet_names.iter().enumerate() {
            let key = PanelKey::new(QueryType::Facets, (i + 1) as u8);
            let wire = WireRequest::completions(rewrite_facet(input, name, opts), count);
            match self.fetch(&wire, tally) {
                Ok(body) => {
                    let section = &body.completions;
                    let visible = self.visible(&section.items);
                    let shown = u32::try_from(visible.len()).unwrap_or(u32::MAX);
                    let ladder = format::ladder(
                        &self.texts,
                        section.total,
                        shown,
                        &self.config.more_thresholds,
                    );
                    let panel = PanelResult {
                        title: format::facet_title(&self.texts, name, section.total),
                        body: format::render_completions(&visible, &ladder, self.config.max_completion_length),
                        first_shown: 1,
                        sent_count: shown,
                        total_count: u32::try_from(section.total).unwrap_or(u32::MAX),
                        mode: req.mode,
                        status: PanelStatus::Ok,
                    };
                    delta.panels.insert(key, panel);
                }
                Err(err) => self.fail_panel(key, &err, delta),
            }
        }
    }

    /// One combined `:facetid:` query, partitioned into one box per facet
    /// name found among the returned words.
    fn answer_precomputed(
        &self,
        req: &PanelRequest,
        input: &str,
        prefs: &Preferences,
        opts: &RewriteOptions,
        delta: &mut SessionDelta,
        tally: &mut Tally,
    ) {
        if !self.config.facetids_available {
            delta
                .panels
                .insert(req.panel, PanelResult::empty(self.texts.get("no-words-title")));
            return;
        }
        let rewritten = rewrite(QueryType::PrecomputedFacets, input, opts).query;
        let wire = WireRequest::completions(rewritten, self.config.max_completions_fetch);
        let body = match self.fetch(&wire, tally) {
            Ok(body) => body,
            Err(err) => return self.fail_panel(req.panel, &err, delta),
        };

        let mut groups: std::collections::BTreeMap<&str, Vec<&Completion>> = Default::default();
        for completion in &body.completions.items {
            if let Some(name) = completion.facet_name() {
                groups.entry(name).or_default().push(completion);
            }
        }
        let per_box = prefs.completions_per_box(&self.config) as usize;
        for (i, (name, members)) in groups.into_iter().enumerate() {
            let total = members.len() as u64;
            let top: Vec<&Completion> = members.into_iter().take(per_box).collect();
            let shown = top.len() as u32;
            let ladder =
                format::ladder(&self.texts, total, shown, &self.config.more_thresholds);
            let panel = PanelResult {
                title: format::facet_title(&self.texts, name, total),
                body: format::render_completions(&top, &ladder, self.config.max_completion_length),
                first_shown: 1,
                sent_count: shown,
                total_count: u32::try_from(total).unwrap_or(u32::MAX),
                mode: req.mode,
                status: PanelStatus::Ok,
            };
            delta
                .panels
                .insert(PanelKey::new(QueryType::PrecomputedFacets, (i + 1) as u8), panel);
        }
    }

    /// Class disambiguation and translation first resolve the trailing
    /// token, then act on the number of matches: none hides the box, one
    /// substitutes and re-queries, several become the box's own content.
    fn answer_two_phase(
        &self,
        req: &PanelRequest,
        input: &str,
        prefs: &Preferences,
        opts: &RewriteOptions,
        delta: &mut SessionDelta,
        tally: &mut Tally,
    ) {
        let title_key = match req.panel.query_type {
            QueryType::Translation => "translation-title",
            _ => "classes-title",
        };
        let Some(followup) = rewrite(req.panel.query_type, input, opts).followup else {
            delta
                .panels
                .insert(req.panel, PanelResult::empty(self.texts.get(title_key)));
            return;
        };

        let resolve = WireRequest::completions(
            followup.resolve_query(),
            self.config.max_completions_fetch,
        );
        let resolved = match self.fetch(&resolve, tally) {
            Ok(body) => body,
            Err(err) => return self.fail_panel(req.panel, &err, delta),
        };
        let matches = &resolved.completions.items;

        match matches.as_slice() {
            [] => {
                delta
                    .panels
                    .insert(req.panel, PanelResult::empty(self.texts.get(title_key)));
            }
            [only] => {
                // Exactly one resolution: the resolved word stands in for
                // the typed token and the box shows what it leads to.
                let substituted = substitute_trailing(input, &only.text);
                let wire = WireRequest::completions(
                    rewrite(QueryType::Words, &substituted, opts).query,
                    self.completion_count(req, prefs),
                );
                match self.fetch(&wire, tally) {
                    Ok(body) => {
                        let mut panel = self.completion_panel(req, &substituted, &body);
                        panel.title = self.texts.get(title_key);
                        if req.panel.query_type == QueryType::Translation {
                            if let Some(token) = input.split_whitespace().last() {
                                delta
                                    .translation_memo
                                    .insert(token.to_lowercase(), panel.body.clone());
                            }
                        }
                        delta.panels.insert(req.panel, panel);
                    }
                    Err(err) => self.fail_panel(req.panel, &err, delta),
                }
            }
            many => {
                let visible = self.visible(many);
                let shown = u32::try_from(visible.len()).unwrap_or(u32::MAX);
                let panel = PanelResult {
                    title: self.texts.get(title_key),
                    body: format::render_completions(&visible, &[], self.config.max_completion_length),
                    first_shown: 1,
                    sent_count: shown,
                    total_count: u32::try_from(resolved.completions.total)
                        .unwrap_or(u32::MAX),
                    mode: req.mode,
                    status: PanelStatus::Ok,
                };
                delta.panels.insert(req.panel, panel);
            }
        }
    }

    fn completion_count(&self, req: &PanelRequest, prefs: &Preferences) -> u32 {
        if req.max_to_show > 0 {
            req.max_to_show.min(self.config.max_completions_fetch)
        } else {
            prefs.completions_per_box(&self.config)
        }
    }

    /// Index words carrying the internal tag never reach a panel.
    fn visible<'a>(&self, items: &'a [Completion]) -> Vec<&'a Completion> {
        items
            .iter()
            .filter(|c| !c.text.starts_with(&self.config.internal_tag))
            .collect()
    }

    /// One round-trip. Bytes count toward the tally as soon as the exchange
    /// completed, whether or not the payload then decodes.
    fn fetch(&self, wire: &WireRequest, tally: &mut Tally) -> Result<ResponseBody, ProtocolError> {
        let raw = self.exchange.exchange(wire)?;
        tally.bytes += raw.total_bytes as u64;
        if raw.payload.is_empty() {
            return Err(ParseError::MissingPayload.into());
        }
        let body = decode(&raw.payload)?;
        tally.backend_ms += body.backend_ms;
        Ok(body)
    }

    fn fail_panel(&self, key: PanelKey, err: &ProtocolError, delta: &mut SessionDelta) {
        warn!(panel = %key, error = %err, "panel request failed");
        let mut panel = PanelResult::empty(self.texts.get("backend-error"));
        panel.status = match err {
            ProtocolError::Transport(_) => PanelStatus::TransportFailed,
            ProtocolError::Parse(_) => PanelStatus::ParseFailed,
        };
        delta.panels.insert(key, panel);
        delta.error = Some(err.to_string());
    }
}

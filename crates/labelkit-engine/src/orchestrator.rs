//! Drives label passes over a host page.
//!
//! A pass detects the page type, evaluates every label against every
//! product found, and re-renders the page with the resulting badges. The
//! [`Orchestrator`] runs passes in response to [`Trigger`]s: a `Load`
//! fetches labels afresh, later triggers reuse the labels already fetched.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use labelkit_core::Label;
use scraper::{ElementRef, Html};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::discovery::{
    detect_page_type, find_card_media_container, find_product_cards, get_product_id_from_card,
    page_media_container, page_product_id, PageType,
};
use crate::evaluate::explain_at;
use crate::observe::Observer;
use crate::render::{render_document, Badge, RenderPlan};
use crate::signals::extract_signals;
use crate::source::LabelFetcher;

/// Delay between a variant change and the re-render, letting the theme
/// finish swapping product media.
pub const DEFAULT_VARIANT_SETTLE: Duration = Duration::from_millis(300);

/// Summary of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub page_type: PageType,
    pub products_seen: usize,
    pub labels_considered: usize,
    pub badges_rendered: usize,
}

impl PassReport {
    fn idle(page_type: PageType, labels_considered: usize) -> Self {
        Self {
            page_type,
            products_seen: 0,
            labels_considered,
            badges_rendered: 0,
        }
    }
}

/// The decorated HTML and what the pass did.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub html: String,
    pub report: PassReport,
}

/// Applies `labels` to `html` using the current time.
#[must_use]
pub fn apply_labels(
    html: &str,
    page_url: &str,
    labels: &[Label],
    observer: &dyn Observer,
) -> RenderOutcome {
    apply_labels_at(html, page_url, labels, observer, Utc::now())
}

/// Applies `labels` to `html` against an explicit clock.
///
/// Pages that are neither product nor collection pages leave the HTML
/// untouched. An empty label list still clears badges from earlier passes.
#[must_use]
pub fn apply_labels_at(
    html: &str,
    page_url: &str,
    labels: &[Label],
    observer: &dyn Observer,
    now: DateTime<Utc>,
) -> RenderOutcome {
    let doc = Html::parse_document(html);
    let page_type = detect_page_type(page_url, &doc);

    if page_type == PageType::Other {
        return RenderOutcome {
            html: html.to_string(),
            report: PassReport::idle(page_type, labels.len()),
        };
    }

    let mut plan = RenderPlan::new();
    let products_seen = match page_type {
        PageType::ProductDetail => {
            let product_id = page_product_id(&doc, page_url);
            let container = page_media_container(&doc);
            place_badges(
                &mut plan,
                doc.root_element(),
                container,
                product_id.as_deref(),
                labels,
                observer,
                now,
            );
            1
        }
        PageType::Collection => {
            let cards = find_product_cards(doc.root_element());
            for card in &cards {
                let product_id = get_product_id_from_card(*card);
                let container = find_card_media_container(*card);
                place_badges(
                    &mut plan,
                    *card,
                    container,
                    product_id.as_deref(),
                    labels,
                    observer,
                    now,
                );
            }
            cards.len()
        }
        PageType::Other => 0,
    };

    RenderOutcome {
        html: render_document(&doc, &plan),
        report: PassReport {
            page_type,
            products_seen,
            labels_considered: labels.len(),
            badges_rendered: plan.badge_count(),
        },
    }
}

fn place_badges(
    plan: &mut RenderPlan,
    scope: ElementRef<'_>,
    container: ElementRef<'_>,
    product_id: Option<&str>,
    labels: &[Label],
    observer: &dyn Observer,
    now: DateTime<Utc>,
) {
    let signals = extract_signals(scope);
    plan.claim(container.id());
    for label in labels {
        let decision = explain_at(label, &signals, product_id, now);
        observer.label_evaluated(&decision);
        if decision.matched {
            plan.push(container.id(), Badge::from_label(label));
        }
    }
}

/// The page being decorated.
pub trait PageHost: Send {
    fn url(&self) -> String;
    fn html(&self) -> String;
    fn replace_html(&mut self, html: String);
}

/// An in-memory page.
#[derive(Debug, Clone)]
pub struct StaticPage {
    url: String,
    html: String,
}

impl StaticPage {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Simulates the storefront mutating its own markup.
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    #[must_use]
    pub fn into_html(self) -> String {
        self.html
    }
}

impl PageHost for StaticPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn html(&self) -> String {
        self.html.clone()
    }

    fn replace_html(&mut self, html: String) {
        self.html = html;
    }
}

/// Events that cause a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Initial page load; labels are fetched afresh.
    Load,
    /// The theme re-rendered a section in place.
    SectionReload,
    /// The shopper picked another variant on a product page.
    VariantChange,
    /// Cards were appended to a collection grid (infinite scroll, filters).
    CardsInserted { count: usize },
}

pub trait TriggerSource: Send {
    /// The next trigger, or `None` once the source is exhausted.
    fn next_trigger(&mut self) -> impl Future<Output = Option<Trigger>> + Send;
}

/// Yields a single [`Trigger::Load`].
#[derive(Debug, Default)]
pub struct LoadOnce {
    fired: bool,
}

impl LoadOnce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerSource for LoadOnce {
    async fn next_trigger(&mut self) -> Option<Trigger> {
        if self.fired {
            None
        } else {
            self.fired = true;
            Some(Trigger::Load)
        }
    }
}

/// Triggers pushed by the host through a channel.
#[derive(Debug)]
pub struct ChannelTriggers {
    rx: mpsc::Receiver<Trigger>,
}

impl ChannelTriggers {
    /// Creates a bounded trigger channel.
    #[must_use]
    pub fn channel(buffer: usize) -> (mpsc::Sender<Trigger>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

impl TriggerSource for ChannelTriggers {
    async fn next_trigger(&mut self) -> Option<Trigger> {
        self.rx.recv().await
    }
}

/// Runs passes against a [`PageHost`].
pub struct Orchestrator<F, O> {
    fetcher: F,
    observer: O,
    settle_delay: Duration,
}

impl<F: LabelFetcher, O: Observer> Orchestrator<F, O> {
    pub fn new(fetcher: F, observer: O) -> Self {
        Self {
            fetcher,
            observer,
            settle_delay: DEFAULT_VARIANT_SETTLE,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Fetches labels and runs one pass.
    pub async fn render_pass<H: PageHost>(&self, host: &mut H) -> PassReport {
        let url = host.url();
        if self.page_type_of(host) == PageType::Other {
            let report = PassReport::idle(PageType::Other, 0);
            self.observer.pass_completed(&report);
            return report;
        }
        let labels = self.fetcher.fetch_labels(&url, &self.observer).await;
        self.pass_with(host, &labels)
    }

    /// Consumes triggers until the source is exhausted, returning one report
    /// per pass that ran.
    pub async fn run<H: PageHost, T: TriggerSource>(
        &self,
        host: &mut H,
        triggers: &mut T,
    ) -> Vec<PassReport> {
        let mut labels: Option<Vec<Label>> = None;
        let mut reports = Vec::new();

        while let Some(trigger) = triggers.next_trigger().await {
            let page_type = self.page_type_of(host);
            if !accepts(trigger, page_type) {
                tracing::debug!(?trigger, %page_type, "trigger ignored");
                continue;
            }
            if trigger == Trigger::VariantChange {
                tokio::time::sleep(self.settle_delay).await;
            }

            let url = host.url();
            let current = match labels.take() {
                Some(cached) if trigger != Trigger::Load => cached,
                _ => self.fetcher.fetch_labels(&url, &self.observer).await,
            };
            reports.push(self.pass_with(host, &current));
            labels = Some(current);
        }

        reports
    }

    fn page_type_of<H: PageHost>(&self, host: &H) -> PageType {
        let doc = Html::parse_document(&host.html());
        detect_page_type(&host.url(), &doc)
    }

    fn pass_with<H: PageHost>(&self, host: &mut H, labels: &[Label]) -> PassReport {
        let html = host.html();
        let outcome = apply_labels(&html, &host.url(), labels, &self.observer);
        if outcome.html != html {
            host.replace_html(outcome.html);
        }
        self.observer.pass_completed(&outcome.report);
        outcome.report
    }
}

fn accepts(trigger: Trigger, page_type: PageType) -> bool {
    match (trigger, page_type) {
        (_, PageType::Other) => false,
        (Trigger::Load | Trigger::SectionReload, _) => true,
        (Trigger::VariantChange, PageType::ProductDetail) => true,
        (Trigger::CardsInserted { count }, PageType::Collection) => count > 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_filtering() {
        use PageType::{Collection, Other, ProductDetail};

        assert!(accepts(Trigger::Load, Collection));
        assert!(accepts(Trigger::SectionReload, ProductDetail));
        assert!(accepts(Trigger::VariantChange, ProductDetail));
        assert!(!accepts(Trigger::VariantChange, Collection));
        assert!(accepts(Trigger::CardsInserted { count: 3 }, Collection));
        assert!(!accepts(Trigger::CardsInserted { count: 0 }, Collection));
        assert!(!accepts(Trigger::CardsInserted { count: 3 }, ProductDetail));
        assert!(!accepts(Trigger::Load, Other));
    }

    #[tokio::test]
    async fn load_once_fires_once() {
        let mut source = LoadOnce::new();
        assert_eq!(source.next_trigger().await, Some(Trigger::Load));
        assert_eq!(source.next_trigger().await, None);
    }

    #[tokio::test]
    async fn channel_triggers_end_when_sender_drops() {
        let (tx, mut source) = ChannelTriggers::channel(4);
        tx.send(Trigger::SectionReload).await.unwrap();
        drop(tx);
        assert_eq!(source.next_trigger().await, Some(Trigger::SectionReload));
        assert_eq!(source.next_trigger().await, None);
    }
}

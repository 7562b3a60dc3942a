//! Command handlers.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use labelkit_core::AppConfig;
use labelkit_engine::{
    Decision, LabelSourceClient, MemoryObserver, Orchestrator, StaticPage, Tee, TracingObserver,
};

use crate::page::{load_page, LabelInput};
use crate::PageArgs;

fn orchestrator<O: labelkit_engine::Observer>(
    config: &AppConfig,
    input: LabelInput,
    observer: O,
) -> Orchestrator<LabelInput, O> {
    Orchestrator::new(input, observer)
        .with_settle_delay(Duration::from_millis(config.variant_settle_ms))
}

/// Fetch page + labels, run one pass, and write the decorated HTML.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded, the labels file cannot be
/// read, or the output cannot be written. Unreachable label endpoints are not
/// errors; the page is written back unlabeled.
pub(crate) async fn run_render(
    config: &AppConfig,
    args: &PageArgs,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let html = load_page(config, &args.url, args.html.as_deref()).await?;
    let input = LabelInput::build(config, args.labels.as_deref(), args.endpoints.clone())?;

    let mut page = StaticPage::new(args.url.clone(), html);
    let report = orchestrator(config, input, TracingObserver)
        .render_pass(&mut page)
        .await;
    tracing::info!(
        badges = report.badges_rendered,
        products = report.products_seen,
        "render complete"
    );

    let html = page.into_html();
    match out {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("writing labeled page to {}", path.display()))?,
        None => println!("{html}"),
    }
    Ok(())
}

/// Print every label decision for the page.
///
/// # Errors
///
/// Returns an error if the page or labels file cannot be loaded.
pub(crate) async fn run_evaluate(config: &AppConfig, args: &PageArgs) -> anyhow::Result<()> {
    let html = load_page(config, &args.url, args.html.as_deref()).await?;
    let input = LabelInput::build(config, args.labels.as_deref(), args.endpoints.clone())?;

    let mut page = StaticPage::new(args.url.clone(), html);
    let orchestrator = orchestrator(config, input, Tee(TracingObserver, MemoryObserver::new()));
    let report = orchestrator.render_pass(&mut page).await;

    let decisions = orchestrator.observer().1.decisions();
    if decisions.is_empty() {
        println!(
            "no decisions: {} page, {} product(s), {} label(s)",
            report.page_type, report.products_seen, report.labels_considered
        );
        return Ok(());
    }

    println!("{:<34}{:<38}{:<8}REASON", "PRODUCT", "LABEL", "MATCH");
    for decision in &decisions {
        println!("{}", format_decision(decision));
    }
    Ok(())
}

/// Fetch the label set and print it as pretty JSON.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the output cannot
/// be serialized.
pub(crate) async fn run_labels(
    config: &AppConfig,
    page_url: Option<&str>,
    endpoints: Vec<String>,
) -> anyhow::Result<()> {
    let endpoints = if endpoints.is_empty() {
        config.label_endpoints.clone()
    } else {
        endpoints
    };
    let client =
        LabelSourceClient::new(endpoints, config.request_timeout_secs, &config.user_agent)?;
    let labels = client
        .fetch_labels(page_url.unwrap_or_default(), &TracingObserver)
        .await;

    println!("{}", serde_json::to_string_pretty(&labels)?);
    Ok(())
}

pub(crate) fn format_decision(decision: &Decision) -> String {
    format!(
        "{:<34}{:<38}{:<8}{}",
        decision.product_id.as_deref().unwrap_or("-"),
        decision.label_id,
        if decision.matched { "yes" } else { "no" },
        decision.reason
    )
}

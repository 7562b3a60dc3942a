//! Page and label inputs for the CLI commands.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use labelkit_core::{AppConfig, Label};
use labelkit_engine::source::parse_label_list;
use labelkit_engine::{LabelFetcher, LabelSourceClient, Observer, StaticLabels};

/// Labels from a local file or from the configured endpoints.
pub(crate) enum LabelInput {
    File(StaticLabels),
    Remote(LabelSourceClient),
}

impl LabelFetcher for LabelInput {
    async fn fetch_labels(&self, page_url: &str, observer: &dyn Observer) -> Vec<Label> {
        match self {
            Self::File(labels) => labels.fetch_labels(page_url, observer).await,
            Self::Remote(client) => client.fetch_labels(page_url, observer).await,
        }
    }
}

impl LabelInput {
    /// `--labels FILE` wins; otherwise the explicit endpoints, falling back to
    /// the configured list.
    pub(crate) fn build(
        config: &AppConfig,
        labels_file: Option<&Path>,
        endpoints: Vec<String>,
    ) -> anyhow::Result<Self> {
        if let Some(file) = labels_file {
            let body = std::fs::read_to_string(file)
                .with_context(|| format!("reading labels from {}", file.display()))?;
            let labels = parse_label_list(&body, &file.display().to_string())?;
            tracing::debug!(count = labels.len(), file = %file.display(), "labels loaded from file");
            return Ok(Self::File(StaticLabels(labels)));
        }

        let endpoints = if endpoints.is_empty() {
            config.label_endpoints.clone()
        } else {
            endpoints
        };
        let client =
            LabelSourceClient::new(endpoints, config.request_timeout_secs, &config.user_agent)?;
        Ok(Self::Remote(client))
    }
}

/// Reads the page markup from `html_file`, or fetches `url`.
pub(crate) async fn load_page(
    config: &AppConfig,
    url: &str,
    html_file: Option<&Path>,
) -> anyhow::Result<String> {
    if let Some(file) = html_file {
        return std::fs::read_to_string(file)
            .with_context(|| format!("reading page markup from {}", file.display()));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()?;
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html")
        .send()
        .await
        .with_context(|| format!("fetching {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("fetching {url}: unexpected status {status}");
    }
    Ok(response.text().await?)
}

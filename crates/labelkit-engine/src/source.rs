//! Fetches label definitions from an ordered list of JSON endpoints.

use std::future::Future;
use std::time::Duration;

use labelkit_core::Label;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::error::EngineError;
use crate::observe::Observer;

/// Anything that can produce the label set for a page.
pub trait LabelFetcher: Send + Sync {
    /// Returns the labels for `page_url`. Never fails; an unavailable source
    /// yields an empty list.
    fn fetch_labels(
        &self,
        page_url: &str,
        observer: &dyn Observer,
    ) -> impl Future<Output = Vec<Label>> + Send;
}

/// A fixed label set, used by the CLI's `--labels` file and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLabels(pub Vec<Label>);

impl LabelFetcher for StaticLabels {
    async fn fetch_labels(&self, _page_url: &str, _observer: &dyn Observer) -> Vec<Label> {
        self.0.clone()
    }
}

/// HTTP client for the label endpoints.
///
/// Endpoints are tried in order and the first one answering 2xx with a JSON
/// label array wins. Relative endpoints resolve against the page origin.
pub struct LabelSourceClient {
    client: Client,
    endpoints: Vec<String>,
}

impl LabelSourceClient {
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoints: Vec<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, endpoints })
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Tries each endpoint in order and returns the first label list that
    /// loads. Every failure is reported to `observer`; when all fail the
    /// result is empty.
    pub async fn fetch_labels(&self, page_url: &str, observer: &dyn Observer) -> Vec<Label> {
        for endpoint in &self.endpoints {
            let result = match resolve_endpoint(page_url, endpoint) {
                Ok(url) => self.fetch_endpoint(&url).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(labels) => {
                    tracing::debug!(endpoint, count = labels.len(), "labels loaded");
                    return labels;
                }
                Err(e) => observer.endpoint_failed(endpoint, &e),
            }
        }
        Vec::new()
    }

    async fn fetch_endpoint(&self, url: &str) -> Result<Vec<Label>, EngineError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        parse_label_list(&body, url)
    }
}

impl LabelFetcher for LabelSourceClient {
    fn fetch_labels(
        &self,
        page_url: &str,
        observer: &dyn Observer,
    ) -> impl Future<Output = Vec<Label>> + Send {
        LabelSourceClient::fetch_labels(self, page_url, observer)
    }
}

/// Resolves a configured endpoint to an absolute URL. Relative endpoints are
/// taken from the origin of `page_url`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidEndpoint`] when the endpoint is relative and
/// the page URL cannot serve as a base, or when the joined URL is invalid.
pub fn resolve_endpoint(page_url: &str, endpoint: &str) -> Result<String, EngineError> {
    if let Ok(absolute) = Url::parse(endpoint) {
        return Ok(absolute.to_string());
    }

    let invalid = |reason: String| EngineError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let base = Url::parse(page_url)
        .map_err(|e| invalid(format!("page url \"{page_url}\" is not a valid base: {e}")))?;
    let path = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };
    base.join(&path)
        .map(|u| u.to_string())
        .map_err(|e| invalid(e.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelListBody {
    Bare(Vec<Value>),
    Wrapped { labels: Vec<Value> },
    Data { data: Vec<Value> },
}

/// Parses an endpoint response into labels.
///
/// Accepts a bare JSON array as well as `{"labels": [...]}` and
/// `{"data": [...]}` envelopes. Individual entries that do not read as a
/// label, or whose text is blank, are skipped.
///
/// # Errors
///
/// Returns [`EngineError::Deserialize`] when the body is not one of the
/// accepted shapes.
pub fn parse_label_list(body: &str, context: &str) -> Result<Vec<Label>, EngineError> {
    let parsed: LabelListBody =
        serde_json::from_str(body).map_err(|e| EngineError::Deserialize {
            context: format!("label list from {context}"),
            source: e,
        })?;

    let items = match parsed {
        LabelListBody::Bare(items)
        | LabelListBody::Wrapped { labels: items }
        | LabelListBody::Data { data: items } => items,
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Label>(item) {
            Ok(label) if !label.text.trim().is_empty() => Some(label),
            Ok(label) => {
                tracing::debug!(label_id = %label.id, "skipping label with blank text");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed label entry");
                None
            }
        })
        .collect())
}

//! HTTP client for the Shopify Admin GraphQL API.

use std::time::Duration;

use labelkit_core::ShopifyCredentials;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;

use crate::error::ShopifyError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{GraphQlResponse, ProductPage, ProductQuery};

const PRODUCTS_QUERY: &str = r"query Products($first: Int!, $after: String, $query: String) {
  products(first: $first, after: $after, query: $query, sortKey: TITLE) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        title
        createdAt
        featuredImage { url }
        variants(first: 1) { edges { node { price compareAtPrice } } }
      }
    }
  }
}";

/// Admin API client for one shop.
///
/// Throttling (HTTP 429 or a `THROTTLED` GraphQL error), network failures,
/// and 5xx responses are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct AdminClient {
    client: Client,
    shop: String,
    endpoint: String,
    admin_token: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl AdminClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidShopDomain`] when the shop domain does
    /// not form a valid URL, or [`ShopifyError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        credentials: &ShopifyCredentials,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ShopifyError> {
        let endpoint = graphql_url(&credentials.shop_domain, &credentials.api_version)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            shop: credentials.shop_domain.clone(),
            endpoint,
            admin_token: credentials.admin_token.clone(),
            max_retries,
            backoff_base_secs,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches one page of products.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`] / [`ShopifyError::Throttled`] once retries are exhausted.
    /// - [`ShopifyError::Unauthorized`] on HTTP 401/403 (not retried).
    /// - [`ShopifyError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`ShopifyError::GraphQl`] when the response carries non-throttling errors.
    /// - [`ShopifyError::Deserialize`] when the body is not the expected shape.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ShopifyError> {
        let body = json!({
            "query": PRODUCTS_QUERY,
            "variables": {
                "first": query.first,
                "after": query.after,
                "query": query.query.as_deref().and_then(title_filter),
            },
        });

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let body = body.clone();
            async move { self.post_products(&body).await }
        })
        .await
    }

    async fn post_products(&self, body: &serde_json::Value) -> Result<ProductPage, ShopifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.admin_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(2);
            return Err(ShopifyError::RateLimited {
                shop: self.shop.clone(),
                retry_after_secs,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized {
                shop: self.shop.clone(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let text = response.text().await?;
        let parsed: GraphQlResponse =
            serde_json::from_str(&text).map_err(|e| ShopifyError::Deserialize {
                context: format!("products page from {}", self.shop),
                source: e,
            })?;

        if parsed.errors.iter().any(|e| e.is_throttled()) {
            return Err(ShopifyError::Throttled {
                shop: self.shop.clone(),
            });
        }
        if !parsed.errors.is_empty() {
            let messages = parsed
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ShopifyError::GraphQl { messages });
        }

        let connection = parsed
            .data
            .ok_or_else(|| ShopifyError::GraphQl {
                messages: "response carried neither data nor errors".to_string(),
            })?
            .products;

        Ok(ProductPage {
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
            products: connection
                .edges
                .into_iter()
                .map(|edge| edge.node.into())
                .collect(),
        })
    }
}

/// Builds `https://{shop}/admin/api/{version}/graphql.json`.
///
/// `shop_domain` may be a bare host (`demo.myshopify.com`) or a full origin
/// (`https://demo.myshopify.com`, or `http://127.0.0.1:PORT` in tests).
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidShopDomain`] when the result is not a valid
/// URL or the domain is blank.
pub fn graphql_url(shop_domain: &str, api_version: &str) -> Result<String, ShopifyError> {
    let invalid = |reason: String| ShopifyError::InvalidShopDomain {
        shop_domain: shop_domain.to_string(),
        reason,
    };

    let trimmed = shop_domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("domain is blank".to_string()));
    }
    let origin = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&format!(
        "{origin}/admin/api/{}/graphql.json",
        api_version.trim()
    ))
    .map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url.to_string())
}

/// Turns a search box value into the Admin search syntax `title:*term*`.
///
/// Quotes and backslashes are dropped since they would end the term early.
#[must_use]
pub fn title_filter(raw: &str) -> Option<String> {
    let term: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '*'))
        .collect();
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(format!("title:*{term}*"))
    }
}

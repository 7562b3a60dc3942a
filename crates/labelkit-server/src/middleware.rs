use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
/// Longer client-supplied ids are replaced with a generated one.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Admin bearer tokens.
#[derive(Clone)]
pub struct AuthState {
    tokens: Arc<[String]>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("tokens", &format!("[{} redacted]", self.tokens.len()))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AuthState {
    /// Builds auth from the configured admin tokens (`LABELKIT_API_KEYS`).
    ///
    /// In development, an empty key list disables auth for local iteration.
    /// Elsewhere it fails startup.
    ///
    /// # Errors
    ///
    /// Returns an error when no tokens are configured outside development.
    pub fn from_keys(api_keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        if !api_keys.is_empty() {
            return Ok(Self {
                tokens: api_keys.into(),
                enabled: true,
            });
        }
        if !is_development {
            anyhow::bail!(
                "LABELKIT_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }
        tracing::warn!("LABELKIT_API_KEYS not set; admin routes are open in development");
        Ok(Self::disabled())
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tokens: Arc::from(Vec::new()),
            enabled: false,
        }
    }

    // Every token is compared so timing does not reveal which one matched.
    fn allows(&self, candidate: &str) -> bool {
        self.tokens
            .iter()
            .fold(subtle::Choice::from(0), |acc, token| {
                acc | token.as_bytes().ct_eq(candidate.as_bytes())
            })
            .into()
    }
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    served: usize,
}

/// Fixed-window request limit shared by every route it is layered on.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    scope: &'static str,
    limit: usize,
    length: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimitState {
    /// `scope` names the route group in logs.
    #[must_use]
    pub fn new(scope: &'static str, limit: usize, length: Duration) -> Self {
        Self {
            scope,
            limit,
            length,
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                served: 0,
            })),
        }
    }

    /// Counts one request. `Err` carries the seconds until the window resets.
    async fn admit(&self) -> Result<(), u64> {
        let mut window = self.window.lock().await;
        let elapsed = window.opened_at.elapsed();
        if elapsed >= self.length {
            window.opened_at = Instant::now();
            window.served = 0;
        } else if window.served >= self.limit {
            let remaining = self.length.saturating_sub(elapsed);
            return Err(remaining.as_secs().max(1));
        }
        window.served += 1;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RejectionBody {
    error: Rejection,
}

#[derive(Debug, Serialize)]
struct Rejection {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(RejectionBody {
            error: Rejection { code, message },
        }),
    )
        .into_response()
}

/// Takes the caller's `x-request-id` when it is usable, otherwise generates
/// a `UUIDv4`, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let authorized = bearer_token(req.headers().get(AUTHORIZATION))
        .is_some_and(|token| auth.allows(token));
    if authorized {
        next.run(req).await
    } else {
        reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        )
    }
}

pub async fn enforce_rate_limit(
    State(limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match limit.admit().await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(scope = limit.scope, retry_after, "rate limit exceeded");
            let mut res = reject(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limit exceeded",
            );
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            res
        }
    }
}

/// The token from `Authorization: Bearer <token>`; the scheme is
/// case-insensitive.
fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    let raw = value?.to_str().ok()?.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_reads_scheme_case_insensitively() {
        for raw in ["Bearer abc", "bearer abc", "BEARER   abc "] {
            let header = HeaderValue::from_str(raw).expect("header");
            assert_eq!(bearer_token(Some(&header)), Some("abc"), "{raw}");
        }
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_blanks() {
        let basic = HeaderValue::from_static("Basic abc123");
        let empty = HeaderValue::from_static("Bearer ");
        assert_eq!(bearer_token(Some(&basic)), None);
        assert_eq!(bearer_token(Some(&empty)), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn missing_keys_disable_auth_only_in_development() {
        let dev = AuthState::from_keys(&[], true).expect("dev allows missing keys");
        assert!(!dev.enabled);
        assert!(AuthState::from_keys(&[], false).is_err());
    }

    #[test]
    fn any_configured_token_is_accepted() {
        let state = AuthState::from_keys(&["alpha".to_string(), "beta".to_string()], false)
            .expect("keys");
        assert!(state.allows("alpha"));
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("alph"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let state = AuthState::from_keys(&["secret-token".to_string()], false).expect("keys");
        assert!(!format!("{state:?}").contains("secret-token"));
    }

    #[tokio::test]
    async fn window_rejects_past_limit_with_retry_hint() {
        let limit = RateLimitState::new("test", 2, Duration::from_secs(30));
        assert_eq!(limit.admit().await, Ok(()));
        assert_eq!(limit.admit().await, Ok(()));
        let retry = limit.admit().await.expect_err("third request is over the limit");
        assert!((1..=30).contains(&retry));
    }

    #[tokio::test]
    async fn window_resets_after_its_length() {
        let limit = RateLimitState::new("test", 1, Duration::from_millis(20));
        assert_eq!(limit.admit().await, Ok(()));
        assert!(limit.admit().await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(limit.admit().await, Ok(()));
    }
}

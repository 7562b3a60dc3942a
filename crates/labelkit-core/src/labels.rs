//! The label entity as it travels over the wire and out of the database.
//!
//! Label rows have accumulated loosely typed legacy fields over time: ids
//! that are sometimes numbers, `active` flags stored as `0/1`, and
//! `ruleConfig`/`productIds` persisted as JSON-encoded strings. [`Label`]
//! accepts all of these shapes on deserialization and leaves interpretation
//! to [`Label::match_rule`](crate::rule).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::rule::{Condition, MatchRule, RuleType};
use crate::CoreError;

const MAX_TEXT_LEN: usize = 100;

/// Where a badge sits inside its media container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl LabelPosition {
    pub const ALL: [LabelPosition; 6] = [
        LabelPosition::TopLeft,
        LabelPosition::TopCenter,
        LabelPosition::TopRight,
        LabelPosition::BottomLeft,
        LabelPosition::BottomCenter,
        LabelPosition::BottomRight,
    ];

    /// Position used by the storefront renderer when a label carries none.
    pub const STOREFRONT_DEFAULT: LabelPosition = LabelPosition::TopLeft;

    /// Position assigned by the admin create path when none is supplied.
    pub const ADMIN_DEFAULT: LabelPosition = LabelPosition::BottomCenter;

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LabelPosition::TopLeft => "top-left",
            LabelPosition::TopCenter => "top-center",
            LabelPosition::TopRight => "top-right",
            LabelPosition::BottomLeft => "bottom-left",
            LabelPosition::BottomCenter => "bottom-center",
            LabelPosition::BottomRight => "bottom-right",
        }
    }
}

impl std::fmt::Display for LabelPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A merchant-defined badge and its matching rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub rule_type: Option<String>,
    #[serde(default, deserialize_with = "embedded_json")]
    pub rule_config: Option<Value>,
    #[serde(default, deserialize_with = "embedded_json")]
    pub product_ids: Option<Value>,
    #[serde(default = "default_active", deserialize_with = "lenient_bool")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Label {
    /// An active label that applies to every product.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            background: None,
            position: None,
            condition: None,
            rule_type: None,
            rule_config: None,
            product_ids: None,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// The storefront position, falling back to [`LabelPosition::STOREFRONT_DEFAULT`]
    /// when absent or unrecognized.
    #[must_use]
    pub fn position(&self) -> LabelPosition {
        self.position
            .as_deref()
            .and_then(LabelPosition::parse)
            .unwrap_or(LabelPosition::STOREFRONT_DEFAULT)
    }
}

fn default_active() -> bool {
    true
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn embedded_json<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(decode_embedded_json)
}

/// Unwraps values that were persisted as JSON-encoded strings. A string that
/// does not parse as JSON is kept verbatim so the rule layer can reject it.
/// `null`, blank strings, and the string `"null"` decode to `None`.
#[must_use]
pub fn decode_embedded_json(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "null" {
                None
            } else {
                Some(serde_json::from_str(trimmed).unwrap_or(Value::String(s)))
            }
        }
        other => Some(other),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => default_active(),
    })
}

/// Validates a label before it is written by the admin surface.
///
/// Storefront evaluation never calls this: a label that slipped through (or
/// predates validation) simply never matches.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] describing the first problem found.
pub fn validate_label(label: &Label) -> Result<(), CoreError> {
    let text = label.text.trim();
    if text.is_empty() || text.chars().count() > MAX_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "text must be 1-{MAX_TEXT_LEN} characters"
        )));
    }

    if label
        .background
        .as_deref()
        .is_some_and(|b| b.trim().is_empty())
    {
        return Err(CoreError::Validation(
            "background must not be blank".to_string(),
        ));
    }

    if let Some(position) = label.position.as_deref() {
        if LabelPosition::parse(position).is_none() {
            return Err(CoreError::Validation(format!(
                "position must be one of top-left, top-center, top-right, bottom-left, bottom-center, bottom-right; got '{position}'"
            )));
        }
    }

    let Some(condition) = Condition::parse(label.condition.as_deref()) else {
        return Err(CoreError::Validation(format!(
            "condition must be all, specific, or rule_based; got '{}'",
            label.condition.as_deref().unwrap_or_default()
        )));
    };

    if let Some(raw) = label.rule_type.as_deref() {
        if RuleType::parse(raw).is_none() {
            return Err(CoreError::Validation(format!(
                "rule_type must be specific, special_price, or new_arrival; got '{raw}'"
            )));
        }
    }

    match (condition, label.match_rule()) {
        (Condition::All, _) => Ok(()),
        (_, MatchRule::Never { reason }) => Err(CoreError::Validation(reason.to_string())),
        _ => Ok(()),
    }
}

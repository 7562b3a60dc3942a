pub mod app_config;
pub mod config;
pub mod labels;
pub mod rule;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ShopifyCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use labels::{decode_embedded_json, validate_label, Label, LabelPosition};
pub use rule::{
    parse_int, parse_number, Condition, MatchRule, NeverReason, PriceRange, RuleKind, RuleType,
    OPEN_ENDED_PRICE_CEILING,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid label: {0}")]
    Validation(String),
}

pub mod colors;
pub mod discovery;
pub mod dom;
pub mod error;
pub mod evaluate;
pub mod identity;
pub mod observe;
pub mod orchestrator;
pub mod parse_helpers;
pub mod render;
pub mod selectors;
pub mod signals;
pub mod source;

pub use discovery::{
    detect_page_type, find_card_media_container, find_product_cards, get_product_id_from_card,
    PageType,
};
pub use error::EngineError;
pub use evaluate::{evaluate, explain_at, Decision, DecisionReason};
pub use identity::{ids_match, normalize};
pub use observe::{MemoryObserver, Observer, Tee, TracingObserver};
pub use orchestrator::{
    apply_labels, apply_labels_at, ChannelTriggers, LoadOnce, Orchestrator, PageHost, PassReport,
    RenderOutcome, StaticPage, Trigger, TriggerSource,
};
pub use render::{render_document, Badge, RenderPlan};
pub use signals::{extract_signals, ProductSignals, SignalSource};
pub use source::{LabelFetcher, LabelSourceClient, StaticLabels};

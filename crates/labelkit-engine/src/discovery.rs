//! Locates products on a storefront page: cards on collection pages, the
//! single product on a product page, their identifiers, and the media
//! element a badge is anchored to.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use serde::Serialize;
use serde_json::Value;

use crate::dom::{first_match, is_injected, select_in};
use crate::identity::{normalize, normalize_value};
use crate::selectors::{cards, page};
use crate::signals::embedded::{analytics_meta, json_blocks};

/// What kind of storefront page is being decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    ProductDetail,
    Collection,
    /// Nothing to decorate; the pass is a no-op.
    Other,
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PageType::ProductDetail => "product_detail",
            PageType::Collection => "collection",
            PageType::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Classifies a page by its URL, then by the presence of product cards.
#[must_use]
pub fn detect_page_type(page_url: &str, doc: &Html) -> PageType {
    if handle_from_href(page_url).is_some() {
        PageType::ProductDetail
    } else if !find_product_cards(doc.root_element()).is_empty() {
        PageType::Collection
    } else {
        PageType::Other
    }
}

/// Product cards under `root`, in document order.
///
/// The first card selector whose matches contain a product link wins. When
/// none does, every product link is walked up to its nearest generic
/// wrapper and the wrappers are de-duplicated.
#[must_use]
pub fn find_product_cards(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    for selector in cards::CARDS.iter() {
        let found: Vec<_> = root
            .select(selector)
            .filter(|card| !is_injected(*card) && has_product_link(*card))
            .collect();
        if !found.is_empty() {
            return outermost(found);
        }
    }

    let mut seen = HashSet::new();
    root.select(&cards::PRODUCT_LINK)
        .filter(|link| !is_injected(*link))
        .filter_map(|link| {
            link.ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|el| !matches!(el.value().name(), "body" | "html" | "main"))
                .find(|el| cards::FALLBACK_WRAPPER.matches(el))
        })
        .filter(|wrapper| seen.insert(wrapper.id()))
        .collect()
}

fn has_product_link(card: ElementRef<'_>) -> bool {
    !select_in(card, &cards::PRODUCT_LINK).is_empty()
}

/// Drops cards nested inside another matched card.
fn outermost(found: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<NodeId> = found.iter().map(|card| card.id()).collect();
    found
        .into_iter()
        .filter(|card| !card.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

/// The element inside a card that badges are positioned against.
#[must_use]
pub fn find_card_media_container(card: ElementRef<'_>) -> ElementRef<'_> {
    first_match(card, &cards::MEDIA)
        .or_else(|| select_in(card, &cards::IMAGE_WRAPPER).into_iter().next())
        .or_else(|| {
            select_in(card, &cards::IMAGE)
                .into_iter()
                .next()
                .and_then(|img| img.parent().and_then(ElementRef::wrap))
        })
        .unwrap_or(card)
}

/// The normalized product id of a card, or `None` when nothing usable is
/// found.
#[must_use]
pub fn get_product_id_from_card(card: ElementRef<'_>) -> Option<String> {
    let attr = |el: ElementRef<'_>, name: &str| el.value().attr(name).and_then(normalize);

    attr(card, "data-product-id")
        .or_else(|| attr(find_card_media_container(card), "data-product-id"))
        .or_else(|| attr(card, "data-product-handle"))
        .or_else(|| {
            select_in(card, &cards::PRODUCT_LINK)
                .into_iter()
                .filter_map(|link| link.value().attr("href"))
                .find_map(handle_from_href)
        })
        .or_else(|| {
            json_blocks(card).iter().find_map(|block| {
                ["handle", "id"]
                    .iter()
                    .filter_map(|key| block.get(*key))
                    .find_map(normalize_value)
            })
        })
        // Nested widgets (quick-add forms, wishlist buttons) come last.
        .or_else(|| {
            select_in(card, &cards::PRODUCT_ID)
                .into_iter()
                .find_map(|el| attr(el, "data-product-id"))
        })
}

/// The product id of a product-detail page.
#[must_use]
pub fn page_product_id(doc: &Html, page_url: &str) -> Option<String> {
    let root = doc.root_element();

    first_match(root, &page::PRODUCT_ID_HOLDERS)
        .and_then(|el| el.value().attr("data-product-id"))
        .and_then(normalize)
        .or_else(|| {
            select_in(root, &page::PRODUCT_ID_INPUT)
                .into_iter()
                .filter_map(|input| input.value().attr("value"))
                .find_map(normalize)
        })
        .or_else(|| {
            analytics_meta(root)
                .as_ref()
                .and_then(|meta| meta.pointer("/product/id"))
                .and_then(normalize_value)
        })
        .or_else(|| {
            json_blocks(root)
                .iter()
                .filter(|block| is_product_json(block))
                .find_map(|block| block.get("id").and_then(normalize_value))
        })
        .or_else(|| handle_from_href(page_url))
}

/// Theme product JSON carries at least an id together with a handle or a
/// variants list.
fn is_product_json(block: &Value) -> bool {
    block.get("id").is_some() && (block.get("handle").is_some() || block.get("variants").is_some())
}

/// The badge container on a product-detail page.
#[must_use]
pub fn page_media_container(doc: &Html) -> ElementRef<'_> {
    let root = doc.root_element();
    first_match(root, &page::MEDIA)
        .or_else(|| select_in(root, &page::MAIN).into_iter().next())
        .or_else(|| select_in(root, &page::BODY).into_iter().next())
        .unwrap_or(root)
}

/// Extracts `<handle>` from a `/products/<handle>` URL or path.
#[must_use]
pub fn handle_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let (_, rest) = path.split_once("/products/")?;
    let handle = rest.split('/').next().unwrap_or_default();
    normalize(handle)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;

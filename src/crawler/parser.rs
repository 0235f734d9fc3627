//! Product page parsing
//!
//! This module turns realized documents into product records:
//! - Product-type pages into one [`ProductSummary`] per product card
//! - Product detail pages into a [`ProductDetail`]
//!
//! Both are synchronous so the parsed DOM never lives across an await point.

use crate::extract::{extract_fields, DetailSelectorSet, ListingSelectorSet};
use crate::output::{ProductDetail, ProductSummary};
use crate::session::Document;
use crate::url::resolve_link;

/// Extracts one summary per product card; no cards is an empty result
pub fn parse_listing(page: &Document, selectors: &ListingSelectorSet) -> Vec<ProductSummary> {
    let html = page.parse();

    html.select(selectors.product_card.selector())
        .map(|card| {
            let fields = extract_fields(card, &selectors.fields);
            ProductSummary {
                name: fields.get(ListingSelectorSet::NAME).to_string(),
                price: fields.get(ListingSelectorSet::PRICE).to_string(),
                discount_text: fields.get(ListingSelectorSet::DISCOUNT).to_string(),
                detail_link: fields
                    .non_empty(ListingSelectorSet::DETAIL_LINK)
                    .and_then(|href| resolve_link(href, page.url())),
            }
        })
        .collect()
}

/// Extracts rating, rating count, and description from a detail page
pub fn parse_detail(page: &Document, selectors: &DetailSelectorSet) -> ProductDetail {
    let html = page.parse();
    let fields = extract_fields(html.root_element(), &selectors.fields);

    ProductDetail {
        rating: fields.get(DetailSelectorSet::RATING).to_string(),
        rating_count: fields.get(DetailSelectorSet::RATING_COUNT).to_string(),
        description: fields.get(DetailSelectorSet::DESCRIPTION).to_string(),
    }
}

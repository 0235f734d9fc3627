//! Seed page walker
//!
//! # Discovery Rules
//!
//! 1. Each element matching the category-block selector is a category, named
//!    by its first anchor. A block without an anchor is skipped.
//! 2. Subcategory headings are looked up inside the block. A category without
//!    any heading is skipped.
//! 3. A heading's product types live in the nearest following sibling that
//!    matches the product-type-list selector. The scan stops at the next
//!    heading, so a heading never borrows its neighbour's list. A heading
//!    without a list is skipped.
//! 4. Each anchor inside that list is one leaf. Anchors that do not resolve to
//!    an absolute http(s) URL are skipped.
//!
//! Skips are logged and counted, never raised. Duplicates are kept.

use crate::extract::TaxonomySelectorSet;
use crate::session::Document;
use crate::taxonomy::{CategoryNode, ProductTypeLeaf, SubcategoryNode};
use crate::url::{clean_text, resolve_link};
use scraper::ElementRef;
use std::sync::Arc;
use url::Url;

/// Counts of what the walk found and what it skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub categories: usize,
    pub categories_skipped: usize,
    pub subcategories: usize,
    pub subcategories_skipped: usize,
    pub leaves: usize,
    pub links_skipped: usize,
}

/// The one-shot sequence of leaves produced by [`walk`]
///
/// Consuming it hands the leaves out in discovery order; walking again needs a
/// freshly fetched seed document.
#[derive(Debug)]
pub struct Leaves {
    inner: std::vec::IntoIter<ProductTypeLeaf>,
    summary: WalkSummary,
}

impl Leaves {
    pub fn summary(&self) -> WalkSummary {
        self.summary
    }
}

impl Iterator for Leaves {
    type Item = ProductTypeLeaf;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Leaves {}

/// Walks the seed document into product-type leaves
///
/// Relative links are resolved against the document's URL.
pub fn walk(seed: &Document, selectors: &TaxonomySelectorSet) -> Leaves {
    let html = seed.parse();
    let base = seed.url();
    let mut summary = WalkSummary::default();
    let mut leaves = Vec::new();

    for block in html.select(selectors.category_block.selector()) {
        let Some(category) = category_of(block, base, selectors) else {
            tracing::warn!("Skipping category block without an anchor");
            summary.categories_skipped += 1;
            continue;
        };
        let category = Arc::new(category);

        let headings: Vec<ElementRef<'_>> = block
            .select(selectors.subcategory_heading.selector())
            .collect();
        if headings.is_empty() {
            tracing::warn!("Skipping category '{}': no subcategory headings", category.name);
            summary.categories_skipped += 1;
            continue;
        }
        summary.categories += 1;

        for heading in headings {
            let subcategory = Arc::new(SubcategoryNode {
                name: clean_text(heading.text()),
                link: first_anchor(heading, selectors)
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| link_text(href, base))
                    .unwrap_or_default(),
                parent: category.clone(),
            });

            let Some(list) = following_list(heading, selectors) else {
                tracing::warn!(
                    "Skipping subcategory '{} > {}': no product-type list",
                    category.name,
                    subcategory.name
                );
                summary.subcategories_skipped += 1;
                continue;
            };
            summary.subcategories += 1;

            for anchor in list.select(selectors.anchor.selector()) {
                let name = clean_text(anchor.text());
                let href = anchor.value().attr("href").unwrap_or("");
                let Some(link) = resolve_link(href, base) else {
                    tracing::debug!(
                        "Skipping product type '{}' under '{} > {}': unusable link '{}'",
                        name,
                        category.name,
                        subcategory.name,
                        href
                    );
                    summary.links_skipped += 1;
                    continue;
                };

                leaves.push(ProductTypeLeaf {
                    name,
                    link,
                    category: category.clone(),
                    subcategory: subcategory.clone(),
                });
            }
        }
    }

    summary.leaves = leaves.len();
    tracing::info!(
        "Discovered {} product types in {} categories ({} categories and {} subcategories skipped)",
        summary.leaves,
        summary.categories,
        summary.categories_skipped,
        summary.subcategories_skipped
    );

    Leaves {
        inner: leaves.into_iter(),
        summary,
    }
}

fn category_of(
    block: ElementRef<'_>,
    base: &Url,
    selectors: &TaxonomySelectorSet,
) -> Option<CategoryNode> {
    let anchor = first_anchor(block, selectors)?;
    Some(CategoryNode {
        name: clean_text(anchor.text()),
        link: link_text(anchor.value().attr("href").unwrap_or(""), base),
    })
}

/// The element itself if it is an anchor, else its first descendant anchor
fn first_anchor<'a>(element: ElementRef<'a>, selectors: &TaxonomySelectorSet) -> Option<ElementRef<'a>> {
    if selectors.anchor.selector().matches(&element) {
        return Some(element);
    }
    element.select(selectors.anchor.selector()).next()
}

/// Absolute form of a category or subcategory link, or the raw href
///
/// These links are informational only, so an unresolvable one is kept as-is.
fn link_text(href: &str, base: &Url) -> String {
    resolve_link(href, base)
        .map(String::from)
        .unwrap_or_else(|| href.trim().to_string())
}

fn following_list<'a>(
    heading: ElementRef<'a>,
    selectors: &TaxonomySelectorSet,
) -> Option<ElementRef<'a>> {
    for sibling in heading.next_siblings() {
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        if selectors.subcategory_heading.selector().matches(&element) {
            return None;
        }
        if selectors.product_type_list.selector().matches(&element) {
            return Some(element);
        }
    }
    None
}

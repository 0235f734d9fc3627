//! Product records and their flattening into output rows

use crate::taxonomy::ProductTypeLeaf;
use url::Url;

/// What a product card on a product-type page tells us
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSummary {
    pub name: String,
    pub price: String,
    pub discount_text: String,
    pub detail_link: Option<Url>,
}

/// What a product detail page tells us; every field may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDetail {
    pub rating: String,
    pub rating_count: String,
    pub description: String,
}

/// One flattened record of the output table
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRow {
    pub category: String,
    pub subcategory: String,
    pub product_type: String,
    pub product_name: String,
    pub brand: String,
    pub price: String,
    pub discount: String,
    pub rating: String,
    pub rating_count: String,
    pub description: String,
}

impl OutputRow {
    /// Column names, in record order
    pub const HEADER: [&'static str; 10] = [
        "Category",
        "Subcategory",
        "Product Type",
        "Product Name",
        "Brand",
        "Price",
        "Discount",
        "Rating",
        "Rating Count",
        "Description",
    ];

    pub fn from_parts(
        leaf: &ProductTypeLeaf,
        summary: &ProductSummary,
        detail: &ProductDetail,
    ) -> Self {
        Self {
            category: leaf.category.name.clone(),
            subcategory: leaf.subcategory.name.clone(),
            product_type: leaf.name.clone(),
            product_name: summary.name.clone(),
            brand: brand_of(&summary.name).to_string(),
            price: summary.price.clone(),
            discount: summary.discount_text.clone(),
            rating: detail.rating.clone(),
            rating_count: detail.rating_count.clone(),
            description: detail.description.clone(),
        }
    }

    /// Field values, in [`OutputRow::HEADER`] order
    pub fn fields(&self) -> [&str; 10] {
        [
            &self.category,
            &self.subcategory,
            &self.product_type,
            &self.product_name,
            &self.brand,
            &self.price,
            &self.discount,
            &self.rating,
            &self.rating_count,
            &self.description,
        ]
    }
}

/// The brand is the first whitespace-delimited token of the product name
pub fn brand_of(product_name: &str) -> &str {
    product_name.split_whitespace().next().unwrap_or("")
}

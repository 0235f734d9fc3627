use crate::config::SelectorConfig;
use crate::extract::{Css, FieldMap, FieldSpec};
use crate::ConfigResult;

/// Compiled selectors for every page kind the crawl visits
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub taxonomy: TaxonomySelectorSet,
    pub listing: ListingSelectorSet,
    pub detail: DetailSelectorSet,
}

#[derive(Debug, Clone)]
pub struct TaxonomySelectorSet {
    pub marker: Css,
    pub category_block: Css,
    pub subcategory_heading: Css,
    pub product_type_list: Css,
    /// Any anchor carrying an href
    pub anchor: Css,
}

#[derive(Debug, Clone)]
pub struct ListingSelectorSet {
    pub marker: Css,
    pub product_card: Css,
    pub fields: FieldMap,
}

impl ListingSelectorSet {
    pub const NAME: &'static str = "name";
    pub const PRICE: &'static str = "price";
    pub const DISCOUNT: &'static str = "discount";
    pub const DETAIL_LINK: &'static str = "detail_link";
}

#[derive(Debug, Clone)]
pub struct DetailSelectorSet {
    pub marker: Css,
    pub fields: FieldMap,
}

impl DetailSelectorSet {
    pub const RATING: &'static str = "rating";
    pub const RATING_COUNT: &'static str = "rating_count";
    pub const DESCRIPTION: &'static str = "description";
}

impl SelectorSet {
    /// Compiles every configured selector
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSelector` naming the first selector that
    /// does not parse.
    pub fn compile(config: &SelectorConfig) -> ConfigResult<Self> {
        let taxonomy = TaxonomySelectorSet {
            marker: Css::parse(&config.taxonomy.marker)?,
            category_block: Css::parse(&config.taxonomy.category_block)?,
            subcategory_heading: Css::parse(&config.taxonomy.subcategory_heading)?,
            product_type_list: Css::parse(&config.taxonomy.product_type_list)?,
            anchor: Css::parse("a[href]")?,
        };

        let listing = ListingSelectorSet {
            marker: Css::parse(&config.listing.marker)?,
            product_card: Css::parse(&config.listing.product_card)?,
            fields: vec![
                (ListingSelectorSet::NAME, FieldSpec::parse(&config.listing.name)?),
                (ListingSelectorSet::PRICE, FieldSpec::parse(&config.listing.price)?),
                (
                    ListingSelectorSet::DISCOUNT,
                    FieldSpec::parse(&config.listing.discount)?,
                ),
                (
                    ListingSelectorSet::DETAIL_LINK,
                    FieldSpec::parse(&config.listing.detail_link)?,
                ),
            ],
        };

        let detail = DetailSelectorSet {
            marker: Css::parse(&config.detail.marker)?,
            fields: vec![
                (DetailSelectorSet::RATING, FieldSpec::parse(&config.detail.rating)?),
                (
                    DetailSelectorSet::RATING_COUNT,
                    FieldSpec::parse(&config.detail.rating_count)?,
                ),
                (
                    DetailSelectorSet::DESCRIPTION,
                    FieldSpec::parse(&config.detail.description)?,
                ),
            ],
        };

        Ok(Self {
            taxonomy,
            listing,
            detail,
        })
    }
}

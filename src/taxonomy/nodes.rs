/// Taxonomy node definitions
///
/// Nodes are immutable once the walker builds them; children hold shared
/// references to their parents for lookup only.
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A top-level category of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryNode {
    pub name: String,
    pub link: String,
}

/// A subcategory heading inside a category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubcategoryNode {
    pub name: String,
    /// Link of the heading's anchor, empty if the heading has none
    pub link: String,
    pub parent: Arc<CategoryNode>,
}

/// One product-type page: the unit of work dispatched to the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductTypeLeaf {
    pub name: String,
    /// Always absolute
    pub link: Url,
    pub category: Arc<CategoryNode>,
    pub subcategory: Arc<SubcategoryNode>,
}

impl fmt::Display for ProductTypeLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} > {} > {}",
            self.category.name, self.subcategory.name, self.name
        )
    }
}

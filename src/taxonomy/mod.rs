//! Taxonomy discovery
//!
//! The seed page carries the whole category → subcategory → product-type
//! tree. It is walked once, single-threaded, before any worker starts; the
//! result is a flat, order-preserving sequence of [`ProductTypeLeaf`]s.

mod nodes;
mod walker;

pub use nodes::{CategoryNode, ProductTypeLeaf, SubcategoryNode};
pub use walker::{walk, Leaves, WalkSummary};

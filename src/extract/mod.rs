//! Field extraction from realized documents
//!
//! Extraction is best effort: a selector that matches nothing yields an empty
//! string, never an error. Selector syntax errors are caught once, when the
//! configured selectors are compiled into a [`SelectorSet`].

mod selectors;

pub use selectors::{DetailSelectorSet, ListingSelectorSet, SelectorSet, TaxonomySelectorSet};

use crate::url::clean_text;
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::fmt;

/// A compiled CSS selector that remembers its source text
#[derive(Clone)]
pub struct Css {
    source: String,
    selector: Selector,
}

impl Css {
    /// Compiles a CSS selector
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSelector` if the text is not a valid selector.
    pub fn parse(source: &str) -> ConfigResult<Self> {
        let selector = Selector::parse(source)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Css").field(&self.source).finish()
    }
}

impl fmt::Display for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One field of a field map: a selector plus an optional attribute to read
///
/// Written as `selector` (element text) or `selector@attribute`.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    css: Css,
    attr: Option<String>,
}

impl FieldSpec {
    /// Parses `selector` or `selector@attribute`
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_ripple::extract::FieldSpec;
    ///
    /// let spec = FieldSpec::parse("a.product-link@href").unwrap();
    /// assert_eq!(spec.attr(), Some("href"));
    /// assert_eq!(spec.css().as_str(), "a.product-link");
    /// ```
    pub fn parse(spec: &str) -> ConfigResult<Self> {
        let spec = spec.trim();
        if let Some((css, attr)) = spec.rsplit_once('@') {
            let is_attr_name = !attr.is_empty()
                && attr
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
            if is_attr_name && !css.trim().is_empty() {
                return Ok(Self {
                    css: Css::parse(css.trim())?,
                    attr: Some(attr.to_string()),
                });
            }
        }

        Ok(Self {
            css: Css::parse(spec)?,
            attr: None,
        })
    }

    pub fn css(&self) -> &Css {
        &self.css
    }

    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }
}

/// Named field specs, extracted together from one root element
pub type FieldMap = Vec<(&'static str, FieldSpec)>;

/// Extracted field values; absent fields read as empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(HashMap<String, String>);

impl Fields {
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// Returns the value or None when it is empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        Some(self.get(name)).filter(|v| !v.is_empty())
    }
}

/// Extracts a single field below `root`
///
/// The root itself is considered first, so a card that *is* the anchor can
/// still yield its own `href`.
pub fn extract_field(root: ElementRef<'_>, spec: &FieldSpec) -> String {
    let element = if spec.css.selector().matches(&root) {
        Some(root)
    } else {
        root.select(spec.css.selector()).next()
    };

    match (element, spec.attr()) {
        (Some(el), Some(attr)) => el.value().attr(attr).map(str::trim).unwrap_or("").to_string(),
        (Some(el), None) => clean_text(el.text()),
        (None, _) => String::new(),
    }
}

/// Extracts every field in `map` below `root`
pub fn extract_fields(root: ElementRef<'_>, map: &FieldMap) -> Fields {
    Fields(
        map.iter()
            .map(|(name, spec)| (name.to_string(), extract_field(root, spec)))
            .collect(),
    )
}

/// Returns true if the document contains an element matching `marker`
pub fn has_marker(document: &Html, marker: &Css) -> bool {
    document.select(marker.selector()).next().is_some()
}

//! Highlighting of a step's target element
//!
//! # Invariants
//!
//! 1. While a highlighted step is open, every property of the tour's
//!    [`HighlightStyle`] is set inline on the target.
//! 2. When the step closes, each of those properties is reset to empty,
//!    whichever way the step was left.
//! 3. The target is resolved on first use and cached for the step's
//!    lifetime; a failed lookup is not cached.

use crate::error::{Result, TourError};
use crate::page::{ElementId, Page};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;

/// Default accent background
pub const DEFAULT_BACKGROUND: &str = "#3288e6";

/// Default highlighted text colour
pub const DEFAULT_COLOR: &str = "#fff";

/// CSS properties applied to a highlighted target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightStyle(BTreeMap<String, String>);

impl Default for HighlightStyle {
    fn default() -> Self {
        Self::empty()
            .with("background", DEFAULT_BACKGROUND)
            .with("color", DEFAULT_COLOR)
    }
}

impl HighlightStyle {
    /// A style with no properties
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(property.into(), value.into());
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for HighlightStyle {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Applies and clears a [`HighlightStyle`] on one step's target
pub struct ElementHighlighter {
    page: Rc<Page>,
    selector: String,
    style: HighlightStyle,
    target: OnceCell<ElementId>,
}

impl ElementHighlighter {
    pub fn new(page: Rc<Page>, selector: impl Into<String>, style: HighlightStyle) -> Self {
        Self {
            page,
            selector: selector.into(),
            style,
            target: OnceCell::new(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Resolve (once) the element this highlighter styles
    pub fn target(&self) -> Result<ElementId> {
        if let Some(el) = self.target.get() {
            return Ok(*el);
        }
        let el = self
            .page
            .query(&self.selector)
            .ok_or_else(|| TourError::target_not_found(&self.selector))?;
        Ok(*self.target.get_or_init(|| el))
    }

    pub fn apply(&self) -> Result<()> {
        let el = self.target()?;
        trace!(selector = %self.selector, "applying highlight");
        for (property, value) in self.style.iter() {
            self.page.set_css(el, property, value)?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let el = self.target()?;
        trace!(selector = %self.selector, "clearing highlight");
        for property in self.style.properties() {
            self.page.set_css(el, property, "")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = HighlightStyle::default();
        assert_eq!(style.get("background"), Some(DEFAULT_BACKGROUND));
        assert_eq!(style.get("color"), Some(DEFAULT_COLOR));
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn test_style_deserializes_from_map() {
        let style: HighlightStyle =
            serde_json::from_str(r#"{"outline": "1px solid red"}"#).unwrap();
        assert_eq!(style, HighlightStyle::empty().with("outline", "1px solid red"));
    }

    #[test]
    fn test_apply_then_clear_keeps_unrelated_styles() {
        let page = Rc::new(Page::new());
        let el = page.create_element(page.body(), Some("menu")).unwrap();
        page.set_css(el, "width", "10").unwrap();
        let before = page.style(el);

        let highlighter = ElementHighlighter::new(page.clone(), "#menu", HighlightStyle::default());
        highlighter.apply().unwrap();
        assert_eq!(page.css(el, "background").as_deref(), Some(DEFAULT_BACKGROUND));
        assert_eq!(page.css(el, "width").as_deref(), Some("10"));

        highlighter.clear().unwrap();
        assert_eq!(page.style(el), before);
    }

    #[test]
    fn test_missing_target_is_not_cached() {
        let page = Rc::new(Page::new());
        let highlighter = ElementHighlighter::new(page.clone(), "#late", HighlightStyle::default());
        assert!(matches!(highlighter.apply(), Err(TourError::TargetNotFound(_))));

        let el = page.create_element(page.body(), Some("late")).unwrap();
        highlighter.apply().unwrap();
        assert_eq!(highlighter.target().unwrap(), el);
    }

    #[test]
    fn test_target_is_cached_after_first_lookup() {
        let page = Rc::new(Page::new());
        let first = page.create_element(page.body(), Some("dup")).unwrap();
        let highlighter = ElementHighlighter::new(page.clone(), "#dup", HighlightStyle::default());
        assert_eq!(highlighter.target().unwrap(), first);

        page.remove_element(first);
        page.create_element(page.body(), Some("dup")).unwrap();
        assert_eq!(highlighter.target().unwrap(), first);
    }
}

//! Tour definition files.
//!
//! A definition is a JSON document holding the tour options and its ordered
//! steps:
//!
//! ```json
//! {
//!   "id": "intro",
//!   "highlight": { "background": "#3288e6", "color": "#fff" },
//!   "steps": [
//!     { "title": "Menu", "text": "Pick a screen here.",
//!       "attachTo": { "element": "#menu", "on": "right" },
//!       "highlightElement": true }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::TourEngine;
use crate::step::StepSpec;
use crate::tour::{GuidedTour, TourEnv, TourOptions};

/// Options plus steps, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourDefinition {
    #[serde(flatten)]
    pub options: TourOptions,
    pub steps: Vec<StepSpec>,
}

impl TourDefinition {
    pub fn new(options: TourOptions, steps: Vec<StepSpec>) -> Self {
        Self { options, steps }
    }

    /// Parse a definition from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse tour definition JSON")
    }

    /// Load a definition from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read tour definition from {:?}", path.as_ref()))?;
        Self::from_json(&content)
    }

    /// Save the definition as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize tour definition")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write tour definition to {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Build a tour from this definition
    pub fn build<E: TourEngine>(&self, env: &TourEnv) -> Result<GuidedTour<E>> {
        GuidedTour::new(env, self.steps.clone(), self.options.clone())
            .context("Failed to build tour from definition")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Placement;
    use tempfile::tempdir;

    const SAMPLE: &str = r##"{
        "id": "intro",
        "steps": [
            { "text": "Welcome" },
            { "title": "Menu", "text": "Pick a screen.",
              "attachTo": { "element": "#menu", "on": "right" },
              "highlightElement": true, "noArrow": true,
              "classes": ["wide"], "buttons": { "done": "Got it" } }
        ]
    }"##;

    #[test]
    fn test_parse_definition() {
        let def = TourDefinition::from_json(SAMPLE).unwrap();
        assert_eq!(def.options.id.as_deref(), Some("intro"));
        assert_eq!(def.steps.len(), 2);

        let menu = &def.steps[1];
        assert!(menu.highlight_element);
        assert!(menu.no_arrow);
        assert_eq!(menu.attach_to.as_ref().unwrap().on, Placement::Right);
        assert_eq!(menu.buttons.done.as_deref(), Some("Got it"));
        assert_eq!(menu.classes, vec!["wide"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tour.json");
        let def = TourDefinition::from_json(SAMPLE).unwrap();
        def.save_to_file(&path).unwrap();

        let loaded = TourDefinition::load_from_file(&path).unwrap();
        assert_eq!(loaded, def);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = TourDefinition::load_from_file("/nonexistent/tour.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read tour definition"));
    }

    #[test]
    fn test_build_tour() {
        let env = TourEnv::in_memory();
        let def = TourDefinition::from_json(SAMPLE).unwrap();
        let tour: GuidedTour = def.build(&env).unwrap();
        assert_eq!(tour.options().id.as_deref(), Some("intro"));
    }
}

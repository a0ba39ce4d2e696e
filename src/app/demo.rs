//! Built-in demo screen and tour

use crate::config_file::TourDefinition;
use crate::step::StepSpec;
use crate::tour::TourOptions;
use crate::types::Placement;

/// Page regions of the demo screen: (element id, title)
pub const REGIONS: [(&str, &str); 4] = [
    ("header", "Guided Tour Demo"),
    ("menu", "Menu"),
    ("content", "Content"),
    ("status", "Status"),
];

/// Menu entries drawn in the menu region
pub const MENU_ITEMS: [&str; 4] = ["Overview", "Projects", "Settings", "Help"];

/// The tour run when no definition file is given
pub fn demo_definition() -> TourDefinition {
    let steps = vec![
        StepSpec::new(
            "This short tour walks through the screen. Use ←/→ to pick a button \
             and Enter to press it, or click with the mouse.",
        )
        .title("Welcome")
        .attach_to("#header", Placement::Bottom),
        StepSpec::new("The menu switches between screens. It is highlighted while this step is open.")
            .title("Menu")
            .attach_to("#menu", Placement::Right)
            .highlight(),
        StepSpec::new("Whatever you pick in the menu shows up here.")
            .title("Content")
            .attach_to("#content", Placement::Center)
            .highlight()
            .no_arrow(),
        StepSpec::new(
            "Status messages appear at the bottom. Click anywhere outside this \
             bubble to hide the tour; press f to bring it back.",
        )
        .title("Status bar")
        .attach_to("#status", Placement::Top)
        .highlight(),
    ];
    TourDefinition::new(TourOptions::default().with_id("demo"), steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_steps_target_known_regions() {
        let def = demo_definition();
        for step in &def.steps {
            let target = step.attach_to.as_ref().unwrap();
            let id = target.element.trim_start_matches('#');
            assert!(REGIONS.iter().any(|(region, _)| *region == id), "{id}");
        }
    }

    #[test]
    fn test_last_step_points_at_force_key() {
        // The demo tour is marked seen once shown, so only `f` brings it back
        let def = demo_definition();
        assert!(def.options.id.is_some());
        let last = def.steps.last().unwrap();
        assert!(last.text.contains("press f"));
    }
}

// Integration tests for guided tours
//
// These tests drive complete tours through the public API:
// - Seen-state decides whether a tour starts (unless forced)
// - Clicking outside the open step hides the tour
// - Only the most recently started tour owns the dismissal handler
// - Controllers dropped mid-lookup never act afterwards

use guided_tour::tour::BODY_NAMESPACE;
use guided_tour::{
    GuidedTour, MemoryUserData, Page, Placement, Scheduler, StepSpec, StorageAdapter,
    TourDefinition, TourEngine, TourEnv, TourError, TourOptions, TourState,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================================
// Helpers
// =============================================================================

fn env_with_regions() -> TourEnv {
    let env = TourEnv::in_memory();
    for id in ["menu", "content"] {
        env.page.create_element(env.page.body(), Some(id)).unwrap();
    }
    env
}

/// Environment whose user-data replies arrive on the next tick
fn deferred_env() -> TourEnv {
    let scheduler = Scheduler::new();
    let storage = StorageAdapter::new(
        "guided-tour",
        Some(Box::new(MemoryUserData::deferred(scheduler.clone()))),
        None,
    );
    TourEnv::new(Rc::new(Page::new()), scheduler, storage)
}

fn plain_steps(n: usize) -> Vec<StepSpec> {
    (0..n).map(|i| StepSpec::new(format!("Step {i}"))).collect()
}

fn tour(env: &TourEnv, steps: Vec<StepSpec>, options: TourOptions) -> GuidedTour {
    GuidedTour::new(env, steps, options).unwrap()
}

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let calls = Rc::new(Cell::new(0));
    let inner = calls.clone();
    (calls, move || inner.set(inner.get() + 1))
}

fn seen(tour: &GuidedTour) -> Option<bool> {
    let slot = Rc::new(RefCell::new(None));
    let out = slot.clone();
    tour.is_seen(move |seen| *out.borrow_mut() = Some(seen));
    slot.take()
}

// =============================================================================
// Seen-state
// =============================================================================

#[test]
fn test_tour_without_id_always_starts() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(3), TourOptions::default());

    for expected in 1..=2 {
        let (calls, on_started) = counter();
        tour.start(false, on_started);
        assert_eq!(calls.get(), 1, "start #{expected}");
        assert!(tour.is_open());
        tour.engine().cancel().unwrap();
    }
    assert_eq!(seen(&tour), Some(false));
}

#[test]
fn test_tour_with_id_starts_once() {
    let env = env_with_regions();
    let options = TourOptions::default().with_id("demo");
    let first = tour(&env, plain_steps(3), options.clone());

    assert_eq!(seen(&first), Some(false));
    let (calls, on_started) = counter();
    first.start(false, on_started);
    assert_eq!(calls.get(), 1);
    assert_eq!(seen(&first), Some(true));
    first.engine().cancel().unwrap();

    // A fresh controller over the same storage sees the flag
    let second = tour(&env, plain_steps(3), options);
    let (calls, on_started) = counter();
    second.start(false, on_started);
    assert_eq!(calls.get(), 0);
    assert!(!second.is_open());
    assert_eq!(second.state(), TourState::NotStarted);
}

#[test]
fn test_forced_start_ignores_seen_state() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(2), TourOptions::default().with_id("demo"));
    tour.set_tour_seen();

    let (calls, on_started) = counter();
    tour.start(true, on_started);
    assert_eq!(calls.get(), 1);
    assert!(tour.is_open());
}

#[test]
fn test_forget_seen_allows_auto_start_again() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(2), TourOptions::default().with_id("demo"));
    tour.set_tour_seen();
    tour.forget_seen();
    assert_eq!(seen(&tour), Some(false));

    let (calls, on_started) = counter();
    tour.start(false, on_started);
    assert_eq!(calls.get(), 1);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_is_open_follows_lifecycle() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(3), TourOptions::default());
    assert!(!tour.is_open());

    tour.launch().unwrap();
    assert!(tour.is_open());
    tour.engine().next().unwrap();
    assert!(tour.is_open());

    tour.hide().unwrap();
    assert!(!tour.is_open());
    assert_eq!(tour.state(), TourState::Hidden);

    tour.launch().unwrap();
    assert_eq!(tour.engine().current_step().unwrap().index, 0);
    tour.engine().complete().unwrap();
    assert!(!tour.is_open());
    assert_eq!(tour.state(), TourState::Completed);
}

#[test]
fn test_walk_through_with_buttons() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(3), TourOptions::default());
    tour.launch().unwrap();

    // Next, Back, Next, Next, Done
    for button in [1, 0, 1, 1, 1] {
        tour.engine().press(button).unwrap();
    }
    assert_eq!(tour.state(), TourState::Completed);
    assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 0);
}

#[test]
fn test_highlight_restored_after_tour() {
    let env = env_with_regions();
    let menu = env.page.query("#menu").unwrap();
    env.page.set_css(menu, "border", "1px solid").unwrap();
    let steps = vec![
        StepSpec::new("Welcome"),
        StepSpec::new("The menu")
            .attach_to("#menu", Placement::Right)
            .highlight(),
    ];
    let tour = tour(&env, steps, TourOptions::default());
    let before = env.page.style(menu);

    tour.launch().unwrap();
    for _ in 0..2 {
        tour.engine().next().unwrap();
        assert_eq!(env.page.css(menu, "background").as_deref(), Some("#3288e6"));
        assert_eq!(env.page.css(menu, "border").as_deref(), Some("1px solid"));

        tour.engine().back().unwrap();
        assert_eq!(env.page.style(menu), before);
    }
}

#[test]
fn test_next_onto_broken_step_leaves_tour_closed() {
    let env = env_with_regions();
    let steps = vec![
        StepSpec::new("Welcome"),
        StepSpec::new("Nowhere")
            .attach_to("#missing", Placement::Left)
            .highlight(),
    ];
    let tour = tour(&env, steps, TourOptions::default());
    tour.launch().unwrap();

    assert!(matches!(tour.engine().next(), Err(TourError::TargetNotFound(_))));
    assert!(!tour.is_open());
    assert_eq!(env.page.query(".guided-tour-step"), None);
}

#[test]
fn test_missing_highlight_target_fails_launch() {
    let env = TourEnv::in_memory();
    let steps = vec![
        StepSpec::new("Nowhere")
            .attach_to("#missing", Placement::Bottom)
            .highlight(),
    ];
    let tour = tour(&env, steps, TourOptions::default());

    let err = tour.launch().unwrap_err();
    assert!(matches!(err, TourError::TargetNotFound(_)), "{err}");
    assert!(!tour.is_open());
    assert_eq!(tour.state(), TourState::NotStarted);
    assert_eq!(env.page.query(".guided-tour-step"), None);

    let (calls, on_started) = counter();
    tour.start(true, on_started);
    assert_eq!(calls.get(), 0);
}

// =============================================================================
// Dismissal
// =============================================================================

#[test]
fn test_click_outside_hides_tour() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(2), TourOptions::default());
    tour.launch().unwrap();
    env.scheduler.run_pending();

    let content = env.page.query("#content").unwrap();
    env.page.click(content);
    assert!(!tour.is_open());
    assert_eq!(tour.state(), TourState::Hidden);
}

#[test]
fn test_click_inside_step_keeps_tour_open() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(2), TourOptions::default());
    tour.launch().unwrap();
    let root = tour.engine().current_step().unwrap().element.unwrap();

    // Before the suppressor is installed the click still reaches the body
    assert!(env.page.click(root));
    assert!(tour.is_open());

    env.scheduler.run_pending();
    assert!(!env.page.click(root));
    assert!(tour.is_open());
}

#[test]
fn test_last_started_tour_owns_dismissal() {
    let env = env_with_regions();
    let first = tour(&env, plain_steps(2), TourOptions::default());
    let second = tour(&env, plain_steps(2), TourOptions::default());

    first.launch().unwrap();
    second.launch().unwrap();
    assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 1);

    env.page.click(env.page.body());
    assert_eq!(second.state(), TourState::Hidden);
    assert_eq!(first.state(), TourState::Running);
    assert!(first.is_open());
}

#[test]
fn test_cancel_releases_dismissal() {
    let env = env_with_regions();
    let tour = tour(&env, plain_steps(2), TourOptions::default());
    tour.launch().unwrap();
    tour.engine().press(0).unwrap();

    assert_eq!(tour.state(), TourState::Cancelled);
    assert!(!tour.is_open());
    assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 0);
}

// =============================================================================
// Deferred seen-state lookups
// =============================================================================

#[test]
fn test_deferred_lookup_starts_on_next_tick() {
    let env = deferred_env();
    let tour = tour(&env, plain_steps(2), TourOptions::default().with_id("later"));

    let (calls, on_started) = counter();
    tour.start(false, on_started);
    assert!(!tour.is_open());
    assert_eq!(calls.get(), 0);

    env.scheduler.run_pending();
    assert!(tour.is_open());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_dropped_tour_ignores_late_lookup() {
    let env = deferred_env();
    let tour = tour(&env, plain_steps(2), TourOptions::default().with_id("later"));

    let (calls, on_started) = counter();
    tour.start(false, on_started);
    drop(tour);

    env.scheduler.run_until_idle(10);
    assert_eq!(calls.get(), 0);
    assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 0);
}

// =============================================================================
// Definition files
// =============================================================================

#[test]
fn test_definition_file_builds_running_tour() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tour.json");
    std::fs::write(
        &path,
        r##"{
            "id": "intro",
            "steps": [
                { "text": "Hello" },
                { "title": "Menu", "text": "Pick here",
                  "attachTo": { "element": "#menu", "on": "right" },
                  "highlightElement": true,
                  "buttons": { "done": "Finish" } }
            ]
        }"##,
    )
    .unwrap();

    let env = env_with_regions();
    let definition = TourDefinition::load_from_file(&path).unwrap();
    let tour: GuidedTour = definition.build(&env).unwrap();
    assert_eq!(tour.options().seen_key().as_deref(), Some("intro-seen"));

    tour.launch().unwrap();
    tour.engine().next().unwrap();
    let step = tour.engine().current_config().unwrap();
    assert_eq!(step.buttons[1].label, "Finish");
    assert_eq!(step.title.as_deref(), Some("Menu"));
}

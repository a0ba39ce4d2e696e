//! Guided tour controller
//!
//! A [`GuidedTour`] owns one engine instance, builds its steps from author
//! specs, and decides whether the tour starts based on the seen-state kept
//! in the [`StorageAdapter`].
//!
//! # State flow
//!
//! ```text
//! NotStarted ──start──▶ Running ──▶ Completed | Cancelled | Hidden
//!                          ▲                    │
//!                          └──start(force)──────┘
//! ```
//!
//! While running, the tour owns the page-level dismissal handler in the
//! [`BODY_NAMESPACE`] namespace: a click that lands outside every step hides
//! the tour. Starting any tour replaces whatever handler was bound there.

use crate::engine::{EngineConfig, StepTour, TourEngine, TourEvent};
use crate::error::Result;
use crate::highlight::HighlightStyle;
use crate::page::{BodySubscription, ClickEvent, ClickHandler, Page};
use crate::scheduler::Scheduler;
use crate::step::{STEP_CLASS, StepSpec, StepWiring};
use crate::storage::StorageAdapter;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use strum::Display;
use tracing::{debug, error, info, trace};

/// Namespace of the page-level dismissal handler
pub const BODY_NAMESPACE: &str = "guided-tour";

/// Tour-wide options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourOptions {
    /// Style applied to highlighted targets
    pub highlight: HighlightStyle,
    /// Key namespacing the seen-state; `None` disables persistence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TourOptions {
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_highlight(mut self, highlight: HighlightStyle) -> Self {
        self.highlight = highlight;
        self
    }

    /// Storage key of the seen flag, if persistence is enabled
    pub fn seen_key(&self) -> Option<String> {
        self.id.as_ref().map(|id| format!("{id}-seen"))
    }
}

/// Lifecycle of one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TourState {
    NotStarted,
    Running,
    Completed,
    Cancelled,
    Hidden,
}

impl TourState {
    /// True once a run has ended one way or another
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Hidden)
    }
}

/// The host surfaces a tour runs against
#[derive(Debug, Clone)]
pub struct TourEnv {
    pub page: Rc<Page>,
    pub scheduler: Scheduler,
    pub storage: StorageAdapter,
}

impl TourEnv {
    pub fn new(page: Rc<Page>, scheduler: Scheduler, storage: StorageAdapter) -> Self {
        Self {
            page,
            scheduler,
            storage,
        }
    }

    /// Fresh page, scheduler and in-memory storage
    pub fn in_memory() -> Self {
        Self::new(
            Rc::new(Page::new()),
            Scheduler::new(),
            StorageAdapter::in_memory(),
        )
    }
}

struct TourInner<E: TourEngine> {
    engine: E,
    env: TourEnv,
    options: TourOptions,
    state: Cell<TourState>,
    dismissal: RefCell<Option<BodySubscription>>,
}

impl<E: TourEngine> TourInner<E> {
    fn set_seen(&self) {
        match self.options.seen_key() {
            Some(key) => self.env.storage.set(&key, true),
            None => trace!("tour has no id, seen-state not stored"),
        }
    }

    fn check_seen(&self, done: impl FnOnce(bool) + 'static) {
        match self.options.seen_key() {
            Some(key) => self
                .env
                .storage
                .get(&key, move |value| {
                    done(value.and_then(|v| v.as_flag()).unwrap_or(false))
                }),
            None => done(false),
        }
    }

    fn release_dismissal(&self) {
        if let Some(subscription) = self.dismissal.borrow_mut().take() {
            self.env.page.release(subscription);
        }
    }

    fn finish(&self, state: TourState) {
        self.state.set(state);
        self.release_dismissal();
        debug!(id = ?self.options.id, %state, "tour ended");
    }
}

impl<E: TourEngine> Drop for TourInner<E> {
    fn drop(&mut self) {
        if let Some(subscription) = self.dismissal.get_mut().take() {
            self.env.page.release(subscription);
        }
    }
}

/// Multi-step guided tour with remembered seen-state
pub struct GuidedTour<E: TourEngine = StepTour> {
    inner: Rc<TourInner<E>>,
}

impl<E: TourEngine> GuidedTour<E> {
    /// Build a tour from ordered step specs.
    ///
    /// Fails if a step asks for highlighting without naming a target.
    pub fn new(env: &TourEnv, steps: Vec<StepSpec>, options: TourOptions) -> Result<Self> {
        let engine = E::create(EngineConfig::default(), env.page.clone());
        let count = steps.len();
        let wiring = StepWiring {
            page: &env.page,
            scheduler: &env.scheduler,
            highlight: &options.highlight,
        };
        for (index, spec) in steps.into_iter().enumerate() {
            engine.add_step(wiring.build(spec, index, count)?);
        }

        let inner = Rc::new(TourInner {
            engine,
            env: env.clone(),
            options,
            state: Cell::new(TourState::NotStarted),
            dismissal: RefCell::new(None),
        });
        register_lifecycle(&inner);
        debug!(id = ?inner.options.id, steps = count, "tour built");
        Ok(Self { inner })
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn options(&self) -> &TourOptions {
        &self.inner.options
    }

    pub fn state(&self) -> TourState {
        self.inner.state.get()
    }

    /// Start the tour.
    ///
    /// Unless `force` is set, the tour only starts if it has not been seen;
    /// the seen-state lookup may complete later. `on_started` runs once the
    /// tour is showing its first step. Faults raised while starting are
    /// logged and `on_started` is skipped; use [`GuidedTour::launch`] to
    /// receive them.
    pub fn start(&self, force: bool, on_started: impl FnOnce() + 'static) {
        if force {
            launch_then(&self.inner, on_started);
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        self.inner.check_seen(move |seen| {
            let Some(inner) = weak.upgrade() else {
                debug!("tour dropped before its seen-state arrived");
                return;
            };
            if seen {
                debug!(id = ?inner.options.id, "tour already seen, not starting");
                return;
            }
            launch_then(&inner, on_started);
        });
    }

    /// Start the tour now, regardless of seen-state
    pub fn launch(&self) -> Result<()> {
        launch(&self.inner)
    }

    /// Hide the tour. Seen-state is left alone.
    pub fn hide(&self) -> Result<()> {
        self.inner.engine.hide()
    }

    /// True while a step is displayed
    pub fn is_open(&self) -> bool {
        self.inner
            .engine
            .current_step()
            .is_some_and(|step| step.is_open())
    }

    /// Remember that this tour has been seen
    pub fn set_tour_seen(&self) {
        self.inner.set_seen();
    }

    /// Forget the seen-state so the tour auto-starts again
    pub fn forget_seen(&self) {
        if let Some(key) = self.inner.options.seen_key() {
            self.inner.env.storage.set(&key, false);
        }
    }

    /// Deliver whether this tour has been seen.
    ///
    /// Always `false` for tours without an id.
    pub fn is_seen(&self, done: impl FnOnce(bool) + 'static) {
        self.inner.check_seen(done);
    }
}

impl<E: TourEngine> std::fmt::Debug for GuidedTour<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuidedTour")
            .field("id", &self.inner.options.id)
            .field("state", &self.state())
            .field("steps", &self.inner.engine.step_count())
            .finish()
    }
}

fn register_lifecycle<E: TourEngine>(inner: &Rc<TourInner<E>>) {
    let transitions = [
        (TourEvent::Complete, TourState::Completed),
        (TourEvent::Cancel, TourState::Cancelled),
    ];
    for (event, state) in transitions {
        let weak = Rc::downgrade(inner);
        inner.engine.on(
            event,
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.finish(state);
                }
            }),
        );
    }

    let weak: Weak<TourInner<E>> = Rc::downgrade(inner);
    inner.engine.on(
        TourEvent::Hide,
        Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.state.get() == TourState::Running {
                    inner.state.set(TourState::Hidden);
                }
            }
        }),
    );
}

fn launch<E: TourEngine>(inner: &Rc<TourInner<E>>) -> Result<()> {
    inner.set_seen();

    inner.release_dismissal();
    let replaced = inner.env.page.unbind_body(BODY_NAMESPACE);
    if replaced > 0 {
        debug!(replaced, "replaced another tour's dismissal handler");
    }

    inner.engine.start()?;
    inner.state.set(TourState::Running);

    let weak = Rc::downgrade(inner);
    let dismiss: ClickHandler = Rc::new(move |event: &mut ClickEvent| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if inner.env.page.closest(event.target(), STEP_CLASS).is_some() {
            return;
        }
        trace!("click outside the tour, hiding");
        if let Err(err) = inner.engine.hide() {
            error!("failed to hide tour: {}", err);
        }
    });
    let subscription = inner.env.page.bind_body(BODY_NAMESPACE, dismiss);
    *inner.dismissal.borrow_mut() = Some(subscription);

    info!(id = ?inner.options.id, "tour started");
    Ok(())
}

fn launch_then<E: TourEngine>(inner: &Rc<TourInner<E>>, on_started: impl FnOnce()) {
    match launch(inner) {
        Ok(()) => on_started(),
        Err(err) => error!(id = ?inner.options.id, "failed to start tour: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Placement;

    fn env_with_target() -> TourEnv {
        let env = TourEnv::in_memory();
        env.page
            .create_element(env.page.body(), Some("menu"))
            .unwrap();
        env
    }

    fn steps(n: usize) -> Vec<StepSpec> {
        (0..n).map(|i| StepSpec::new(format!("step {i}"))).collect()
    }

    #[test]
    fn test_seen_key() {
        assert_eq!(TourOptions::default().seen_key(), None);
        assert_eq!(
            TourOptions::default().with_id("demo").seen_key().as_deref(),
            Some("demo-seen")
        );
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: TourOptions = serde_json::from_str(r#"{"id": "intro"}"#).unwrap();
        assert_eq!(options.id.as_deref(), Some("intro"));
        assert_eq!(options.highlight, HighlightStyle::default());
    }

    #[test]
    fn test_new_rejects_highlight_without_target() {
        let env = TourEnv::in_memory();
        let specs = vec![StepSpec::new("a"), StepSpec::new("b").highlight()];
        let result: Result<GuidedTour> = GuidedTour::new(&env, specs, TourOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_launch_sets_running_and_binds_dismissal() {
        let env = env_with_target();
        let tour: GuidedTour = GuidedTour::new(&env, steps(2), TourOptions::default()).unwrap();
        assert_eq!(tour.state(), TourState::NotStarted);

        tour.launch().unwrap();
        assert_eq!(tour.state(), TourState::Running);
        assert!(tour.is_open());
        assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 1);
    }

    #[test]
    fn test_complete_releases_dismissal() {
        let env = env_with_target();
        let tour: GuidedTour = GuidedTour::new(&env, steps(1), TourOptions::default()).unwrap();
        tour.launch().unwrap();
        tour.engine().press(1).unwrap();

        assert_eq!(tour.state(), TourState::Completed);
        assert!(!tour.is_open());
        assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 0);
    }

    #[test]
    fn test_dropping_tour_releases_dismissal() {
        let env = env_with_target();
        let tour: GuidedTour = GuidedTour::new(&env, steps(1), TourOptions::default()).unwrap();
        tour.launch().unwrap();
        drop(tour);
        assert_eq!(env.page.body_binding_count(BODY_NAMESPACE), 0);
    }

    #[test]
    fn test_highlighted_step_styles_target() {
        let env = env_with_target();
        let specs = vec![StepSpec::new("look").attach_to("#menu", Placement::Right).highlight()];
        let tour: GuidedTour = GuidedTour::new(&env, specs, TourOptions::default()).unwrap();
        let menu = env.page.query("#menu").unwrap();

        tour.launch().unwrap();
        assert_eq!(env.page.css(menu, "color").as_deref(), Some("#fff"));
        tour.hide().unwrap();
        assert!(env.page.style(menu).is_empty());
        assert_eq!(tour.state(), TourState::Hidden);
    }
}

//! Step-tour engine
//!
//! [`TourEngine`] is the capability a guided tour drives: it accepts step
//! configurations, moves between them and reports lifecycle events.
//! [`StepTour`] is the in-process implementation.
//!
//! # Lifecycle
//!
//! ```text
//! start ──▶ show(0) ──next──▶ show(1) ── … ──next/complete──▶ Complete
//!              ▲                 │
//!              └──────back───────┘
//! any step ──cancel──▶ Cancel        any step ──hide──▶ (closed, still current)
//! ```
//!
//! Showing a step creates its root element on the page and runs the step's
//! show hooks; hiding runs the hide hooks and removes the element.

use crate::error::{Result, TourError};
use crate::page::{ElementId, Page};
use crate::step::{Button, StepConfig, StepContext};
use crate::types::EngineAction;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use strum::Display;
use tracing::debug;

/// Class carried by every step root element the engine creates
pub const STEP_ROOT_CLASS: &str = "tour-step-element";

/// Class added to step roots when the cancel link is shown
pub const CANCEL_LINK_CLASS: &str = "tour-has-cancel-link";

/// Tour-level events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TourEvent {
    Start,
    /// A step was shown
    Show,
    /// The tour was hidden with [`TourEngine::hide`]
    Hide,
    Cancel,
    Complete,
}

/// Handler for a [`TourEvent`]
pub type EventHandler = Rc<dyn Fn()>;

/// Identifies a handler registered with [`TourEngine::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Engine construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Show a cancel ("×") link on every step
    pub show_cancel_link: bool,
    /// Classes added to every step root
    pub classes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            show_cancel_link: true,
            classes: vec!["guided-tour".to_string()],
        }
    }
}

/// Snapshot of the engine's current step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub index: usize,
    pub id: String,
    pub open: bool,
    /// Root element while the step is open
    pub element: Option<ElementId>,
}

impl StepStatus {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// The step-tour capability a guided tour is built on
pub trait TourEngine: 'static {
    /// Create an engine that renders onto `page`
    fn create(config: EngineConfig, page: Rc<Page>) -> Self
    where
        Self: Sized;

    fn add_step(&self, step: StepConfig);

    fn step_count(&self) -> usize;

    /// Show the first step
    fn start(&self) -> Result<()>;

    /// Close the current step without ending the tour
    fn hide(&self) -> Result<()>;

    fn cancel(&self) -> Result<()>;

    fn back(&self) -> Result<()>;

    fn next(&self) -> Result<()>;

    fn complete(&self) -> Result<()>;

    fn current_step(&self) -> Option<StepStatus>;

    fn on(&self, event: TourEvent, handler: EventHandler) -> HandlerId;

    fn off(&self, id: HandlerId) -> bool;

    /// Resolve a button action against this engine
    fn perform(&self, action: EngineAction) -> Result<()> {
        match action {
            EngineAction::Cancel => self.cancel(),
            EngineAction::Back => self.back(),
            EngineAction::Next => self.next(),
            EngineAction::Complete => self.complete(),
        }
    }
}

struct ActiveStep {
    index: usize,
    element: Option<ElementId>,
}

struct StepTourInner {
    config: EngineConfig,
    page: Rc<Page>,
    steps: RefCell<Vec<Rc<StepConfig>>>,
    current: RefCell<Option<ActiveStep>>,
    handlers: RefCell<Vec<(HandlerId, TourEvent, EventHandler)>>,
    next_handler: Cell<u64>,
}

/// In-process step-tour engine
#[derive(Clone)]
pub struct StepTour {
    inner: Rc<StepTourInner>,
}

impl StepTour {
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Configuration of step `index`
    pub fn step(&self, index: usize) -> Option<Rc<StepConfig>> {
        self.inner.steps.borrow().get(index).cloned()
    }

    /// Configuration of the current step, open or not
    pub fn current_config(&self) -> Option<Rc<StepConfig>> {
        let index = self.inner.current.borrow().as_ref()?.index;
        self.step(index)
    }

    /// Press button `index` of the open step
    pub fn press(&self, index: usize) -> Result<()> {
        let button: Button = self
            .open_step()
            .and_then(|step| step.buttons.get(index).cloned())
            .ok_or_else(|| TourError::engine(format!("no button {index} on an open step")))?;
        debug!(label = %button.label, action = %button.action, "button pressed");
        self.perform(button.action)
    }

    /// Activate the cancel link of the open step, if the link is enabled
    pub fn cancel_link(&self) -> Result<()> {
        if !self.inner.config.show_cancel_link {
            return Err(TourError::engine("cancel link is disabled"));
        }
        if self.open_step().is_none() {
            return Err(TourError::engine("no open step"));
        }
        self.cancel()
    }

    fn open_step(&self) -> Option<Rc<StepConfig>> {
        let current = self.inner.current.borrow();
        let active = current.as_ref().filter(|a| a.element.is_some())?;
        self.step(active.index)
    }

    fn emit(&self, event: TourEvent) {
        let handlers: Vec<EventHandler> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn show(&self, index: usize) -> Result<()> {
        let step = self
            .step(index)
            .ok_or_else(|| TourError::engine(format!("no step at index {index}")))?;
        self.close_current()?;

        let page = &self.inner.page;
        let root = page.create_element(page.body(), Some(step.id.as_str()))?;
        page.add_class(root, STEP_ROOT_CLASS)?;
        if self.inner.config.show_cancel_link {
            page.add_class(root, CANCEL_LINK_CLASS)?;
        }
        for class in self.inner.config.classes.iter().chain(&step.classes) {
            page.add_class(root, class)?;
        }
        *self.inner.current.borrow_mut() = Some(ActiveStep {
            index,
            element: Some(root),
        });

        debug!(step = index, id = %step.id, "showing step");
        let shown = step.hooks.run_show(&StepContext {
            index,
            element: root,
        });
        if let Err(err) = shown {
            // A step that failed to show is not displayed
            if let Err(close_err) = self.close_current() {
                debug!(step = index, "closing failed step: {}", close_err);
            }
            return Err(err);
        }
        self.emit(TourEvent::Show);
        Ok(())
    }

    /// Close the current step if it is open. It stays current.
    fn close_current(&self) -> Result<()> {
        let closing = {
            let mut current = self.inner.current.borrow_mut();
            current
                .as_mut()
                .and_then(|active| active.element.take().map(|el| (active.index, el)))
        };
        let Some((index, element)) = closing else {
            return Ok(());
        };
        let result = match self.step(index) {
            Some(step) => step.hooks.run_hide(&StepContext { index, element }),
            None => Ok(()),
        };
        self.inner.page.remove_element(element);
        debug!(step = index, "step closed");
        result
    }

    fn current_index(&self) -> Option<usize> {
        self.inner.current.borrow().as_ref().map(|a| a.index)
    }

    fn finish(&self, event: TourEvent) -> Result<()> {
        let result = self.close_current();
        *self.inner.current.borrow_mut() = None;
        debug!(%event, "tour finished");
        self.emit(event);
        result
    }
}

impl TourEngine for StepTour {
    fn create(config: EngineConfig, page: Rc<Page>) -> Self {
        Self {
            inner: Rc::new(StepTourInner {
                config,
                page,
                steps: RefCell::new(Vec::new()),
                current: RefCell::new(None),
                handlers: RefCell::new(Vec::new()),
                next_handler: Cell::new(0),
            }),
        }
    }

    fn add_step(&self, step: StepConfig) {
        self.inner.steps.borrow_mut().push(Rc::new(step));
    }

    fn step_count(&self) -> usize {
        self.inner.steps.borrow().len()
    }

    fn start(&self) -> Result<()> {
        if self.step_count() == 0 {
            return Err(TourError::engine("tour has no steps"));
        }
        self.emit(TourEvent::Start);
        self.show(0)
    }

    fn hide(&self) -> Result<()> {
        let result = self.close_current();
        self.emit(TourEvent::Hide);
        result
    }

    fn cancel(&self) -> Result<()> {
        self.finish(TourEvent::Cancel)
    }

    fn back(&self) -> Result<()> {
        match self.current_index() {
            Some(index) if index > 0 => self.show(index - 1),
            Some(_) => Ok(()),
            None => Err(TourError::engine("tour is not running")),
        }
    }

    fn next(&self) -> Result<()> {
        match self.current_index() {
            Some(index) if index + 1 < self.step_count() => self.show(index + 1),
            Some(_) => self.complete(),
            None => Err(TourError::engine("tour is not running")),
        }
    }

    fn complete(&self) -> Result<()> {
        self.finish(TourEvent::Complete)
    }

    fn current_step(&self) -> Option<StepStatus> {
        let current = self.inner.current.borrow();
        let active = current.as_ref()?;
        let id = self.step(active.index)?.id.clone();
        Some(StepStatus {
            index: active.index,
            id,
            open: active.element.is_some(),
            element: active.element,
        })
    }

    fn on(&self, event: TourEvent, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.inner.next_handler.get() + 1);
        self.inner.next_handler.set(id.0);
        self.inner.handlers.borrow_mut().push((id, event, handler));
        id
    }

    fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _, _)| *h != id);
        handlers.len() != before
    }
}

impl std::fmt::Debug for StepTour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepTour")
            .field("steps", &self.step_count())
            .field("current", &self.current_step())
            .finish()
    }
}

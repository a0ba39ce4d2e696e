//! Step construction
//!
//! Turns an author-supplied [`StepSpec`] into the engine-ready [`StepConfig`]:
//! navigation buttons chosen by [`StepPosition`], class markers, highlight
//! hooks and the click suppressor that keeps clicks inside an open step away
//! from the page-level dismissal handler.
//!
//! | Position  | Left button     | Right button        |
//! |-----------|-----------------|---------------------|
//! | First     | Exit → cancel   | Next → next         |
//! | InBetween | Back → back     | Next → next         |
//! | Last      | Back → back     | Done → complete     |
//! | Only      | Exit → cancel   | Done → complete     |

use crate::error::{Result, TourError};
use crate::highlight::{ElementHighlighter, HighlightStyle};
use crate::page::{ClickEvent, ClickHandler, ElementId, ListenerId, Page};
use crate::scheduler::Scheduler;
use crate::types::{ButtonStyle, EngineAction, Placement, StepPosition};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, trace};

/// Marker class carried by every tour step
pub const STEP_CLASS: &str = "guided-tour-step";
/// Marker class of the first step
pub const FIRST_STEP_CLASS: &str = "guided-tour-step-first";
/// Marker class of the last step
pub const LAST_STEP_CLASS: &str = "guided-tour-step-last";
/// Marker class of steps drawn without an arrow
pub const NO_ARROW_CLASS: &str = "guided-tour-no-arrow";

/// Element a step points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachTo {
    /// Selector of the target element (`#id`, `.class` or bare id)
    pub element: String,
    /// Side of the target the bubble sits on
    #[serde(default)]
    pub on: Placement,
}

impl AttachTo {
    pub fn new(element: impl Into<String>, on: Placement) -> Self {
        Self {
            element: element.into(),
            on,
        }
    }
}

/// Label overrides for the navigation buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavLabels {
    pub exit: Option<String>,
    pub back: Option<String>,
    pub next: Option<String>,
    pub done: Option<String>,
}

/// A step as written by a tour author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepSpec {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: String,
    pub attach_to: Option<AttachTo>,
    pub highlight_element: bool,
    pub no_arrow: bool,
    pub classes: Vec<String>,
    pub buttons: NavLabels,
}

impl StepSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn attach_to(mut self, element: impl Into<String>, on: Placement) -> Self {
        self.attach_to = Some(AttachTo::new(element, on));
        self
    }

    #[must_use]
    pub fn highlight(mut self) -> Self {
        self.highlight_element = true;
        self
    }

    #[must_use]
    pub fn no_arrow(mut self) -> Self {
        self.no_arrow = true;
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }
}

/// A navigation button: label, look, and the engine action it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub style: ButtonStyle,
    pub action: EngineAction,
}

impl Button {
    pub fn new(label: impl Into<String>, style: ButtonStyle, action: EngineAction) -> Self {
        Self {
            label: label.into(),
            style,
            action,
        }
    }
}

/// What a step hook is told about the step that opened or closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    pub index: usize,
    /// The step's root element on the page
    pub element: ElementId,
}

/// Callback run when a step opens or closes
pub type StepHook = Rc<dyn Fn(&StepContext) -> Result<()>>;

/// Open/close hooks of one step
#[derive(Clone, Default)]
pub struct StepHooks {
    show: Vec<StepHook>,
    hide: Vec<StepHook>,
}

impl StepHooks {
    pub fn on_show(&mut self, hook: StepHook) {
        self.show.push(hook);
    }

    pub fn on_hide(&mut self, hook: StepHook) {
        self.hide.push(hook);
    }

    pub fn show_count(&self) -> usize {
        self.show.len()
    }

    pub fn hide_count(&self) -> usize {
        self.hide.len()
    }

    /// Run show hooks in order, stopping at the first failure
    pub fn run_show(&self, ctx: &StepContext) -> Result<()> {
        for hook in &self.show {
            hook(ctx)?;
        }
        Ok(())
    }

    /// Run every hide hook, then report the first failure
    pub fn run_hide(&self, ctx: &StepContext) -> Result<()> {
        let mut first_err = None;
        for hook in &self.hide {
            if let Err(err) = hook(ctx) {
                error!(step = ctx.index, "hide hook failed: {}", err);
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for StepHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepHooks")
            .field("show", &self.show.len())
            .field("hide", &self.hide.len())
            .finish()
    }
}

/// A step ready to hand to a [`crate::engine::TourEngine`]
#[derive(Debug, Clone)]
pub struct StepConfig {
    pub id: String,
    pub title: Option<String>,
    pub text: String,
    pub attach_to: Option<AttachTo>,
    pub position: StepPosition,
    pub classes: Vec<String>,
    pub buttons: Vec<Button>,
    pub hooks: StepHooks,
}

impl StepConfig {
    /// Bare configuration with no buttons or hooks
    pub fn new(id: impl Into<String>, text: impl Into<String>, position: StepPosition) -> Self {
        Self {
            id: id.into(),
            title: None,
            text: text.into(),
            attach_to: None,
            position,
            classes: Vec::new(),
            buttons: Vec::new(),
            hooks: StepHooks::default(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// False when the step is drawn without an arrow
    pub fn has_arrow(&self) -> bool {
        !self.has_class(NO_ARROW_CLASS)
    }
}

/// Everything step construction needs from its surroundings
pub struct StepWiring<'a> {
    pub page: &'a Rc<Page>,
    pub scheduler: &'a Scheduler,
    pub highlight: &'a HighlightStyle,
}

impl StepWiring<'_> {
    /// Build step `index` of `count` from its spec
    pub fn build(&self, spec: StepSpec, index: usize, count: usize) -> Result<StepConfig> {
        let position = StepPosition::classify(index, count);
        let labels = &spec.buttons;

        let left = if position.is_first() {
            Button::new(
                labels.exit.as_deref().unwrap_or("Exit"),
                ButtonStyle::Secondary,
                EngineAction::Cancel,
            )
        } else {
            Button::new(
                labels.back.as_deref().unwrap_or("Back"),
                ButtonStyle::Secondary,
                EngineAction::Back,
            )
        };
        let right = if position.is_last() {
            Button::new(
                labels.done.as_deref().unwrap_or("Done"),
                ButtonStyle::Primary,
                EngineAction::Complete,
            )
        } else {
            Button::new(
                labels.next.as_deref().unwrap_or("Next"),
                ButtonStyle::Primary,
                EngineAction::Next,
            )
        };

        let mut classes = vec![STEP_CLASS.to_string()];
        if position.is_first() {
            classes.push(FIRST_STEP_CLASS.to_string());
        }
        if position.is_last() {
            classes.push(LAST_STEP_CLASS.to_string());
        }
        if spec.no_arrow {
            classes.push(NO_ARROW_CLASS.to_string());
        }
        classes.extend(spec.classes.iter().cloned());

        let mut hooks = StepHooks::default();
        if spec.highlight_element {
            let target = spec
                .attach_to
                .as_ref()
                .ok_or(TourError::MissingTarget { index })?;
            let highlighter = Rc::new(ElementHighlighter::new(
                self.page.clone(),
                target.element.clone(),
                self.highlight.clone(),
            ));
            let on_show = highlighter.clone();
            hooks.on_show(Rc::new(move |_ctx: &StepContext| on_show.apply()));
            hooks.on_hide(Rc::new(move |_ctx: &StepContext| highlighter.clear()));
        }

        let suppressor = ClickSuppressor::new(self.page.clone(), self.scheduler.clone());
        let on_show = suppressor.clone();
        hooks.on_show(Rc::new(move |ctx: &StepContext| {
            on_show.schedule_install(ctx.element);
            Ok(())
        }));
        hooks.on_hide(Rc::new(move |_ctx: &StepContext| {
            suppressor.schedule_remove();
            Ok(())
        }));

        Ok(StepConfig {
            id: spec.id.unwrap_or_else(|| format!("step-{index}")),
            title: spec.title,
            text: spec.text,
            attach_to: spec.attach_to,
            position,
            classes,
            buttons: vec![left, right],
            hooks,
        })
    }
}

/// Stops clicks inside an open step from bubbling to the page.
///
/// Install and removal are deferred to the next tick so the click that
/// opened or closed the step is not swallowed by the step it produced.
#[derive(Clone)]
struct ClickSuppressor {
    page: Rc<Page>,
    scheduler: Scheduler,
    installed: Rc<RefCell<Option<(ElementId, ListenerId)>>>,
}

impl ClickSuppressor {
    fn new(page: Rc<Page>, scheduler: Scheduler) -> Self {
        Self {
            page,
            scheduler,
            installed: Rc::default(),
        }
    }

    fn schedule_install(&self, el: ElementId) {
        let page = self.page.clone();
        let installed = self.installed.clone();
        self.scheduler.defer(move || {
            let stop: ClickHandler = Rc::new(|event: &mut ClickEvent| event.stop_propagation());
            let Some(listener) = page.on_click(el, stop) else {
                trace!(element = el.index(), "step closed before suppressor install");
                return;
            };
            if let Some((old_el, old)) = installed.borrow_mut().replace((el, listener)) {
                page.off_click(old_el, old);
            }
        });
    }

    fn schedule_remove(&self) {
        let page = self.page.clone();
        let installed = self.installed.clone();
        self.scheduler.defer(move || {
            if let Some((el, listener)) = installed.borrow_mut().take() {
                page.off_click(el, listener);
            }
        });
    }
}

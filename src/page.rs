//! Page model: element tree, inline styles and click bubbling
//!
//! This is the styling/event surface tours run against. Elements form a tree
//! rooted at `body`; each carries an optional id, a class list and an inline
//! style map. Clicks bubble from the target up to `body`, where page-level
//! handlers registered through [`Page::bind_body`] receive them unless an
//! element listener stopped propagation on the way.
//!
//! The page is single-threaded and shared as `Rc<Page>`. No internal borrow
//! is held while a handler runs, so handlers may freely call back into the
//! page.

use crate::error::{Result, TourError};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Handle to an element on a [`Page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: usize,
    generation: u32,
}

impl ElementId {
    /// Slot index. Slots of removed elements are reused, so only the full
    /// id identifies one element.
    pub fn index(self) -> usize {
        self.index
    }
}

/// Identifies a registered click handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A click travelling from its target towards `body`
#[derive(Debug)]
pub struct ClickEvent {
    target: ElementId,
    current: ElementId,
    stopped: bool,
}

impl ClickEvent {
    /// Element the click landed on
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Element whose listener is currently running
    pub fn current_target(&self) -> ElementId {
        self.current
    }

    /// Prevent the click from reaching ancestors and the body bus
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// Click handler shared between the page and its owner
pub type ClickHandler = Rc<dyn Fn(&mut ClickEvent)>;

/// Owned handle to a page-level click binding.
///
/// Released explicitly with [`Page::release`]; [`Page::unbind_body`] drops
/// every binding in a namespace regardless of who holds the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct BodySubscription {
    namespace: String,
    id: ListenerId,
}

impl BodySubscription {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

struct Element {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    dom_id: Option<String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    listeners: Vec<(ListenerId, ClickHandler)>,
}

impl Element {
    fn new(parent: Option<ElementId>, dom_id: Option<&str>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            dom_id: dom_id.map(str::to_string),
            classes: Vec::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }
}

struct BodyBinding {
    namespace: String,
    id: ListenerId,
    handler: ClickHandler,
}

struct Slot {
    generation: u32,
    element: Option<Element>,
}

struct PageState {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body_bindings: Vec<BodyBinding>,
    next_listener: u64,
}

impl PageState {
    fn element(&self, el: ElementId) -> Option<&Element> {
        self.slots
            .get(el.index)
            .filter(|slot| slot.generation == el.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn element_mut(&mut self, el: ElementId) -> Option<&mut Element> {
        self.slots
            .get_mut(el.index)
            .filter(|slot| slot.generation == el.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    /// Store `element`, reusing a freed slot under a new generation
    fn allocate(&mut self, element: Element) -> ElementId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.generation = slot.generation.wrapping_add(1);
                slot.element = Some(element);
                return ElementId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        ElementId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn release(&mut self, el: ElementId) -> Option<Element> {
        let removed = self
            .slots
            .get_mut(el.index)
            .filter(|slot| slot.generation == el.generation)
            .and_then(|slot| slot.element.take())?;
        self.free.push(el.index);
        Some(removed)
    }

    fn listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }
}

/// Element tree with a page-level click bus
pub struct Page {
    state: RefCell<PageState>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Create a page containing only `body`
    pub fn new() -> Self {
        Self {
            state: RefCell::new(PageState {
                slots: vec![Slot {
                    generation: 0,
                    element: Some(Element::new(None, None)),
                }],
                free: Vec::new(),
                body_bindings: Vec::new(),
                next_listener: 0,
            }),
        }
    }

    /// The root element
    pub fn body(&self) -> ElementId {
        ElementId {
            index: 0,
            generation: 0,
        }
    }

    /// Append a new element under `parent`
    pub fn create_element(&self, parent: ElementId, dom_id: Option<&str>) -> Result<ElementId> {
        let mut state = self.state.borrow_mut();
        if state.element(parent).is_none() {
            return Err(TourError::page(format!(
                "parent element {} does not exist",
                parent.index
            )));
        }
        let id = state.allocate(Element::new(Some(parent), dom_id));
        if let Some(parent) = state.element_mut(parent) {
            parent.children.push(id);
        }
        Ok(id)
    }

    /// Remove an element and its subtree. `body` cannot be removed.
    ///
    /// Returns false if the element was already gone.
    pub fn remove_element(&self, el: ElementId) -> bool {
        if el == self.body() {
            return false;
        }
        let mut state = self.state.borrow_mut();
        let Some(parent) = state.element(el).map(|e| e.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| state.element_mut(p)) {
            parent.children.retain(|child| *child != el);
        }
        let mut pending = vec![el];
        while let Some(next) = pending.pop() {
            if let Some(removed) = state.release(next) {
                pending.extend(removed.children);
            }
        }
        true
    }

    pub fn exists(&self, el: ElementId) -> bool {
        self.state.borrow().element(el).is_some()
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.state.borrow().element(el).and_then(|e| e.parent)
    }

    pub fn dom_id(&self, el: ElementId) -> Option<String> {
        self.state.borrow().element(el).and_then(|e| e.dom_id.clone())
    }

    /// Add a class (no-op if already present)
    pub fn add_class(&self, el: ElementId, class: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let element = state
            .element_mut(el)
            .ok_or_else(|| TourError::page(format!("element {} does not exist", el.index)))?;
        if !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.state
            .borrow()
            .element(el)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn classes(&self, el: ElementId) -> Vec<String> {
        self.state
            .borrow()
            .element(el)
            .map(|e| e.classes.clone())
            .unwrap_or_default()
    }

    /// Resolve a selector: `body`, `#id`, `.class`, or a bare id.
    ///
    /// Returns the first match in document order.
    pub fn query(&self, selector: &str) -> Option<ElementId> {
        let selector = selector.trim();
        if selector == "body" {
            return Some(self.body());
        }
        let matches = |e: &Element| match selector.strip_prefix('.') {
            Some(class) => e.classes.iter().any(|c| c == class),
            None => e.dom_id.as_deref() == Some(selector.strip_prefix('#').unwrap_or(selector)),
        };

        let state = self.state.borrow();
        let mut pending = vec![self.body()];
        while let Some(id) = pending.pop() {
            let Some(element) = state.element(id) else {
                continue;
            };
            if matches(element) {
                return Some(id);
            }
            pending.extend(element.children.iter().rev());
        }
        None
    }

    /// Nearest element (starting at `el` itself) carrying `class`
    pub fn closest(&self, el: ElementId, class: &str) -> Option<ElementId> {
        let state = self.state.borrow();
        let mut cursor = Some(el);
        while let Some(current) = cursor {
            let element = state.element(current)?;
            if element.classes.iter().any(|c| c == class) {
                return Some(current);
            }
            cursor = element.parent;
        }
        None
    }

    /// Inline style value, if set
    pub fn css(&self, el: ElementId, property: &str) -> Option<String> {
        self.state
            .borrow()
            .element(el)
            .and_then(|e| e.style.get(property).cloned())
    }

    /// Set an inline style property. An empty value removes the property.
    pub fn set_css(&self, el: ElementId, property: &str, value: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let element = state
            .element_mut(el)
            .ok_or_else(|| TourError::page(format!("element {} does not exist", el.index)))?;
        if value.is_empty() {
            element.style.remove(property);
        } else {
            element.style.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Snapshot of the element's inline style
    pub fn style(&self, el: ElementId) -> BTreeMap<String, String> {
        self.state
            .borrow()
            .element(el)
            .map(|e| e.style.clone())
            .unwrap_or_default()
    }

    /// Register a click listener on an element.
    ///
    /// Returns `None` if the element no longer exists.
    pub fn on_click(&self, el: ElementId, handler: ClickHandler) -> Option<ListenerId> {
        let mut state = self.state.borrow_mut();
        let id = state.listener_id();
        let element = state.element_mut(el)?;
        element.listeners.push((id, handler));
        Some(id)
    }

    /// Remove a click listener. Missing elements or listeners are ignored.
    pub fn off_click(&self, el: ElementId, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(element) = state.element_mut(el) else {
            return false;
        };
        let before = element.listeners.len();
        element.listeners.retain(|(listener, _)| *listener != id);
        element.listeners.len() != before
    }

    /// Bind a page-level click handler under `namespace`
    pub fn bind_body(&self, namespace: &str, handler: ClickHandler) -> BodySubscription {
        let mut state = self.state.borrow_mut();
        let id = state.listener_id();
        state.body_bindings.push(BodyBinding {
            namespace: namespace.to_string(),
            id,
            handler,
        });
        BodySubscription {
            namespace: namespace.to_string(),
            id,
        }
    }

    /// Drop one page-level binding. Returns false if it was already gone.
    pub fn release(&self, subscription: BodySubscription) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.body_bindings.len();
        state.body_bindings.retain(|b| b.id != subscription.id);
        state.body_bindings.len() != before
    }

    /// Drop every page-level binding in `namespace`, returning how many went
    pub fn unbind_body(&self, namespace: &str) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.body_bindings.len();
        state.body_bindings.retain(|b| b.namespace != namespace);
        before - state.body_bindings.len()
    }

    /// Number of page-level bindings in `namespace`
    pub fn body_binding_count(&self, namespace: &str) -> usize {
        self.state
            .borrow()
            .body_bindings
            .iter()
            .filter(|b| b.namespace == namespace)
            .count()
    }

    /// Dispatch a click on `target`.
    ///
    /// Element listeners run from the target upwards; the page-level
    /// handlers bound when dispatch began run last. Returns true if the
    /// click reached the body bus.
    pub fn click(&self, target: ElementId) -> bool {
        let (path, body_handlers) = {
            let state = self.state.borrow();
            if state.element(target).is_none() {
                return false;
            }
            let mut path = Vec::new();
            let mut cursor = Some(target);
            while let Some(current) = cursor {
                path.push(current);
                cursor = state.element(current).and_then(|e| e.parent);
            }
            let body_handlers: Vec<ClickHandler> = state
                .body_bindings
                .iter()
                .map(|b| b.handler.clone())
                .collect();
            (path, body_handlers)
        };

        let mut event = ClickEvent {
            target,
            current: target,
            stopped: false,
        };
        for el in path {
            let handlers: Vec<ClickHandler> = self
                .state
                .borrow()
                .element(el)
                .map(|e| e.listeners.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default();
            event.current = el;
            for handler in handlers {
                handler(&mut event);
            }
            if event.stopped {
                return false;
            }
        }

        event.current = self.body();
        for handler in body_handlers {
            handler(&mut event);
            if event.stopped {
                break;
            }
        }
        true
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Page")
            .field(
                "elements",
                &state.slots.iter().filter(|s| s.element.is_some()).count(),
            )
            .field("slots", &state.slots.len())
            .field("body_bindings", &state.body_bindings.len())
            .finish()
    }
}

//! Terminal demo application
//!
//! Renders a small screen whose regions are page elements, runs a guided
//! tour over it, and routes keys and mouse clicks into the tour and the page.

pub mod demo;

use crate::config_file::TourDefinition;
use crate::engine::TourEngine;
use crate::overlay::TourOverlay;
use crate::page::ElementId;
use crate::step::StepConfig;
use crate::theme::{self, Styles};
use crate::tour::{GuidedTour, TourEnv};
use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

const KEY_HINTS: &str = "←/→ select · Enter press · Esc cancel · h hide · s start · f force · r reset · q quit";

/// Demo application state
pub struct App {
    env: TourEnv,
    tour: GuidedTour,
    regions: Vec<(ElementId, &'static str)>,
    layout: HashMap<ElementId, Rect>,
    screen: Rect,
    selected: usize,
    status: Rc<RefCell<String>>,
}

impl App {
    /// Lay out the demo page and build the tour over it
    pub fn new(env: TourEnv, definition: &TourDefinition) -> Result<Self> {
        let mut regions = Vec::new();
        for (id, title) in demo::REGIONS {
            let el = env
                .page
                .create_element(env.page.body(), Some(id))
                .with_context(|| format!("Failed to create region {id}"))?;
            regions.push((el, title));
        }
        let tour = definition.build(&env)?;

        Ok(Self {
            env,
            tour,
            regions,
            layout: HashMap::new(),
            screen: Rect::default(),
            selected: 1,
            status: Rc::new(RefCell::new("Press s to start the tour".to_string())),
        })
    }

    pub fn tour(&self) -> &GuidedTour {
        &self.tour
    }

    pub fn env(&self) -> &TourEnv {
        &self.env
    }

    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    /// Currently selected button of the open step
    pub fn selected(&self) -> usize {
        self.selected
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = message.into();
    }

    /// Start the tour; unless forced, only when it has not been seen
    pub fn start(&mut self, force: bool) {
        self.selected = 1;
        if !force {
            self.set_status("Tour already seen - press f to force it");
        }
        let status = self.status.clone();
        self.tour.start(force, move || {
            *status.borrow_mut() = "Tour started".to_string();
        });
    }

    /// Run deferred work queued by the tour
    pub fn tick(&self) -> usize {
        self.env.scheduler.run_pending()
    }

    fn open_step(&self) -> Option<(Rc<StepConfig>, usize, Option<ElementId>)> {
        if !self.tour.is_open() {
            return None;
        }
        let engine = self.tour.engine();
        let status = engine.current_step()?;
        Some((engine.current_config()?, status.index, status.element))
    }

    fn overlay<'a>(&self, step: &'a StepConfig, index: usize) -> TourOverlay<'a> {
        let engine = self.tour.engine();
        let mut overlay = TourOverlay::new(step, index, engine.step_count())
            .selected(self.selected)
            .cancel_link(engine.config().show_cancel_link);
        let anchor = step
            .attach_to
            .as_ref()
            .and_then(|attach| self.env.page.query(&attach.element))
            .and_then(|el| self.layout.get(&el).copied());
        if let Some(anchor) = anchor {
            overlay = overlay.anchor(anchor);
        }
        overlay
    }

    fn press_selected(&mut self) {
        let selected = self.selected;
        self.press(selected);
    }

    fn press(&mut self, button: usize) {
        match self.tour.engine().press(button) {
            Ok(()) => {
                self.selected = 1;
                if !self.tour.is_open() {
                    self.set_status(format!("Tour {}", self.tour.state()));
                }
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    /// Handle a key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        debug!(code = ?key.code, "key");
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Left | KeyCode::BackTab => self.selected = self.selected.saturating_sub(1),
            KeyCode::Right | KeyCode::Tab => self.selected = (self.selected + 1).min(1),
            KeyCode::Enter => self.press_selected(),
            KeyCode::Esc => match self.tour.engine().cancel_link() {
                Ok(()) => self.set_status("Tour cancelled"),
                Err(err) => self.set_status(err.to_string()),
            },
            KeyCode::Char('h') => match self.tour.hide() {
                Ok(()) => self.set_status("Tour hidden"),
                Err(err) => self.set_status(err.to_string()),
            },
            KeyCode::Char('s') => self.start(false),
            KeyCode::Char('f') => self.start(true),
            KeyCode::Char('r') => {
                self.tour.forget_seen();
                self.set_status("Seen-state cleared");
            }
            _ => {}
        }
        false
    }

    /// Handle a left click at a screen position
    pub fn handle_click(&mut self, column: u16, row: u16) {
        let position = Position::new(column, row);
        if let Some((step, index, root)) = self.open_step() {
            let overlay = self.overlay(&step, index);
            if overlay.bubble_area(self.screen).contains(position) {
                if let Some(root) = root {
                    self.env.page.click(root);
                }
                if let Some(button) = overlay.button_at(self.screen, column, row) {
                    self.press(button);
                } else if overlay
                    .cancel_link_area(self.screen)
                    .is_some_and(|area| area.contains(position))
                {
                    if let Err(err) = self.tour.engine().cancel_link() {
                        self.set_status(err.to_string());
                    }
                }
                return;
            }
        }

        let target = self
            .regions
            .iter()
            .find(|(el, _)| self.layout.get(el).is_some_and(|r| r.contains(position)))
            .map(|(el, _)| *el)
            .unwrap_or_else(|| self.env.page.body());
        self.env.page.click(target);
        if !self.tour.is_open() && self.tour.state().is_finished() {
            self.set_status(format!("Tour {}", self.tour.state()));
        }
    }

    /// Compute region rectangles for a frame of the given size
    pub fn layout_regions(&mut self, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(rows[1]);
        let rects = [rows[0], columns[0], columns[1], rows[2]];

        self.screen = area;
        self.layout = self
            .regions
            .iter()
            .zip(rects)
            .map(|((el, _), rect)| (*el, rect))
            .collect();
    }

    /// Render the screen and, if open, the current step
    pub fn draw(&mut self, f: &mut Frame) {
        self.layout_regions(f.area());

        for (index, (el, title)) in self.regions.iter().enumerate() {
            let Some(rect) = self.layout.get(el).copied() else {
                continue;
            };
            let style = theme::inline_style(&self.env.page.style(*el));
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border())
                .title(Span::styled(format!(" {title} "), Styles::title()))
                .style(style);
            let body: Vec<Line> = match index {
                1 => demo::MENU_ITEMS.iter().map(|item| Line::from(format!(" {item}"))).collect(),
                2 => vec![Line::from(" Pick something from the menu.")],
                3 => vec![Line::from(Span::styled(format!(" {}", self.status()), Styles::text_muted()))],
                _ => vec![Line::from(Span::styled(format!(" {KEY_HINTS}"), Styles::text_muted()))],
            };
            f.render_widget(Paragraph::new(body).block(block), rect);
        }

        if let Some((step, index, _)) = self.open_step() {
            let overlay = self.overlay(&step, index);
            f.render_widget(overlay, f.area());
        }
    }

    /// Main loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting demo loop");
        loop {
            self.tick();
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                        self.handle_click(mouse.column, mouse.row);
                    }
                    _ => {}
                }
            }
        }
        info!("Demo loop finished");
        Ok(())
    }
}

//! Step bubble widget
//!
//! Draws the open step of a tour as a bordered bubble next to its target:
//! title, step counter, optional cancel link, wrapped body text, an arrow
//! pointing at the target (unless the step opts out) and the two navigation
//! buttons. Geometry helpers let a host map mouse positions back to buttons.

use crate::step::{Button, StepConfig};
use crate::theme::Styles;
use crate::types::{ButtonStyle, Placement};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

const MAX_WIDTH: u16 = 48;
const MIN_WIDTH: u16 = 24;
const CANCEL_LINK: &str = " × ";

/// Renderable view of one open step
#[derive(Debug, Clone)]
pub struct TourOverlay<'a> {
    step: &'a StepConfig,
    index: usize,
    total: usize,
    selected: usize,
    cancel_link: bool,
    anchor: Option<Rect>,
}

impl<'a> TourOverlay<'a> {
    pub fn new(step: &'a StepConfig, index: usize, total: usize) -> Self {
        Self {
            step,
            index,
            total,
            selected: step.buttons.len().saturating_sub(1),
            cancel_link: false,
            anchor: None,
        }
    }

    /// Index of the button drawn as selected
    #[must_use]
    pub fn selected(mut self, button: usize) -> Self {
        self.selected = button;
        self
    }

    #[must_use]
    pub fn cancel_link(mut self, shown: bool) -> Self {
        self.cancel_link = shown;
        self
    }

    /// Screen area of the step's target element
    #[must_use]
    pub fn anchor(mut self, target: Rect) -> Self {
        self.anchor = Some(target);
        self
    }

    fn placement(&self) -> Placement {
        match (&self.anchor, &self.step.attach_to) {
            (Some(_), Some(attach)) => attach.on,
            _ => Placement::Center,
        }
    }

    /// Where the bubble lands inside `area`
    pub fn bubble_area(&self, area: Rect) -> Rect {
        let width = MAX_WIDTH.min(area.width).max(MIN_WIDTH.min(area.width));
        let text_lines = wrap_text(&self.step.text, width.saturating_sub(4) as usize).len() as u16;
        let height = (text_lines + 4).min(area.height);

        let centered = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );
        let Some(target) = self.anchor else {
            return centered;
        };

        let (x, y) = match self.placement() {
            Placement::Bottom => (target.x as i32, target.bottom() as i32 + 1),
            Placement::Top => (target.x as i32, target.y as i32 - height as i32 - 1),
            Placement::Right => (target.right() as i32 + 2, target.y as i32),
            Placement::Left => (target.x as i32 - width as i32 - 2, target.y as i32),
            Placement::Center => return centered,
        };
        let max_x = (area.right() - width) as i32;
        let max_y = (area.bottom() - height) as i32;
        Rect::new(
            x.clamp(area.x as i32, max_x) as u16,
            y.clamp(area.y as i32, max_y) as u16,
            width,
            height,
        )
    }

    /// Screen areas of the navigation buttons, in button order
    pub fn button_areas(&self, area: Rect) -> Vec<Rect> {
        let bubble = self.bubble_area(area);
        let row = bubble.bottom().saturating_sub(2);
        let mut right = bubble.right().saturating_sub(2);
        let mut areas: Vec<Rect> = self
            .step
            .buttons
            .iter()
            .rev()
            .map(|button| {
                let width = button_label(button).chars().count() as u16;
                right = right.saturating_sub(width);
                let rect = Rect::new(right, row, width, 1);
                right = right.saturating_sub(1);
                rect
            })
            .collect();
        areas.reverse();
        areas
    }

    /// Button under a screen position, if any
    pub fn button_at(&self, area: Rect, column: u16, row: u16) -> Option<usize> {
        self.button_areas(area)
            .iter()
            .position(|rect| rect.contains((column, row).into()))
    }

    /// Screen area of the cancel link, when shown
    pub fn cancel_link_area(&self, area: Rect) -> Option<Rect> {
        if !self.cancel_link {
            return None;
        }
        let bubble = self.bubble_area(area);
        let width = CANCEL_LINK.chars().count() as u16;
        Some(Rect::new(bubble.right().saturating_sub(width + 1), bubble.y, width, 1))
    }

    fn arrow(&self, bubble: Rect) -> Option<(u16, u16, &'static str)> {
        let target = self.anchor?;
        if !self.step.has_arrow() {
            return None;
        }
        match self.placement() {
            Placement::Bottom if bubble.y > target.y => Some((bubble.x + 2, bubble.y - 1, "▲")),
            Placement::Top if bubble.bottom() <= target.y => {
                Some((bubble.x + 2, bubble.bottom(), "▼"))
            }
            Placement::Right if bubble.x > target.right() => {
                Some((bubble.x - 1, bubble.y + 1, "◀"))
            }
            Placement::Left if bubble.right() < target.x => {
                Some((bubble.right(), bubble.y + 1, "▶"))
            }
            _ => None,
        }
    }
}

impl Widget for TourOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bubble = self.bubble_area(area);
        Clear.render(bubble, buf);

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::border())
            .style(Styles::bubble())
            .title(Line::from(Span::styled(
                format!(" {} ", self.step.title.as_deref().unwrap_or("Tour")),
                Styles::title(),
            )))
            .title_bottom(
                Line::from(Span::styled(
                    format!(" {}/{} ", self.index + 1, self.total),
                    Styles::counter(),
                ))
                .left_aligned(),
            );
        if self.cancel_link {
            block = block.title(Line::from(Span::styled(CANCEL_LINK, Styles::cancel_link())).right_aligned());
        }
        let inner = block.inner(bubble);
        block.render(bubble, buf);

        let width = inner.width.saturating_sub(2) as usize;
        let body: Vec<Line> = wrap_text(&self.step.text, width)
            .into_iter()
            .map(|line| Line::from(Span::styled(format!(" {line}"), Styles::text())))
            .collect();
        Paragraph::new(body).render(inner, buf);

        for (i, (button, rect)) in self
            .step
            .buttons
            .iter()
            .zip(self.button_areas(area))
            .enumerate()
        {
            let style = if i == self.selected {
                Styles::button_active()
            } else if button.style == ButtonStyle::Secondary {
                Styles::button_secondary()
            } else {
                Styles::button_primary()
            };
            buf.set_string(rect.x, rect.y, button_label(button), style);
        }

        if let Some((x, y, glyph)) = self.arrow(bubble) {
            if area.contains((x, y).into()) {
                buf.set_string(x, y, glyph, Styles::border());
            }
        }
    }
}

fn button_label(button: &Button) -> String {
    format!("[ {} ]", button.label)
}

/// Greedy word wrap; words longer than `width` are split
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line.is_empty() {
                word.len()
            } else {
                line.chars().count() + 1 + word.len()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::AttachTo;
    use crate::types::{EngineAction, StepPosition};

    fn step() -> StepConfig {
        let mut step = StepConfig::new("s0", "Pick a screen from the menu.", StepPosition::First);
        step.title = Some("Menu".to_string());
        step.buttons = vec![
            Button::new("Exit", ButtonStyle::Secondary, EngineAction::Cancel),
            Button::new("Next", ButtonStyle::Primary, EngineAction::Next),
        ];
        step
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn test_bubble_is_centered_without_anchor() {
        let step = step();
        let area = Rect::new(0, 0, 100, 40);
        let bubble = TourOverlay::new(&step, 0, 2).bubble_area(area);
        assert_eq!(bubble.width, MAX_WIDTH);
        assert_eq!(bubble.x, (100 - MAX_WIDTH) / 2);
    }

    #[test]
    fn test_bubble_sits_below_anchor() {
        let mut step = step();
        step.attach_to = Some(AttachTo::new("#menu", Placement::Bottom));
        let area = Rect::new(0, 0, 100, 40);
        let bubble = TourOverlay::new(&step, 0, 2)
            .anchor(Rect::new(5, 3, 20, 2))
            .bubble_area(area);
        assert_eq!(bubble.y, 6);
        assert_eq!(bubble.x, 5);
    }

    #[test]
    fn test_bubble_stays_inside_area() {
        let mut step = step();
        step.attach_to = Some(AttachTo::new("#menu", Placement::Top));
        let area = Rect::new(0, 0, 60, 20);
        let bubble = TourOverlay::new(&step, 0, 2)
            .anchor(Rect::new(50, 0, 5, 1))
            .bubble_area(area);
        assert!(area.contains((bubble.right() - 1, bubble.bottom() - 1).into()));
        assert_eq!(bubble.y, 0);
    }

    #[test]
    fn test_button_hit_testing() {
        let step = step();
        let area = Rect::new(0, 0, 100, 40);
        let overlay = TourOverlay::new(&step, 0, 2);
        let areas = overlay.button_areas(area);
        assert_eq!(areas.len(), 2);
        assert!(areas[0].right() < areas[1].x);
        assert_eq!(overlay.button_at(area, areas[1].x, areas[1].y), Some(1));
        assert_eq!(overlay.button_at(area, 0, 0), None);
    }

    #[test]
    fn test_render_draws_title_and_buttons() {
        let step = step();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        TourOverlay::new(&step, 0, 2)
            .cancel_link(true)
            .render(area, &mut buf);

        let content: String = buf.content().iter().map(|cell| cell.symbol()).collect();
        assert!(content.contains("Menu"));
        assert!(content.contains("[ Exit ]"));
        assert!(content.contains("[ Next ]"));
        assert!(content.contains("1/2"));
        assert!(content.contains("×"));
    }
}

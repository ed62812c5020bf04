use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

/// Single-line text buffer for an editable table cell, wrapping tui-textarea
pub struct CellInput {
    textarea: TextArea<'static>,
    value: String,
    focused: bool,
}

impl CellInput {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(Style::default());
        let mut input = Self {
            textarea,
            value: String::new(),
            focused: false,
        };
        input.set_focused(false);
        input
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the contents, leaving the cursor at the end
    pub fn set_value(&mut self, value: String) {
        self.value = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![self.value.clone()]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn cursor(&self) -> usize {
        self.textarea.cursor().1
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_style();
    }

    fn apply_style(&mut self) {
        let style = Style::default();
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        // Matching the text style hides the cursor
        if self.focused {
            self.textarea
                .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        } else {
            self.textarea.set_cursor_style(style);
        }
    }

    /// Apply an editing key to the buffer. Returns false when the key is not an
    /// editing key (newlines are never inserted).
    pub fn input(&mut self, event: &KeyEvent) -> bool {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let alt = event.modifiers.contains(KeyModifiers::ALT);
        let shift = event.modifiers.contains(KeyModifiers::SHIFT);

        let key = match event.code {
            // tui-textarea would insert a line break for these
            KeyCode::Char('m' | 'j') if ctrl => return false,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            _ => return false,
        };

        self.textarea.input(Input {
            key,
            ctrl,
            alt,
            shift,
        });
        self.value = self.textarea.lines().first().cloned().unwrap_or_default();
        true
    }
}

impl Default for CellInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &CellInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}

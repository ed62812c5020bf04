use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::editor::NumericFieldEditor;

/// Counters shown on the debug row with `--debug`
#[derive(Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub events: usize,
    pub frames: usize,
    pub keys: usize,
    /// Edits delivered to the tracker
    pub commits: usize,
    pub last_key: String,
    pub last_action: String,
}

impl DebugState {
    pub fn on_key(&mut self, event: &KeyEvent) {
        self.keys += 1;
        self.last_key = format!("{:?}", event.code);
    }

    pub fn action(&mut self, name: &str) {
        self.last_action = name.to_string();
    }
}

/// Debug row: counters plus the selected row's editor state
pub struct DebugBar<'a> {
    state: &'a DebugState,
    editor: Option<&'a NumericFieldEditor>,
}

impl<'a> DebugBar<'a> {
    pub fn new(state: &'a DebugState, editor: Option<&'a NumericFieldEditor>) -> Self {
        Self { state, editor }
    }

    fn editor_span(&self) -> Span<'static> {
        match self.editor {
            Some(e) => {
                let text = format!(
                    " row={} bound={} value={} border={:?}",
                    e.field_id(),
                    e.current_row_id(),
                    e.current_value(),
                    e.border()
                );
                if e.has_error() {
                    Span::styled(text, Style::default().fg(Color::Red))
                } else {
                    Span::raw(text)
                }
            }
            None => Span::raw(" row=-"),
        }
    }
}

impl Widget for DebugBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.state;
        let line = Line::from(vec![
            Span::raw(format!(
                "ev={} key={} ({}) act={} commits={} frames={}",
                s.events, s.keys, s.last_key, s.last_action, s.commits, s.frames
            )),
            self.editor_span(),
        ]);
        Paragraph::new(line)
            .style(Style::default().fg(Color::DarkGray))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_shows_selected_editor() {
        let mut state = DebugState::default();
        state.on_key(&KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE));
        let editor = NumericFieldEditor::new(12, "500");

        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        DebugBar::new(&state, Some(&editor)).render(area, &mut buf);
        let text: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(text.contains("key=1 (Char('7'))"));
        assert!(text.contains("row=12 bound=-1"));
    }
}

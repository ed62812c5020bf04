//! Inline editor for one numeric table cell.
//!
//! Validation is keystroke-granular and corrective: every key is evaluated
//! after it has been applied to the field, and bad input is rolled back to the
//! last known-good value. Only a commit key (Enter) makes an edit observable
//! outside the field. Losing focus never commits.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{format_number, EditedValue};
use crate::validation::{check_number, parse_number, InputChange};
use crate::widgets::cell_input::CellInput;

/// Row id reported by an editor that has never been focused
pub const UNBOUND_ROW_ID: i64 = -1;

/// A key as seen by the field: the produced character (`key`) and the
/// physical key name (`code`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: String,
    pub code: String,
}

impl KeyStroke {
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
        }
    }

    /// Stroke for a printable character
    pub fn char(c: char) -> Self {
        let code = match c {
            '0'..='9' => format!("Digit{}", c),
            'a'..='z' | 'A'..='Z' => format!("Key{}", c.to_ascii_uppercase()),
            '.' => "Period".to_string(),
            '-' => "Minus".to_string(),
            '+' => "Equal".to_string(),
            ' ' => "Space".to_string(),
            _ => c.to_string(),
        };
        Self::new(c.to_string(), code)
    }

    pub fn enter() -> Self {
        Self::new("Enter", "Enter")
    }

    pub fn from_key_event(event: &KeyEvent) -> Self {
        match event.code {
            KeyCode::Char(c) => Self::char(c),
            KeyCode::Enter => Self::enter(),
            KeyCode::Backspace => Self::new("Backspace", "Backspace"),
            KeyCode::Delete => Self::new("Delete", "Delete"),
            KeyCode::Left => Self::new("ArrowLeft", "ArrowLeft"),
            KeyCode::Right => Self::new("ArrowRight", "ArrowRight"),
            KeyCode::Home => Self::new("Home", "Home"),
            KeyCode::End => Self::new("End", "End"),
            other => {
                let name = format!("{:?}", other);
                Self::new(name.clone(), name)
            }
        }
    }

    /// Enter, under either of its names
    pub fn is_commit(&self) -> bool {
        self.code.eq_ignore_ascii_case("enter") || self.code.eq_ignore_ascii_case("return")
    }

    pub fn is_decimal_point(&self) -> bool {
        self.key == "."
    }
}

/// Visual state of an editor's cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderToken {
    #[default]
    Neutral,
    Edited,
}

/// Why the most recent keystroke was rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputRejection {
    #[error("only whole, non-negative numbers are allowed")]
    InvalidCharacter,
    #[error("not a number; value restored")]
    NonCommittableText,
}

type EditHandler = Box<dyn FnMut(EditedValue)>;

pub struct NumericFieldEditor {
    field_id: i64,
    input: CellInput,
    current_value: f64,
    current_row_id: i64,
    has_error: bool,
    last_rejection: Option<InputRejection>,
    border: BorderToken,
    handlers: Vec<EditHandler>,
}

impl NumericFieldEditor {
    /// Create an editor for the field identified by `field_id`, showing `text`
    pub fn new(field_id: i64, text: impl Into<String>) -> Self {
        Self {
            field_id,
            input: CellInput::new().with_value(text),
            current_value: 0.0,
            current_row_id: UNBOUND_ROW_ID,
            has_error: false,
            last_rejection: None,
            border: BorderToken::Neutral,
            handlers: Vec::new(),
        }
    }

    /// Register a handler invoked once per successful commit, in order
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: FnMut(EditedValue) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn field_id(&self) -> i64 {
        self.field_id
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.input.set_value(text.into());
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn current_row_id(&self) -> i64 {
        self.current_row_id
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn last_rejection(&self) -> Option<InputRejection> {
        self.last_rejection
    }

    pub fn border(&self) -> BorderToken {
        self.border
    }

    pub fn reset_border(&mut self) {
        self.border = BorderToken::Neutral;
    }

    pub fn is_focused(&self) -> bool {
        self.input.is_focused()
    }

    pub fn input(&self) -> &CellInput {
        &self.input
    }

    /// Field gained focus: capture the current text as the known-good value.
    /// Text that is not a number leaves the previous state in place.
    pub fn on_focus(&mut self) {
        self.input.set_focused(true);
        if let Some(value) = parse_number(self.input.value()) {
            self.current_value = value;
            self.current_row_id = self.field_id;
            debug!(row_id = self.current_row_id, value, "editor focused");
        }
    }

    /// Field lost focus. Pending text is kept but never committed.
    pub fn on_blur(&mut self) {
        self.input.set_focused(false);
    }

    /// Apply a terminal key event to the field text, then validate it.
    /// Key release events are ignored.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.kind == KeyEventKind::Release {
            return false;
        }
        let stroke = KeyStroke::from_key_event(event);
        if !stroke.is_commit() {
            self.input.input(event);
        }
        self.on_key_up(&stroke)
    }

    /// Validate the field after `stroke` has been applied to its text.
    /// Always reports the key as handled.
    pub fn on_key_up(&mut self, stroke: &KeyStroke) -> bool {
        let text = self.input.value().to_string();

        // Blank is tolerated while the whole value is being retyped
        if text.is_empty() {
            self.clear_error();
            return true;
        }

        // No negative or fractional values in this field
        if text == "-" || stroke.is_decimal_point() {
            self.reject(InputRejection::InvalidCharacter);
            return true;
        }

        if stroke.is_commit() {
            match parse_number(&text) {
                Some(value) if value.is_finite() && value >= 0.0 => self.commit(value),
                _ => self.reject(InputRejection::NonCommittableText),
            }
            return true;
        }

        let mut change = InputChange::new(text);
        if check_number(&mut change) {
            self.clear_error();
        } else {
            self.input.set_value(change.text);
            self.reject(InputRejection::InvalidCharacter);
        }
        true
    }

    fn commit(&mut self, value: f64) {
        self.clear_error();
        self.current_value = value;
        self.border = BorderToken::Edited;

        let edit = EditedValue::new(self.current_row_id, value);
        info!(row_id = edit.row_id, value, "edit committed");
        for handler in self.handlers.iter_mut() {
            handler(edit);
        }
    }

    fn reject(&mut self, reason: InputRejection) {
        debug!(
            row_id = self.current_row_id,
            text = self.input.value(),
            restored = self.current_value,
            %reason,
            "input rejected"
        );
        self.has_error = true;
        self.last_rejection = Some(reason);
        self.input.set_value(format_number(self.current_value));
    }

    fn clear_error(&mut self) {
        self.has_error = false;
        self.last_rejection = None;
    }
}

impl std::fmt::Debug for NumericFieldEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumericFieldEditor")
            .field("field_id", &self.field_id)
            .field("text", &self.input.value())
            .field("current_value", &self.current_value)
            .field("current_row_id", &self.current_row_id)
            .field("has_error", &self.has_error)
            .field("border", &self.border)
            .finish()
    }
}

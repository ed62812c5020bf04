use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

const NORMAL_CONTROLS: [(&str, &str); 8] = [
    ("e", "Edit"),
    ("␣", "Touch"),
    ("n/p", "Page"),
    ("s", "Sort"),
    ("r", "Reverse"),
    ("w", "Save"),
    ("?", "Help"),
    ("q", "Quit"),
];

const EDITING_CONTROLS: [(&str, &str); 3] = [("0-9", "Type"), ("Enter", "Commit"), ("Esc", "Leave")];

/// Key hints plus edit/touch counters
#[derive(Default)]
pub struct Controls {
    pub edited: usize,
    pub touched: usize,
    pub editing: bool,
    pub dimmed: bool,
    pub status: Option<String>,
    pub bg: Option<Color>,
}

impl Controls {
    pub fn new(edited: usize, touched: usize) -> Self {
        Self {
            edited,
            touched,
            ..Self::default()
        }
    }

    pub fn with_editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_background(mut self, bg: Color) -> Self {
        self.bg = Some(bg);
        self
    }

    fn counts_text(&self) -> String {
        match &self.status {
            Some(status) => status.clone(),
            None => format!("Edited: {}  Touched: {}", self.edited, self.touched),
        }
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let controls: &[(&str, &str)] = if self.editing {
            &EDITING_CONTROLS
        } else {
            &NORMAL_CONTROLS
        };

        let mut constraints = controls.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bg = self.bg.unwrap_or(Color::DarkGray);

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(bg))
                .render(layout[j + 1], buf);
        }

        Paragraph::new(self.counts_text())
            .style(base_style.bg(bg))
            .right_aligned()
            .render(layout[controls.len() * 2], buf);
    }
}

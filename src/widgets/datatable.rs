use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::editor::{BorderToken, NumericFieldEditor};
use crate::model::{CarData, Column, DISPLAY_COLUMNS, EDITABLE_COLUMN};

/// Colors for the table, resolved from the theme
#[derive(Debug, Clone, Copy)]
pub struct TableColors {
    pub header_bg: Color,
    pub header_fg: Color,
    pub row_numbers_fg: Color,
    pub footer_fg: Color,
    pub editor_neutral: Color,
    pub editor_edited: Color,
    pub editor_error: Color,
}

impl Default for TableColors {
    fn default() -> Self {
        Self {
            header_bg: Color::Indexed(236),
            header_fg: Color::White,
            row_numbers_fg: Color::DarkGray,
            footer_fg: Color::DarkGray,
            editor_neutral: Color::Gray,
            editor_edited: Color::Green,
            editor_error: Color::Red,
        }
    }
}

/// One page of the inventory, with the page's mileage editors
pub struct DataTable<'a> {
    pub header: Vec<String>,
    pub rows: &'a [CarData],
    pub editors: &'a [NumericFieldEditor],
    pub colors: TableColors,
    pub cell_padding: u16,
    /// Number of the first row on the page, when row numbers are shown
    pub row_numbers_from: Option<usize>,
    pub footer: String,
}

impl<'a> DataTable<'a> {
    pub fn new(rows: &'a [CarData], editors: &'a [NumericFieldEditor]) -> Self {
        Self {
            header: DISPLAY_COLUMNS
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            rows,
            editors,
            colors: TableColors::default(),
            cell_padding: 2,
            row_numbers_from: None,
            footer: String::new(),
        }
    }

    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = header;
        self
    }

    pub fn with_colors(mut self, colors: TableColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_row_numbers(mut self, first: Option<usize>) -> Self {
        self.row_numbers_from = first;
        self
    }

    pub fn with_footer(mut self, footer: String) -> Self {
        self.footer = footer;
        self
    }

    fn editor_for(&self, carid: i64) -> Option<&NumericFieldEditor> {
        self.editors.iter().find(|e| e.field_id() == carid)
    }

    fn editor_style(&self, editor: &NumericFieldEditor) -> Style {
        let color = if editor.has_error() {
            self.colors.editor_error
        } else {
            match editor.border() {
                BorderToken::Neutral => self.colors.editor_neutral,
                BorderToken::Edited => self.colors.editor_edited,
            }
        };
        let style = Style::default().fg(color);
        if editor.border() == BorderToken::Edited {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    fn cell_text(&self, row: &CarData, column: Column) -> String {
        if column == EDITABLE_COLUMN {
            if let Some(editor) = self.editor_for(row.carid) {
                return editor.text().to_string();
            }
        }
        row.cell(column)
    }

    /// Column widths: row-number column (if any) followed by the display columns
    fn widths(&self) -> Vec<u16> {
        let mut widths: Vec<u16> = Vec::with_capacity(DISPLAY_COLUMNS.len() + 1);
        if let Some(first) = self.row_numbers_from {
            let last = first + self.rows.len().saturating_sub(1);
            widths.push(last.to_string().len().max(1) as u16);
        }
        for (i, column) in DISPLAY_COLUMNS.iter().enumerate() {
            let header_len = self.header.get(i).map(|h| h.chars().count()).unwrap_or(0);
            let content_len = self
                .rows
                .iter()
                .map(|r| self.cell_text(r, *column).chars().count())
                .max()
                .unwrap_or(0);
            // leave room to type into the editable column
            let min = if *column == EDITABLE_COLUMN { 8 } else { 0 };
            widths.push(header_len.max(content_len).max(min) as u16);
        }
        widths
    }
}

impl StatefulWidget for DataTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut TableState) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(1)])
            .split(area);
        let table_area = layout[0];

        let widths = self.widths();
        let offset = usize::from(self.row_numbers_from.is_some());

        let header_style = if self.colors.header_bg == Color::Reset {
            Style::default().fg(self.colors.header_fg)
        } else {
            Style::default()
                .bg(self.colors.header_bg)
                .fg(self.colors.header_fg)
        };
        let mut header_cells: Vec<Cell> = Vec::new();
        if self.row_numbers_from.is_some() {
            header_cells.push(Cell::from("#"));
        }
        header_cells.extend(self.header.iter().map(|h| Cell::from(h.as_str())));

        let rows: Vec<Row> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, car)| {
                let mut cells: Vec<Cell> = Vec::with_capacity(widths.len());
                if let Some(first) = self.row_numbers_from {
                    cells.push(
                        Cell::from((first + i).to_string())
                            .style(Style::default().fg(self.colors.row_numbers_fg)),
                    );
                }
                for column in DISPLAY_COLUMNS {
                    let text = self.cell_text(car, column);
                    let cell = match (column == EDITABLE_COLUMN, self.editor_for(car.carid)) {
                        (true, Some(editor)) => {
                            Cell::from(Line::from(Span::styled(text, self.editor_style(editor))))
                        }
                        _ => Cell::from(text),
                    };
                    cells.push(cell);
                }
                Row::new(cells)
            })
            .collect();

        let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w)).collect();
        StatefulWidget::render(
            Table::new(rows, constraints)
                .column_spacing(self.cell_padding)
                .header(Row::new(header_cells).style(header_style))
                .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            table_area,
            buf,
            state,
        );

        // Overlay the focused editor so its cursor is visible
        if let Some(selected) = state.selected() {
            let focused = self
                .rows
                .get(selected)
                .and_then(|car| self.editor_for(car.carid))
                .filter(|e| e.is_focused());
            if let (Some(editor), Some(line)) = (focused, selected.checked_sub(state.offset())) {
                let col_index = offset
                    + DISPLAY_COLUMNS
                        .iter()
                        .position(|c| *c == EDITABLE_COLUMN)
                        .unwrap_or(0);
                let x: u16 = widths[..col_index]
                    .iter()
                    .map(|w| w + self.cell_padding)
                    .sum();
                let y = table_area.y + 1 + line as u16;
                if y < table_area.bottom() && x < table_area.width {
                    let cell_area = Rect {
                        x: table_area.x + x,
                        y,
                        width: widths[col_index].min(table_area.width - x),
                        height: 1,
                    };
                    let color = self.editor_style(editor).fg.unwrap_or(Color::Reset);
                    buf.set_style(cell_area, Style::reset());
                    editor.input().render(cell_area, buf);
                    buf.set_style(cell_area, Style::default().fg(color));
                }
            }
        }

        Paragraph::new(self.footer.as_str())
            .style(Style::default().fg(self.colors.footer_fg))
            .render(layout[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Inventory;

    fn render(table: DataTable, state: &mut TableState) -> Buffer {
        let area = Rect::new(0, 0, 100, 10);
        let mut buf = Buffer::empty(area);
        StatefulWidget::render(table, area, &mut buf, state);
        buf
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_renders_header_and_rows() {
        let inv = Inventory::sample();
        let rows = &inv.data[..3];
        let mut state = TableState::default();
        let buf = render(
            DataTable::new(rows, &[])
                .with_header(inv.header.clone())
                .with_footer("Page 1/1".to_string()),
            &mut state,
        );
        assert!(line(&buf, 0).contains("Mileage"));
        assert!(line(&buf, 1).contains(&rows[0].model));
        assert!(line(&buf, 9).contains("Page 1/1"));
    }

    #[test]
    fn test_mileage_shows_editor_text() {
        let inv = Inventory::sample();
        let rows = &inv.data[..2];
        let editors = vec![NumericFieldEditor::new(rows[0].carid, "424242")];
        let mut state = TableState::default();
        let buf = render(DataTable::new(rows, &editors), &mut state);
        assert!(line(&buf, 1).contains("424242"));
    }

    #[test]
    fn test_row_numbers_column() {
        let inv = Inventory::sample();
        let rows = &inv.data[..2];
        let mut state = TableState::default();
        let buf = render(
            DataTable::new(rows, &[]).with_row_numbers(Some(16)),
            &mut state,
        );
        assert!(line(&buf, 1).starts_with("16"));
        assert!(line(&buf, 2).starts_with("17"));
    }
}

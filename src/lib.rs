use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use tracing::{debug, warn};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod cli;
pub mod config;
pub mod editor;
pub mod logging;
pub mod model;
pub mod persist;
pub mod table;
pub mod tracker;
pub mod validation;
pub mod widgets;

pub use cache::CacheManager;
pub use cli::{Args, Column};
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use editor::{BorderToken, InputRejection, KeyStroke, NumericFieldEditor};
pub use model::{CarData, EditedValue, Inventory, Transmission};
pub use persist::{EditSink, JsonFileSink, LogSink, MemorySink};
pub use table::TableView;
pub use tracker::EditTracker;

use model::format_number;
use widgets::controls::Controls;
use widgets::datatable::{DataTable, TableColors};
use widgets::debug::{DebugBar, DebugState};

/// Application name used for config/cache directories
pub const APP_NAME: &str = "lotedit";

/// Startup options resolved from CLI args and config
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub page_size: usize,
    pub row_numbers: bool,
    pub sort: Option<(Column, bool)>,
    pub output_path: Option<PathBuf>,
    /// Save to the log rather than a file
    pub log_only: bool,
    pub debug: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl StartOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.display.page_size,
            row_numbers: config.display.row_numbers,
            sort: None,
            output_path: config.persistence.output_path.clone(),
            log_only: config.persistence.log_only,
            debug: config.debug.enabled,
        }
    }

    /// CLI args take precedence over config
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let mut opts = Self::from_config(config);
        if let Some(page_size) = args.page_size {
            opts.page_size = page_size.max(1);
        }
        opts.row_numbers = args.row_numbers || config.display.row_numbers;
        opts.sort = args.sort.map(|column| (column, !args.descending));
        if args.output.is_some() {
            opts.output_path = args.output.clone();
            opts.log_only = false;
        }
        opts.log_only |= args.log_only;
        opts.debug = args.debug || config.debug.enabled;
        opts
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Load(Inventory),
    /// An editor committed a value
    Edited(EditedValue),
    Save,
    Resize(u16, u16),
    Exit,
    Crash(String),
}

/// Result of handling everything queued on the event channel
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Drain {
    /// Nothing was queued
    Idle,
    /// At least one event was handled; redraw
    Updated,
    Exit,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    #[default]
    Normal,
    /// Keys go to the mileage editor of the selected row
    Editing,
}

pub struct App {
    table: TableView,
    tracker: EditTracker,
    editors: Vec<NumericFieldEditor>,
    events: Sender<AppEvent>,
    pub input_mode: InputMode,
    sink: Box<dyn EditSink>,
    theme: Theme,
    row_numbers: bool,
    show_help: bool,
    status: Option<String>,
    debug: DebugState,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, Theme::default(), &StartOptions::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, opts: &StartOptions) -> App {
        let sink: Box<dyn EditSink> = if opts.log_only {
            Box::new(LogSink)
        } else {
            let output_path = opts.output_path.clone().unwrap_or_else(|| {
                let cache = CacheManager::new(APP_NAME).unwrap_or_else(|e| {
                    warn!("Could not initialize cache manager: {}", e);
                    CacheManager::with_dir(std::env::temp_dir().join(APP_NAME))
                });
                cache.cache_file(cache::SAVED_EDITS_FILE)
            });
            Box::new(JsonFileSink::new(output_path))
        };

        let mut table = TableView::new(opts.page_size);
        if let Some((column, ascending)) = opts.sort {
            table.sort_by(column, ascending);
        }

        App {
            table,
            tracker: EditTracker::new(),
            editors: Vec::new(),
            events,
            input_mode: InputMode::Normal,
            sink,
            theme,
            row_numbers: opts.row_numbers,
            show_help: false,
            status: None,
            debug: DebugState {
                enabled: opts.debug,
                ..DebugState::default()
            },
        }
    }

    /// Replace where saved edits go
    pub fn with_sink(mut self, sink: Box<dyn EditSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn tracker(&self) -> &EditTracker {
        &self.tracker
    }

    pub fn editors(&self) -> &[NumericFieldEditor] {
        &self.editors
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Editor of the selected row
    pub fn selected_editor(&self) -> Option<&NumericFieldEditor> {
        let carid = self.table.selected_row()?.carid;
        self.editors.iter().find(|e| e.field_id() == carid)
    }

    fn selected_editor_mut(&mut self) -> Option<&mut NumericFieldEditor> {
        let carid = self.table.selected_row()?.carid;
        self.editors.iter_mut().find(|e| e.field_id() == carid)
    }

    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    /// Bind a new inventory to the table
    pub fn load(&mut self, inventory: Inventory) {
        self.table.bind_header(inventory.header);
        self.table.bind_data(inventory.data);
        self.bind_editors();
    }

    /// Create one editor per row on the current page. Rows with a recorded
    /// edit show the edited value.
    fn bind_editors(&mut self) {
        self.editors = self
            .table
            .page_rows()
            .iter()
            .map(|car| {
                let value = self.tracker.edited(car.carid).unwrap_or(car.mileage);
                let mut editor = NumericFieldEditor::new(car.carid, format_number(value));
                let events = self.events.clone();
                editor.subscribe(move |edit| {
                    if let Err(e) = events.send(AppEvent::Edited(edit)) {
                        warn!("Could not deliver edit for row {}: {}", edit.row_id, e);
                    }
                });
                editor
            })
            .collect();
        self.tracker.on_editor_set_changed(&mut self.editors);
        self.input_mode = InputMode::Normal;
        debug!(editors = self.editors.len(), "editor set changed");
    }

    /// Rebind editors when the visible rows changed
    fn page_changed(&mut self, changed: bool) {
        if changed {
            self.bind_editors();
        }
    }

    fn touch_selected(&mut self) {
        self.tracker.on_touched(self.table.selected_row());
    }

    fn begin_edit(&mut self) {
        self.touch_selected();
        if let Some(editor) = self.selected_editor_mut() {
            editor.on_focus();
            self.input_mode = InputMode::Editing;
            self.status = None;
        }
    }

    fn end_edit(&mut self) {
        if let Some(editor) = self.selected_editor_mut() {
            editor.on_blur();
        }
        self.input_mode = InputMode::Normal;
    }

    fn save(&mut self) {
        match self.tracker.commit_all(self.sink.as_mut()) {
            Ok(count) => {
                let plural = if count == 1 { "" } else { "s" };
                self.status = Some(match self.sink.destination() {
                    Some(path) => format!("Saved {} edit{} to {}", count, plural, path.display()),
                    None => format!("Logged {} edit{}", count, plural),
                });
            }
            Err(e) => {
                warn!("Saving edits failed: {}", e);
                self.status = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        self.debug.on_key(event);

        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(AppEvent::Exit);
        }

        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return None;
        }

        match self.input_mode {
            InputMode::Editing => self.editing_key(event),
            InputMode::Normal => self.normal_key(event),
        }
    }

    fn editing_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab => {
                self.debug.action("leave_editor");
                self.end_edit();
            }
            _ => {
                let rejection = self.selected_editor_mut().and_then(|editor| {
                    editor.handle_key(event);
                    editor.last_rejection()
                });
                self.status = rejection.map(|r| r.to_string());
            }
        }
        None
    }

    fn normal_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.status = None;
        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Down | KeyCode::Char('j') => {
                self.debug.action("select_next");
                let changed = self.table.select_next();
                self.page_changed(changed);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.debug.action("select_previous");
                let changed = self.table.select_previous();
                self.page_changed(changed);
            }
            KeyCode::Char('n') | KeyCode::PageDown | KeyCode::Right => {
                self.debug.action("next_page");
                let changed = self.table.next_page();
                self.page_changed(changed);
            }
            KeyCode::Char('p') | KeyCode::PageUp | KeyCode::Left => {
                self.debug.action("prev_page");
                let changed = self.table.prev_page();
                self.page_changed(changed);
            }
            KeyCode::Home | KeyCode::Char('g') => {
                let changed = self.table.first_page();
                self.page_changed(changed);
            }
            KeyCode::End | KeyCode::Char('G') => {
                let changed = self.table.last_page();
                self.page_changed(changed);
            }
            KeyCode::Char('s') => {
                self.debug.action("cycle_sort");
                let changed = self.table.cycle_sort_column();
                self.page_changed(changed);
            }
            KeyCode::Char('r') => {
                self.debug.action("reverse");
                let changed = self.table.reverse();
                self.page_changed(changed);
            }
            KeyCode::Char(' ') => {
                self.debug.action("touch");
                self.touch_selected();
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.debug.action("edit");
                self.begin_edit();
            }
            KeyCode::Char('w') => return Some(AppEvent::Save),
            _ => {}
        }
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Load(inventory) => {
                self.load(inventory.clone());
                None
            }
            AppEvent::Edited(edit) => {
                self.debug.commits += 1;
                self.tracker.on_edited(Some(edit));
                None
            }
            AppEvent::Save => {
                self.save();
                None
            }
            AppEvent::Resize(cols, rows) => {
                debug!(cols, rows, "resized");
                None
            }
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Handle every event waiting on `rx`, including the ones raised while
    /// handling them (an Enter queues its `Edited`), so the tracker is up to
    /// date before the next keystroke is read.
    pub fn drain_events(&mut self, rx: &Receiver<AppEvent>) -> Result<Drain> {
        let mut drained = Drain::Idle;
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Exit => return Ok(Drain::Exit),
                AppEvent::Crash(msg) => return Err(eyre!(msg)),
                event => {
                    if let Some(next) = self.event(&event) {
                        self.events.send(next)?;
                    }
                    drained = Drain::Updated;
                }
            }
        }
        Ok(drained)
    }

    fn footer(&self) -> String {
        let total = self.table.num_rows();
        if total == 0 {
            return "No rows".to_string();
        }
        let start = self.table.page_start();
        let end = start + self.table.page_rows().len();
        let mut footer = format!(
            "Page {}/{}  Rows {}-{} of {}",
            self.table.page() + 1,
            self.table.page_count(),
            start + 1,
            end,
            total
        );
        if let Some((column, ascending)) = self.table.sort_state() {
            footer.push_str(&format!(
                "  Sorted by {} {}",
                column.label(),
                if ascending { "↑" } else { "↓" }
            ));
        }
        footer
    }

    fn table_colors(&self) -> TableColors {
        TableColors {
            header_bg: self.color("table_header_bg"),
            header_fg: self.color("table_header"),
            row_numbers_fg: self.color("row_numbers"),
            footer_fg: self.color("text_secondary"),
            editor_neutral: self.color("editor_neutral"),
            editor_edited: self.color("editor_edited"),
            editor_error: self.color("editor_error"),
        }
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect_fixed(area, 60, 20);
        Clear.render(popup, buf);
        Paragraph::new(HELP_TEXT)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help ")
                    .border_style(Style::default().fg(self.color("primary"))),
            )
            .render(popup, buf);
    }
}

const HELP_TEXT: &str = "\
Navigation
  ↑/↓ j/k      Move row cursor (continues across pages)
  n/p ←/→      Next / previous page
  g/G          First / last page
  s            Sort by next column
  r            Reverse sort direction

Editing
  Space        Mark the row as touched
  e / Enter    Edit the row's mileage
  0-9          Type digits (other characters are rolled back)
  Enter        Commit the typed mileage
  Esc / Tab    Leave the field without committing
  w            Save all committed edits

  ?            Close this help      q  Quit";

/// Centered rect with fixed width and height, clamped to fit inside `r`.
fn centered_rect_fixed(r: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(r.width);
    let h = height.min(r.height);
    Rect {
        x: r.x + r.width.saturating_sub(w) / 2,
        y: r.y + r.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.frames += 1;

        Block::default()
            .style(Style::default().bg(self.color("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Inventory ")
            .border_style(Style::default().fg(self.color("primary")));
        let table_area = block.inner(layout[0]);
        block.render(layout[0], buf);

        let row_numbers_from = self
            .row_numbers
            .then(|| self.table.page_start() + 1);
        let data_table = DataTable::new(self.table.page_rows(), &self.editors)
            .with_header(self.table.header())
            .with_colors(self.table_colors())
            .with_row_numbers(row_numbers_from)
            .with_footer(self.footer());
        let mut state = self.table.table_state.clone();
        StatefulWidget::render(data_table, table_area, buf, &mut state);
        self.table.table_state = state;

        let status_is_error = self
            .selected_editor()
            .map(|e| e.has_error())
            .unwrap_or(false);
        let controls = Controls::new(self.tracker.edited_count(), self.tracker.touched_count())
            .with_editing(self.input_mode == InputMode::Editing)
            .with_dimmed(self.show_help)
            .with_status(self.status.clone())
            .with_background(if status_is_error {
                self.color("error")
            } else {
                self.color("controls_bg")
            });
        (&controls).render(layout[1], buf);

        if self.debug.enabled {
            DebugBar::new(&self.debug, self.selected_editor()).render(layout[2], buf);
        }

        if self.show_help {
            self.render_help(area, buf);
        }
    }
}

use ratatui::widgets::TableState;
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::model::{CarData, Column, DISPLAY_COLUMNS};

/// Paged, sortable view over the inventory rows.
///
/// Rows and header are supplied explicitly through `bind_data` and
/// `bind_header`. Every method that changes which rows are on the current page
/// returns `true` so the host can rebuild the page's editors.
pub struct TableView {
    header: Vec<String>,
    rows: Vec<CarData>,
    page_size: usize,
    page: usize,
    sort_column: Option<Column>,
    sort_ascending: bool,
    pub table_state: TableState,
}

impl TableView {
    pub fn new(page_size: usize) -> Self {
        Self {
            header: Vec::new(),
            rows: Vec::new(),
            page_size: page_size.max(1),
            page: 0,
            sort_column: None,
            sort_ascending: true,
            table_state: TableState::default(),
        }
    }

    pub fn bind_header(&mut self, header: Vec<String>) {
        debug!(len = header.len(), "header bound");
        self.header = header;
    }

    /// Replace the row set. Resets to the first page and reapplies the sort.
    pub fn bind_data(&mut self, rows: Vec<CarData>) {
        self.rows = rows;
        self.apply_sort();
        self.page = 0;
        self.select_first();
        info!(rows = self.rows.len(), pages = self.page_count(), "data bound");
    }

    /// Header label for each display column, falling back to the column name
    pub fn header(&self) -> Vec<String> {
        DISPLAY_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.header
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| col.label().to_string())
            })
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Always at least one page, even when empty
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    /// Index of the first row on the current page within the sorted rows
    pub fn page_start(&self) -> usize {
        self.page * self.page_size
    }

    pub fn page_rows(&self) -> &[CarData] {
        let start = self.page_start().min(self.rows.len());
        let end = (start + self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn goto_page(&mut self, page: usize) -> bool {
        let page = page.min(self.page_count() - 1);
        if page == self.page {
            return false;
        }
        let previous = self.page;
        self.page = page;
        self.select_first();
        info!(
            previous_page = previous,
            page,
            page_count = self.page_count(),
            "page changed"
        );
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.goto_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.goto_page(page),
            None => false,
        }
    }

    pub fn first_page(&mut self) -> bool {
        self.goto_page(0)
    }

    pub fn last_page(&mut self) -> bool {
        self.goto_page(self.page_count() - 1)
    }

    fn select_first(&mut self) {
        if self.page_rows().is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    /// Selected row's index within the current page
    pub fn selected_index(&self) -> Option<usize> {
        self.table_state
            .selected()
            .filter(|&i| i < self.page_rows().len())
    }

    pub fn selected_row(&self) -> Option<&CarData> {
        self.selected_index().and_then(|i| self.page_rows().get(i))
    }

    /// Move the cursor down, continuing onto the next page. Returns whether the page changed.
    pub fn select_next(&mut self) -> bool {
        let len = self.page_rows().len();
        match self.selected_index() {
            Some(i) if i + 1 < len => {
                self.table_state.select(Some(i + 1));
                false
            }
            Some(_) => self.next_page(),
            None => {
                self.select_first();
                false
            }
        }
    }

    /// Move the cursor up, continuing onto the previous page's last row
    pub fn select_previous(&mut self) -> bool {
        match self.selected_index() {
            Some(0) => {
                if self.prev_page() {
                    let last = self.page_rows().len().saturating_sub(1);
                    self.table_state.select(Some(last));
                    true
                } else {
                    false
                }
            }
            Some(i) => {
                self.table_state.select(Some(i - 1));
                false
            }
            None => {
                self.select_first();
                false
            }
        }
    }

    pub fn sort_state(&self) -> Option<(Column, bool)> {
        self.sort_column.map(|c| (c, self.sort_ascending))
    }

    /// Sort by `column`, returning to the first page
    pub fn sort_by(&mut self, column: Column, ascending: bool) -> bool {
        self.sort_column = Some(column);
        self.sort_ascending = ascending;
        self.apply_sort();
        self.page = 0;
        self.select_first();
        info!(column = column.label(), ascending, "sorted");
        true
    }

    /// Advance the sort to the next display column (unsorted → first column → ... → unsorted)
    pub fn cycle_sort_column(&mut self) -> bool {
        let next = match self.sort_column {
            None => Some(DISPLAY_COLUMNS[0]),
            Some(current) => DISPLAY_COLUMNS
                .iter()
                .position(|c| *c == current)
                .and_then(|i| DISPLAY_COLUMNS.get(i + 1))
                .copied(),
        };
        match next {
            Some(column) => self.sort_by(column, self.sort_ascending),
            None => self.clear_sort(),
        }
    }

    /// Flip the sort direction (or reverse the natural order when unsorted)
    pub fn reverse(&mut self) -> bool {
        self.sort_ascending = !self.sort_ascending;
        match self.sort_column {
            Some(column) => self.sort_by(column, self.sort_ascending),
            None => {
                self.rows.reverse();
                self.page = 0;
                self.select_first();
                true
            }
        }
    }

    /// Back to id order
    pub fn clear_sort(&mut self) -> bool {
        self.sort_column = None;
        self.sort_ascending = true;
        self.apply_sort();
        self.page = 0;
        self.select_first();
        info!("sort cleared");
        true
    }

    fn apply_sort(&mut self) {
        match self.sort_column {
            Some(column) => {
                let ascending = self.sort_ascending;
                self.rows.sort_by(|a, b| {
                    let ord = compare_by(a, b, column).then(a.carid.cmp(&b.carid));
                    if ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                });
            }
            None => self.rows.sort_by_key(|r| r.carid),
        }
    }
}

fn compare_by(a: &CarData, b: &CarData, column: Column) -> Ordering {
    match column {
        Column::Year => a.year.cmp(&b.year),
        Column::Model => a.model.to_lowercase().cmp(&b.model.to_lowercase()),
        Column::Price => a.price.total_cmp(&b.price),
        Column::Mileage => a.mileage.total_cmp(&b.mileage),
        Column::Color => a.color.to_lowercase().cmp(&b.color.to_lowercase()),
        Column::Transmission => a.transmission.as_str().cmp(b.transmission.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Inventory;

    fn view(page_size: usize) -> TableView {
        let inv = Inventory::sample();
        let mut view = TableView::new(page_size);
        view.bind_header(inv.header);
        view.bind_data(inv.data);
        view
    }

    #[test]
    fn test_pagination() {
        let mut v = view(15);
        assert_eq!(v.num_rows(), 40);
        assert_eq!(v.page_count(), 3);
        assert_eq!(v.page_rows().len(), 15);
        assert!(v.next_page());
        assert!(v.next_page());
        assert_eq!(v.page_rows().len(), 10);
        assert!(!v.next_page());
        assert!(v.first_page());
        assert!(!v.prev_page());
        assert!(v.last_page());
        assert_eq!(v.page(), 2);
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let mut v = TableView::new(10);
        v.bind_data(Vec::new());
        assert_eq!(v.page_count(), 1);
        assert!(v.page_rows().is_empty());
        assert!(v.selected_row().is_none());
        assert!(!v.next_page());
    }

    #[test]
    fn test_select_next_crosses_page() {
        let mut v = view(2);
        assert_eq!(v.selected_row().map(|r| r.carid), Some(0));
        assert!(!v.select_next());
        assert_eq!(v.selected_row().map(|r| r.carid), Some(1));
        assert!(v.select_next());
        assert_eq!(v.page(), 1);
        assert_eq!(v.selected_row().map(|r| r.carid), Some(2));
        assert!(v.select_previous());
        assert_eq!(v.selected_row().map(|r| r.carid), Some(1));
    }

    #[test]
    fn test_sort_by_mileage() {
        let mut v = view(100);
        v.sort_by(Column::Mileage, true);
        let miles: Vec<f64> = v.page_rows().iter().map(|r| r.mileage).collect();
        assert!(miles.windows(2).all(|w| w[0] <= w[1]));
        v.reverse();
        let miles: Vec<f64> = v.page_rows().iter().map(|r| r.mileage).collect();
        assert!(miles.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(v.sort_state(), Some((Column::Mileage, false)));
    }

    #[test]
    fn test_sort_returns_to_first_page() {
        let mut v = view(10);
        v.next_page();
        v.sort_by(Column::Year, true);
        assert_eq!(v.page(), 0);
    }

    #[test]
    fn test_cycle_sort_wraps_to_unsorted() {
        let mut v = view(10);
        for _ in 0..DISPLAY_COLUMNS.len() {
            v.cycle_sort_column();
        }
        assert_eq!(v.sort_state(), Some((Column::Transmission, true)));
        v.cycle_sort_column();
        assert_eq!(v.sort_state(), None);
        assert_eq!(v.page_rows()[0].carid, 0);
    }

    #[test]
    fn test_header_falls_back_to_labels() {
        let mut v = TableView::new(5);
        v.bind_header(vec!["Yr".to_string()]);
        assert_eq!(v.header()[0], "Yr");
        assert_eq!(v.header()[3], "mileage");
    }
}

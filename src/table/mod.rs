//! Generic table component
//!
//! Holds rows against column definitions and owns only local UI state: the
//! sort column and direction, the expanded detail rows, and the current page
//! when paging in memory. It never talks to the network. In server-side mode
//! page and page-size changes come back to the caller as [`TableEvent`]s and
//! the displayed totals are the caller's, not `items.len()`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::pagination::{PaginationState, PAGE_SIZE_OPTIONS};

/// Column definition: field key on the row and header text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Display value of one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

static EMPTY: CellValue = CellValue::Empty;

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Ordering used by column sort
    ///
    /// Numbers and dates compare by value, text case-insensitively, and
    /// empty cells sort before everything else.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Less,
            (_, CellValue::Empty) => Ordering::Greater,
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (a, b) => a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{:.2}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            CellValue::Empty => Ok(()),
        }
    }
}

/// One display row keyed by a stable id
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: String,
    cells: BTreeMap<String, CellValue>,
    details: Vec<(String, String)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: BTreeMap::new(),
            details: Vec::new(),
        }
    }

    /// Builder-style cell assignment
    pub fn cell(mut self, key: impl Into<String>, value: CellValue) -> Self {
        self.cells.insert(key.into(), value);
        self
    }

    /// Attach the label/value pairs shown when the row is expanded
    pub fn with_details(mut self, details: Vec<(String, String)>) -> Self {
        self.details = details;
        self
    }

    /// Cell for `key`; a key the row lacks renders empty
    pub fn get(&self, key: &str) -> &CellValue {
        self.cells.get(key).unwrap_or(&EMPTY)
    }

    pub fn details(&self) -> &[(String, String)] {
        &self.details
    }

    /// Display strings for `columns`, in column order
    pub fn values(&self, columns: &[ColumnDef]) -> Vec<String> {
        columns
            .iter()
            .map(|c| self.get(&c.key).to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Single-column sort; `column == None` means unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Header click: a new column sorts ascending, the same column flips
    pub fn toggle(&mut self, key: &str) {
        if self.column.as_deref() == Some(key) {
            self.direction = self.direction.flip();
        } else {
            self.column = Some(key.to_string());
            self.direction = SortDirection::Ascending;
        }
    }
}

/// How rows are split into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// All rows are in memory; the table pages them itself
    Client(PaginationState),
    /// The caller fetched one page and owns page changes
    Server(PaginationState),
}

/// Requests the table hands back to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    PageChange(usize),
    PageSizeChange(usize),
    Update(String),
}

/// Table state for one rendering of a collection
#[derive(Debug, Clone)]
pub struct TableView {
    columns: Vec<ColumnDef>,
    items: Vec<TableRow>,
    sort: SortState,
    paging: Paging,
    show_detail_buttons: bool,
    expanded: BTreeSet<String>,
}

impl TableView {
    /// Client-side table with the default page size
    pub fn new(columns: Vec<ColumnDef>, items: Vec<TableRow>) -> Self {
        let paging = Paging::Client(PaginationState::for_items(items.len(), 10));
        Self {
            columns,
            items,
            sort: SortState::default(),
            paging,
            show_detail_buttons: false,
            expanded: BTreeSet::new(),
        }
    }

    /// Page the rows in memory, `items_per_page` at a time
    pub fn with_client_paging(mut self, items_per_page: usize) -> Self {
        self.paging = Paging::Client(PaginationState::for_items(self.items.len(), items_per_page));
        self
    }

    /// Show `items` as one server page described by `state`
    pub fn with_server_paging(mut self, state: PaginationState) -> Self {
        self.paging = Paging::Server(state.clamp());
        self
    }

    pub fn with_default_sort(mut self, column: &str, direction: SortDirection) -> Self {
        self.sort = SortState {
            column: Some(column.to_string()),
            direction,
        };
        self
    }

    pub fn with_detail_buttons(mut self, show: bool) -> Self {
        self.show_detail_buttons = show;
        self
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn items(&self) -> &[TableRow] {
        &self.items
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn is_server_side(&self) -> bool {
        matches!(self.paging, Paging::Server(_))
    }

    fn state(&self) -> &PaginationState {
        match &self.paging {
            Paging::Client(state) | Paging::Server(state) => state,
        }
    }

    fn state_mut(&mut self) -> &mut PaginationState {
        match &mut self.paging {
            Paging::Client(state) | Paging::Server(state) => state,
        }
    }

    pub fn current_page(&self) -> usize {
        self.state().current_page
    }

    pub fn page_count(&self) -> usize {
        self.state().total_pages
    }

    pub fn items_per_page(&self) -> usize {
        self.state().items_per_page
    }

    /// Total shown in the footer; the caller's total in server-side mode
    pub fn total_items(&self) -> usize {
        self.state().total_items
    }

    /// Header click on `key`
    pub fn click_header(&mut self, key: &str) {
        self.sort.toggle(key);
    }

    /// All items in sort order; ties keep their original order
    pub fn sorted_items(&self) -> Vec<&TableRow> {
        let mut rows: Vec<&TableRow> = self.items.iter().collect();
        if let Some(key) = &self.sort.column {
            rows.sort_by(|a, b| {
                let ord = a.get(key).compare(b.get(key));
                match self.sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    /// Rows on screen for the current page
    pub fn visible_rows(&self) -> Vec<&TableRow> {
        let rows = self.sorted_items();
        match &self.paging {
            Paging::Server(_) => rows,
            Paging::Client(state) => rows[state.window()].to_vec(),
        }
    }

    /// Page control click
    ///
    /// Client-side mode moves the in-memory page and returns `None`.
    /// Server-side mode leaves `items` untouched and asks the caller to fetch.
    pub fn go_to_page(&mut self, page: usize) -> Option<TableEvent> {
        match &mut self.paging {
            Paging::Client(state) => {
                state.go_to(page);
                None
            }
            Paging::Server(state) => {
                if page == 0 || page > state.total_pages || page == state.current_page {
                    return None;
                }
                state.current_page = page;
                Some(TableEvent::PageChange(page))
            }
        }
    }

    pub fn next_page(&mut self) -> Option<TableEvent> {
        let page = self.current_page() + 1;
        self.go_to_page(page)
    }

    pub fn previous_page(&mut self) -> Option<TableEvent> {
        let page = self.current_page().saturating_sub(1);
        self.go_to_page(page)
    }

    /// Page-size selector; only sizes in [`PAGE_SIZE_OPTIONS`] are accepted
    pub fn select_page_size(&mut self, size: usize) -> Option<TableEvent> {
        if !PAGE_SIZE_OPTIONS.contains(&size) || size == self.items_per_page() {
            return None;
        }
        if self.is_server_side() {
            self.state_mut().resize(size);
            Some(TableEvent::PageSizeChange(size))
        } else {
            self.paging = Paging::Client(PaginationState::for_items(self.items.len(), size));
            None
        }
    }

    /// "Update" button on a row
    pub fn click_update(&self, row_id: &str) -> Option<TableEvent> {
        self.items
            .iter()
            .any(|r| r.id == row_id)
            .then(|| TableEvent::Update(row_id.to_string()))
    }

    /// Expand or collapse a row's detail view; returns the new state
    pub fn toggle_details(&mut self, row_id: &str) -> bool {
        if !self.show_detail_buttons || !self.items.iter().any(|r| r.id == row_id) {
            return false;
        }
        if !self.expanded.remove(row_id) {
            self.expanded.insert(row_id.to_string());
            return true;
        }
        false
    }

    pub fn is_expanded(&self, row_id: &str) -> bool {
        self.expanded.contains(row_id)
    }

    pub fn show_detail_buttons(&self) -> bool {
        self.show_detail_buttons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDef> {
        vec![ColumnDef::new("id", "ID"), ColumnDef::new("status", "Status")]
    }

    fn row(id: usize, status: &str) -> TableRow {
        TableRow::new(id.to_string())
            .cell("id", CellValue::Number(id as f64))
            .cell("status", CellValue::text(status))
    }

    fn ids(rows: &[&TableRow]) -> Vec<String> {
        rows.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_row_values_in_column_order() {
        let items = vec![row(1, "b"), row(2, "a")];
        let view = TableView::new(columns(), items);
        let rows = view.visible_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values(view.columns()), vec!["1", "b"]);
    }

    #[test]
    fn test_missing_key_renders_empty() {
        let row = TableRow::new("1");
        assert_eq!(row.values(&columns()), vec!["", ""]);
    }

    #[test]
    fn test_sort_cycle() {
        let mut view = TableView::new(columns(), vec![row(1, "b"), row(2, "a")]);
        assert_eq!(view.sort().column, None);
        assert_eq!(ids(&view.visible_rows()), vec!["1", "2"]);

        view.click_header("status");
        assert_eq!(view.sort().direction, SortDirection::Ascending);
        assert_eq!(ids(&view.visible_rows()), vec!["2", "1"]);

        view.click_header("status");
        assert_eq!(view.sort().direction, SortDirection::Descending);
        assert_eq!(ids(&view.visible_rows()), vec!["1", "2"]);

        view.click_header("status");
        assert_eq!(view.sort().direction, SortDirection::Ascending);
        assert_eq!(ids(&view.visible_rows()), vec!["2", "1"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let items = vec![row(1, "x"), row(2, "a"), row(3, "x"), row(4, "a")];
        let view =
            TableView::new(columns(), items).with_default_sort("status", SortDirection::Ascending);
        assert_eq!(ids(&view.visible_rows()), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_numeric_sort() {
        let items = vec![row(10, "a"), row(9, "a"), row(100, "a")];
        let view = TableView::new(columns(), items).with_default_sort("id", SortDirection::Ascending);
        assert_eq!(ids(&view.visible_rows()), vec!["9", "10", "100"]);
    }

    #[test]
    fn test_client_side_pages() {
        let items: Vec<_> = (0..12).map(|i| row(i, "s")).collect();
        let mut view = TableView::new(columns(), items).with_client_paging(5);
        assert_eq!(view.page_count(), 3);
        assert_eq!(ids(&view.visible_rows()), vec!["0", "1", "2", "3", "4"]);

        assert_eq!(view.go_to_page(2), None);
        assert_eq!(ids(&view.visible_rows()), vec!["5", "6", "7", "8", "9"]);

        assert_eq!(view.next_page(), None);
        assert_eq!(ids(&view.visible_rows()), vec!["10", "11"]);

        // Past the last page stays put
        view.next_page();
        assert_eq!(view.current_page(), 3);
    }

    #[test]
    fn test_server_side_page_change_emits_event_once() {
        let items = vec![row(1, "a"), row(2, "b")];
        let state = PaginationState {
            current_page: 1,
            items_per_page: 2,
            total_pages: 5,
            total_items: 9,
        };
        let mut view = TableView::new(columns(), items.clone()).with_server_paging(state);

        assert_eq!(view.total_items(), 9);
        assert_eq!(view.page_count(), 5);

        let mut events = Vec::new();
        events.extend(view.go_to_page(3));
        assert_eq!(events, vec![TableEvent::PageChange(3)]);
        assert_eq!(view.items(), items.as_slice());
        assert_eq!(view.visible_rows().len(), 2);

        // Clicking the current page or out of range does nothing
        assert_eq!(view.go_to_page(3), None);
        assert_eq!(view.go_to_page(6), None);
    }

    #[test]
    fn test_page_size_selection() {
        let items: Vec<_> = (0..12).map(|i| row(i, "s")).collect();
        let mut view = TableView::new(columns(), items.clone()).with_client_paging(5);
        view.go_to_page(3);
        assert_eq!(view.select_page_size(10), None);
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.page_count(), 2);

        // Sizes outside the selector are ignored
        view.select_page_size(7);
        assert_eq!(view.items_per_page(), 10);

        let mut server = TableView::new(columns(), items)
            .with_server_paging(PaginationState::new(10).with_totals(40, 4));
        assert_eq!(server.select_page_size(20), Some(TableEvent::PageSizeChange(20)));
        assert_eq!(server.current_page(), 1);
    }

    #[test]
    fn test_update_action() {
        let view = TableView::new(columns(), vec![row(7, "a")]);
        assert_eq!(view.click_update("7"), Some(TableEvent::Update("7".into())));
        assert_eq!(view.click_update("8"), None);
    }

    #[test]
    fn test_detail_toggle() {
        let mut view = TableView::new(columns(), vec![row(1, "a"), row(2, "b")]);
        assert!(!view.toggle_details("1"));

        let mut view = view.with_detail_buttons(true);
        assert!(view.toggle_details("1"));
        assert!(view.is_expanded("1"));
        assert!(!view.is_expanded("2"));
        assert!(!view.toggle_details("1"));
        assert!(!view.is_expanded("1"));
        assert!(!view.toggle_details("missing"));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(120.0).to_string(), "120");
        assert_eq!(CellValue::Number(99.5).to_string(), "99.50");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()).to_string(),
            "09/01/2024"
        );
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}

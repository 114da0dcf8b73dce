//! Generic list view
//!
//! Brings one entity's collection to the screen: fetches a page with the
//! current `page`/`limit`, keeps the search term, and builds the table.
//! Responses are applied only if their ticket is still the newest, so a
//! slow response to an earlier page or search never overwrites a later one.

use crate::api::{ApiClient, ApiError, FetchedPage, ListQuery};
use crate::core::entity::{EntityConfig, EntityKind};
use crate::core::pagination::{PaginationState, PAGE_SIZE_OPTIONS};
use crate::core::record::map_records;
use crate::core::route::Route;
use crate::core::search::{filter_rows, SearchScope};
use crate::core::sequence::{RequestSequencer, Ticket};
use crate::table::{ColumnDef, TableRow, TableView};

#[derive(Debug)]
pub struct ListView {
    config: &'static EntityConfig,
    scope: SearchScope,
    search: String,
    pagination: PaginationState,
    /// False once the endpoint answers with a bare array
    server_paged: bool,
    rows: Vec<TableRow>,
    error: Option<String>,
    sequencer: RequestSequencer,
}

impl ListView {
    pub fn new(kind: EntityKind, items_per_page: usize, scope: SearchScope) -> Self {
        Self {
            config: kind.config(),
            scope,
            search: String::new(),
            pagination: PaginationState::new(items_per_page),
            server_paged: true,
            rows: Vec::new(),
            error: None,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Request `page` on the first fetch; clamped once totals are known
    pub fn start_at(mut self, page: usize) -> Self {
        self.pagination.current_page = page.max(1);
        self
    }

    pub fn config(&self) -> &'static EntityConfig {
        self.config
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn is_server_paged(&self) -> bool {
        self.server_paged
    }

    /// Rows of the last successful fetch, before search filtering
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Page-level error shown in place of the table
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Issue a ticket and the query for the current state
    pub fn begin_fetch(&self) -> (Ticket, ListQuery) {
        let ticket = self.sequencer.begin();
        let mut query = ListQuery::new(self.pagination.current_page, self.pagination.items_per_page);
        if self.scope == SearchScope::Server {
            query = query.with_search(&self.search);
        }
        (ticket, query)
    }

    /// Fetch the current page and apply it
    ///
    /// A page past the end is clamped to the last page, which is then
    /// fetched once more so the rows match the page shown.
    pub async fn fetch(&mut self, client: &ApiClient) -> bool {
        let (ticket, query) = self.begin_fetch();
        let result = client.list_page(self.config, &query).await;
        let applied = self.apply(ticket, result);
        if applied
            && self.server_paged
            && self.error.is_none()
            && self.pagination.current_page != query.page
        {
            tracing::debug!(
                entity = self.config.name,
                requested = query.page,
                page = self.pagination.current_page,
                "page clamped, refetching"
            );
            let (ticket, query) = self.begin_fetch();
            let result = client.list_page(self.config, &query).await;
            return self.apply(ticket, result);
        }
        applied
    }

    /// Apply a response; returns false if a newer request made it stale
    pub fn apply(&mut self, ticket: Ticket, result: Result<FetchedPage, ApiError>) -> bool {
        if !self.sequencer.is_current(ticket) {
            tracing::debug!(entity = self.config.name, ?ticket, "discarding stale response");
            return false;
        }
        match result {
            Ok(page) => {
                self.rows = map_records(self.config, &page.records);
                let per_page = self.pagination.items_per_page;
                match page.meta {
                    Some(meta) => {
                        self.server_paged = true;
                        self.pagination =
                            PaginationState::from_meta(meta, self.pagination.current_page, per_page);
                    }
                    None => {
                        // The whole collection arrived; page it in memory
                        self.server_paged = false;
                        let mut state = PaginationState::for_items(self.rows.len(), per_page);
                        state.go_to(self.pagination.current_page);
                        self.pagination = state;
                    }
                }
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(entity = self.config.name, error = %e, "list fetch failed");
                let fallback = format!("Failed to fetch {}", self.config.name_plural);
                self.error = Some(e.user_message(&fallback));
                self.rows.clear();
            }
        }
        true
    }

    /// Change the search term; returns true if the list must be refetched
    pub fn set_search(&mut self, term: &str) -> bool {
        self.search = term.to_string();
        match self.scope {
            SearchScope::Page => false,
            SearchScope::Server => {
                self.pagination.current_page = 1;
                true
            }
        }
    }

    /// Move to `page`; returns true if the list must be refetched
    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to(page) && self.server_paged
    }

    /// Change rows per page; returns true if the list must be refetched
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&size) || size == self.pagination.items_per_page {
            return false;
        }
        if self.server_paged {
            self.pagination.resize(size);
            true
        } else {
            self.pagination = PaginationState::for_items(self.rows.len(), size);
            false
        }
    }

    /// Fetched rows matching the search term
    pub fn visible_rows(&self) -> Vec<&TableRow> {
        filter_rows(&self.rows, self.config.search_fields, &self.search)
    }

    /// Table for the current state
    pub fn table(&self) -> TableView {
        let columns = self
            .config
            .columns
            .iter()
            .map(|c| ColumnDef::new(c.key, c.label))
            .collect();
        let items = self.visible_rows().into_iter().cloned().collect();
        let (sort_key, direction) = self.config.default_sort;
        let table = TableView::new(columns, items)
            .with_default_sort(sort_key, direction)
            .with_detail_buttons(true);
        if self.server_paged {
            table.with_server_paging(self.pagination)
        } else {
            let mut table = table.with_client_paging(self.pagination.items_per_page);
            table.go_to_page(self.pagination.current_page);
            table
        }
    }

    /// "Add New" action
    pub fn add_new(&self) -> Route {
        Route::Add(self.config.kind)
    }

    /// "Update" action on a fetched row
    pub fn update(&self, row_id: &str) -> Option<Route> {
        self.rows
            .iter()
            .any(|r| r.id == row_id)
            .then(|| Route::Update(self.config.kind, row_id.to_string()))
    }
}

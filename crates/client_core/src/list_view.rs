//! Pagination, sort and search state for a tabular user view, and the query
//! derived from it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{
    domain::{AccountStatus, Role, UserId, UserRecord, YesNo},
    protocol::{SortOrder, UserListQuery, DEFAULT_PAGE_SIZE},
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{debounce::Debounced, fields, ports::UserListSource};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(600);
pub const CREATED_AT_FORMAT: &str = "%b %-d, %Y %I:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    Unset,
}

impl SortDirection {
    fn wire(self) -> Option<SortOrder> {
        match self {
            SortDirection::Ascending => Some(SortOrder::Asc),
            SortDirection::Descending => Some(SortOrder::Desc),
            SortDirection::Unset => None,
        }
    }
}

/// Sort state a table header reports when clicked: ascend, descend, or
/// cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSignal {
    Ascend,
    Descend,
    None,
}

/// Fixed filters a view instance always sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListScope {
    pub author: Option<String>,
    pub is_delete: Option<YesNo>,
}

impl Default for ListScope {
    fn default() -> Self {
        Self {
            author: None,
            is_delete: Some(YesNo::No),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListViewConfig {
    pub page_size: u32,
    pub debounce: Duration,
    /// Role of the signed-in operator; prefixes the row action links.
    pub viewer_role: Role,
}

impl Default for ListViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_SEARCH_DEBOUNCE,
            viewer_role: Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
    pub width: Option<u16>,
    pub sortable: bool,
}

pub const COLUMNS: [Column; 8] = [
    Column {
        key: "image",
        title: "",
        width: Some(150),
        sortable: false,
    },
    Column {
        key: "name",
        title: "Name",
        width: None,
        sortable: false,
    },
    Column {
        key: "email",
        title: "Email",
        width: None,
        sortable: false,
    },
    Column {
        key: "role",
        title: "Role",
        width: Some(100),
        sortable: false,
    },
    Column {
        key: "contact",
        title: "Contact no.",
        width: None,
        sortable: false,
    },
    Column {
        key: "createdAt",
        title: "Created at",
        width: None,
        sortable: true,
    },
    Column {
        key: "status",
        title: "Status",
        width: Some(100),
        sortable: false,
    },
    Column {
        key: "action",
        title: "Action",
        width: Some(130),
        sortable: false,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowActions {
    pub view_path: String,
    pub edit_path: String,
    pub toggle_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub image: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub contact: String,
    pub created_at: String,
    pub status: AccountStatus,
    pub actions: RowActions,
}

/// Result of the latest fetch.
#[derive(Debug, Clone, Default)]
pub struct ListData {
    pub records: Vec<UserRecord>,
    pub total: u64,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct ListViewController {
    config: ListViewConfig,
    scope: ListScope,
    page: u32,
    page_size: u32,
    sort_field: String,
    sort_direction: SortDirection,
    search_input: String,
    search: Debounced<String>,
    data: ListData,
    last_query: Option<UserListQuery>,
}

impl ListViewController {
    pub fn new(scope: ListScope, config: ListViewConfig) -> Self {
        let page_size = config.page_size.max(1);
        let search = Debounced::new(String::new(), config.debounce);
        Self {
            config,
            scope,
            page: 1,
            page_size,
            sort_field: String::new(),
            sort_direction: SortDirection::Unset,
            search_input: String::new(),
            search,
            data: ListData::default(),
            last_query: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> (&str, SortDirection) {
        (&self.sort_field, self.sort_direction)
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn debounced_search(&self) -> &str {
        self.search.settled()
    }

    pub fn data(&self) -> &ListData {
        &self.data
    }

    pub fn columns(&self) -> &'static [Column] {
        &COLUMNS
    }

    /// Records a keystroke. The input is visible immediately; the query only
    /// picks it up once the debounce interval passes without further input.
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.set_search_input_at(text, Instant::now());
    }

    pub fn set_search_input_at(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input.clone_from(&text);
        self.search.set(text, now);
    }

    /// Settles `text` as the search term at once, skipping the debounce.
    pub fn submit_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.search_input.clone_from(&text);
        self.search.reset(text);
    }

    /// Deadline at which the pending search input settles, if any.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Returns true when the debounced search term changed.
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        let changed = self.search.poll(now);
        if changed {
            debug!(term = %self.search.settled(), "search term settled");
        }
        changed
    }

    pub fn change_pagination(&mut self, page: u32, page_size: u32) {
        self.page = page.max(1);
        self.page_size = page_size.max(1);
    }

    pub fn change_sort(&mut self, field: impl Into<String>, signal: SortSignal) {
        match signal {
            SortSignal::Ascend => {
                self.sort_field = field.into();
                self.sort_direction = SortDirection::Ascending;
            }
            SortSignal::Descend => {
                self.sort_field = field.into();
                self.sort_direction = SortDirection::Descending;
            }
            SortSignal::None => {
                self.sort_field.clear();
                self.sort_direction = SortDirection::Unset;
            }
        }
    }

    /// Clears sort and search in one step. Page and page size are kept.
    pub fn reset(&mut self) {
        self.sort_field.clear();
        self.sort_direction = SortDirection::Unset;
        self.search_input.clear();
        self.search.reset(String::new());
    }

    pub fn has_active_filters(&self) -> bool {
        !self.sort_field.is_empty()
            || self.sort_direction != SortDirection::Unset
            || !self.search_input.is_empty()
    }

    pub fn query(&self) -> UserListQuery {
        let term = self.search.settled();
        UserListQuery {
            limit: self.page_size,
            page: self.page,
            sort_by: self.sort_field.clone(),
            sort_order: self.sort_direction.wire(),
            search_term: (!term.is_empty()).then(|| term.clone()),
            is_delete: self.scope.is_delete,
            author: self.scope.author.clone(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.data.total.div_ceil(u64::from(self.page_size))
    }

    /// Fetches when the derived query differs from the last one sent. Returns
    /// whether a fetch happened.
    pub async fn refresh<S>(&mut self, source: &S) -> bool
    where
        S: UserListSource + ?Sized,
    {
        self.poll_debounce(Instant::now());
        let query = self.query();
        if self.last_query.as_ref() == Some(&query) {
            return false;
        }
        self.fetch(source, query).await;
        true
    }

    /// Fetches the current query unconditionally.
    pub async fn reload<S>(&mut self, source: &S)
    where
        S: UserListSource + ?Sized,
    {
        self.poll_debounce(Instant::now());
        let query = self.query();
        self.fetch(source, query).await;
    }

    async fn fetch<S>(&mut self, source: &S, query: UserListQuery)
    where
        S: UserListSource + ?Sized,
    {
        self.data.loading = true;
        self.last_query = Some(query.clone());
        match source.list_users(&query).await {
            Ok(response) => {
                debug!(
                    page = query.page,
                    returned = response.data.len(),
                    total = response.meta.total,
                    "user list fetched"
                );
                self.data.records = response.data;
                self.data.total = response.meta.total;
                self.data.last_error = None;
            }
            Err(error) => {
                warn!(%error, page = query.page, "user list fetch failed");
                self.data.last_error = Some(error.to_string());
            }
        }
        self.data.loading = false;
    }

    /// Replaces a fetched record in place, e.g. after a status change.
    pub fn apply_record(&mut self, updated: UserRecord) -> bool {
        match self.data.records.iter_mut().find(|r| r.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> Vec<UserRow> {
        self.data
            .records
            .iter()
            .map(|record| present_row(record, self.config.viewer_role))
            .collect()
    }
}

pub fn format_created_at(created_at: DateTime<Utc>) -> String {
    created_at.format(CREATED_AT_FORMAT).to_string()
}

pub fn present_row(record: &UserRecord, viewer_role: Role) -> UserRow {
    let base = format!("/{}/manage-users/all-users", viewer_role.as_str());
    UserRow {
        id: record.id.clone(),
        image: fields::image(record).to_string(),
        name: fields::display_name(record),
        email: record.email.clone(),
        role: record.role,
        contact: fields::contact(record),
        created_at: format_created_at(record.created_at),
        status: record.status,
        actions: RowActions {
            view_path: format!("{base}/details/{}", record.id),
            edit_path: format!("{base}/edit/{}", record.id),
            toggle_label: toggle_label(record.status),
        },
    }
}

pub fn toggle_label(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Active => "Deactivate User",
        _ => "Active User",
    }
}

#[cfg(test)]
#[path = "tests/list_view_tests.rs"]
mod tests;

//! Plain-text adapters: stdin confirmation, stdout notifications and table
//! rendering.

use std::{fmt::Write as _, sync::Arc};

use async_trait::async_trait;
use client_core::{
    fields,
    list_view::{self, Column},
    ConfirmPrompt, Confirmation, ListViewController, Notifier, UserRow,
};
use shared::domain::UserRecord;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

pub type InputLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> InputLines {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks on stdout and reads the answer from the shared stdin reader.
pub struct StdinConfirm {
    input: InputLines,
}

impl StdinConfirm {
    pub fn new(input: InputLines) -> Self {
        Self { input }
    }
}

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, message: &str, confirm_label: &str) -> Confirmation {
        println!("{message} [{confirm_label}/no]");
        let answer = match self.input.lock().await.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => String::new(),
            Err(error) => {
                tracing::warn!(%error, "failed to read confirmation");
                String::new()
            }
        };
        Confirmation {
            is_confirmed: is_affirmative(&answer),
        }
    }
}

/// Confirms every prompt; used for `--yes`.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, message: &str, _confirm_label: &str) -> Confirmation {
        tracing::info!(%message, "confirmed by --yes");
        Confirmation { is_confirmed: true }
    }
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        println!("ok: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

fn cell(row: &UserRow, index: usize, column: &Column) -> String {
    match column.key {
        "image" => (index + 1).to_string(),
        "name" => row.name.clone(),
        "email" => row.email.clone(),
        "role" => fields::role_label(row.role).to_string(),
        "contact" => row.contact.clone(),
        "createdAt" => row.created_at.clone(),
        "status" => row.status.to_string(),
        "action" => row.actions.toggle_label.to_string(),
        _ => String::new(),
    }
}

fn title(column: &Column) -> &'static str {
    match column.key {
        "image" => "#",
        _ => column.title,
    }
}

pub fn render_table(columns: &[Column], rows: &[UserRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| columns.iter().map(|c| cell(row, index, c)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(title(column).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", title(column)))
        .collect();
    let _ = writeln!(out, "{}", header.join(" | ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    }
    out
}

pub fn render_view(view: &ListViewController) -> String {
    let data = view.data();
    let mut out = render_table(view.columns(), &view.rows());
    if data.records.is_empty() {
        out.push_str("(no users)\n");
    }
    let (sort_field, direction) = view.sort();
    let _ = write!(
        out,
        "page {}/{} · {} per page · {} total",
        view.page(),
        view.total_pages().max(1),
        view.page_size(),
        data.total
    );
    if !sort_field.is_empty() {
        let _ = write!(out, " · sorted by {sort_field} {direction:?}");
    }
    if !view.debounced_search().is_empty() {
        let _ = write!(out, " · search \"{}\"", view.debounced_search());
    }
    if view.has_active_filters() {
        out.push_str(" · /reset to clear");
    }
    out.push('\n');
    if let Some(error) = &data.last_error {
        let _ = writeln!(out, "last fetch failed: {error}");
    }
    out
}

pub fn render_details(record: &UserRecord) -> String {
    let profile = fields::profile(record);
    let text = |value: Option<&String>| value.map(String::as_str).unwrap_or("-").to_string();
    let lines = [
        ("Id", record.id.to_string()),
        ("Name", fields::display_name(record)),
        ("Role", fields::role_label(record.role).to_string()),
        ("Email", record.email.clone()),
        ("Contact no.", text(profile.and_then(|p| p.phone_number.as_ref()))),
        ("Gender", text(profile.and_then(|p| p.gender.as_ref()))),
        ("Blood group", text(profile.and_then(|p| p.blood_group.as_ref()))),
        ("Address", text(profile.and_then(|p| p.address.as_ref()))),
        ("Date of birth", text(profile.and_then(|p| p.date_of_birth.as_ref()))),
        ("Image", fields::image(record).to_string()),
        ("Status", record.status.to_string()),
        ("Created at", list_view::format_created_at(record.created_at)),
    ];
    let mut out = String::new();
    for (label, value) in lines {
        let _ = writeln!(out, "{label:<14}{value}");
    }
    out
}

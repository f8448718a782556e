//! Interactive list session. Plain lines are search input; lines starting
//! with `/` are commands.

use std::sync::Arc;

use anyhow::Result;
use client_core::{
    list_view::SortSignal, ListViewController, StatusToggle, ToggleOutcome, UserDirectory,
    UsersApi,
};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::terminal::{render_details, render_view, InputLines};

const SORT_FIELD: &str = "createdAt";

const HELP: &str = "\
type to search (applies after a short pause)
/page N      go to page N
/size N      rows per page
/sort asc|desc|none
/reset       clear sort and search
/show N      details for row N
/toggle N    activate or deactivate row N
/reload      fetch again
/quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    Page(u32),
    Size(u32),
    Sort(SortSignal),
    Reset,
    Show(usize),
    Toggle(usize),
    Reload,
    Help,
    Quit,
    Invalid(String),
}

fn row_number(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

pub fn parse_line(line: &str) -> BrowseCommand {
    let Some(command) = line.trim_end().strip_prefix('/') else {
        return BrowseCommand::Search(line.trim().to_string());
    };
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("");
    let parsed = match name {
        "page" => arg.parse().ok().map(BrowseCommand::Page),
        "size" => arg.parse().ok().filter(|n| *n > 0).map(BrowseCommand::Size),
        "sort" => match arg {
            "asc" | "ascend" => Some(BrowseCommand::Sort(SortSignal::Ascend)),
            "desc" | "descend" => Some(BrowseCommand::Sort(SortSignal::Descend)),
            "none" | "" => Some(BrowseCommand::Sort(SortSignal::None)),
            _ => None,
        },
        "reset" => Some(BrowseCommand::Reset),
        "show" => row_number(arg).map(BrowseCommand::Show),
        "toggle" => row_number(arg).map(BrowseCommand::Toggle),
        "reload" => Some(BrowseCommand::Reload),
        "help" | "?" => Some(BrowseCommand::Help),
        "quit" | "q" | "exit" => Some(BrowseCommand::Quit),
        _ => None,
    };
    parsed.unwrap_or_else(|| BrowseCommand::Invalid(line.trim().to_string()))
}

async fn next_line(input: &InputLines) -> Result<Option<String>> {
    Ok(input.lock().await.next_line().await?)
}

pub async fn run(
    api: Arc<UsersApi>,
    mut view: ListViewController,
    toggle: StatusToggle,
    input: InputLines,
) -> Result<()> {
    println!("{HELP}\n");
    loop {
        if view.refresh(api.as_ref()).await {
            print!("{}", render_view(&view));
        }

        let deadline = view.search_deadline();
        let line = tokio::select! {
            line = next_line(&input) => line?,
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                view.poll_debounce(Instant::now());
                continue;
            }
        };
        let Some(line) = line else {
            debug!("stdin closed");
            return Ok(());
        };

        match parse_line(&line) {
            BrowseCommand::Search(text) => view.set_search_input(text),
            BrowseCommand::Page(page) => view.change_pagination(page, view.page_size()),
            BrowseCommand::Size(size) => view.change_pagination(view.page(), size),
            BrowseCommand::Sort(signal) => view.change_sort(SORT_FIELD, signal),
            BrowseCommand::Reset => view.reset(),
            BrowseCommand::Reload => {
                view.reload(api.as_ref()).await;
                print!("{}", render_view(&view));
            }
            BrowseCommand::Show(index) => {
                let Some(record) = view.data().records.get(index).cloned() else {
                    eprintln!("no row {}", index + 1);
                    continue;
                };
                match api.get_user(&record.id).await {
                    Ok(record) => print!("{}", render_details(&record)),
                    Err(error) => eprintln!("error: {error}"),
                }
            }
            BrowseCommand::Toggle(index) => {
                let Some(record) = view.data().records.get(index).cloned() else {
                    eprintln!("no row {}", index + 1);
                    continue;
                };
                match toggle.toggle(&record).await {
                    ToggleOutcome::Updated {
                        record: Some(updated),
                        ..
                    } => {
                        view.apply_record(updated);
                        print!("{}", render_view(&view));
                    }
                    ToggleOutcome::Updated { record: None, .. } => {
                        view.reload(api.as_ref()).await;
                        print!("{}", render_view(&view));
                    }
                    ToggleOutcome::Cancelled => println!("cancelled"),
                    ToggleOutcome::Busy => println!("a change for this user is still running"),
                    ToggleOutcome::Failed(_) => {}
                }
            }
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Quit => return Ok(()),
            BrowseCommand::Invalid(text) => eprintln!("unrecognised command: {text} (try /help)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_search_input() {
        assert_eq!(parse_line("  ann lee \n"), BrowseCommand::Search("ann lee".into()));
        assert_eq!(parse_line(""), BrowseCommand::Search(String::new()));
    }

    #[test]
    fn commands_parse_arguments() {
        assert_eq!(parse_line("/page 3"), BrowseCommand::Page(3));
        assert_eq!(parse_line("/size 25"), BrowseCommand::Size(25));
        assert_eq!(parse_line("/sort desc"), BrowseCommand::Sort(SortSignal::Descend));
        assert_eq!(parse_line("/sort"), BrowseCommand::Sort(SortSignal::None));
        assert_eq!(parse_line("/toggle 2"), BrowseCommand::Toggle(1));
        assert_eq!(parse_line("/q"), BrowseCommand::Quit);
    }

    #[test]
    fn bad_arguments_are_invalid() {
        assert_eq!(parse_line("/size 0"), BrowseCommand::Invalid("/size 0".into()));
        assert_eq!(parse_line("/toggle 0"), BrowseCommand::Invalid("/toggle 0".into()));
        assert_eq!(parse_line("/sort up"), BrowseCommand::Invalid("/sort up".into()));
        assert_eq!(parse_line("/frobnicate"), BrowseCommand::Invalid("/frobnicate".into()));
    }
}

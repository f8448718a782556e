use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    list_view::SortSignal, ports::NoModal, AccountCreator, ConfirmPrompt, ListViewController,
    ProfileEditor, ProfileForm, StatusToggle, SubmitOutcome, ToggleOutcome, UserDirectory,
    UsersApi,
};
use shared::{
    domain::{AccountStatus, PersonName, Role, UserId},
    protocol::NewUser,
};
use tracing_subscriber::EnvFilter;

mod browse;
mod config;
mod terminal;

use config::{CliOverrides, ConsoleSettings};
use terminal::{AutoConfirm, StdinConfirm, TerminalNotifier};

#[derive(Parser, Debug)]
#[command(about = "Browse and manage user accounts")]
struct Cli {
    /// Settings file; defaults to ./admin_console.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    access_token: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    /// Only list users created by this author.
    #[arg(long, global = true)]
    author: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SortArg {
    Asc,
    Desc,
    None,
}

impl From<SortArg> for SortSignal {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => SortSignal::Ascend,
            SortArg::Desc => SortSignal::Descend,
            SortArg::None => SortSignal::None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of users.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
        /// Sort by creation time.
        #[arg(long, value_enum, default_value = "none")]
        sort: SortArg,
    },
    /// Print a user's profile.
    Show { user_id: String },
    /// Flip a user between active and deactivated.
    ToggleStatus {
        user_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Update profile fields; omitted or blank values are left unchanged.
    Edit {
        user_id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        middle_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        blood_group: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        img: Option<String>,
    },
    /// Register a new account; the global --author is recorded as its creator.
    Create {
        /// admin, trainer, seller or student.
        role: Role,
        email: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        middle_name: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        img: Option<String>,
    },
    /// Interactive list with live search.
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(
        cli.config.as_deref(),
        CliOverrides {
            api_url: cli.api_url,
            access_token: cli.access_token,
            page_size: cli.page_size,
            author: cli.author,
        },
    );
    tracing::debug!(api_url = %settings.api_url, page_size = settings.page_size, "console settings");

    let mut api = UsersApi::new(&settings.api_url)
        .with_context(|| format!("invalid api url {}", settings.api_url))?;
    if let Some(token) = &settings.access_token {
        api = api.with_access_token(token.clone());
    }
    let api = Arc::new(api);

    match cli.command {
        Command::List { page, search, sort } => {
            let mut view = new_view(&settings);
            view.change_pagination(page, settings.page_size);
            view.change_sort("createdAt", sort.into());
            if let Some(search) = search {
                view.submit_search(search);
            }
            view.reload(api.as_ref()).await;
            print!("{}", terminal::render_view(&view));
            if let Some(error) = &view.data().last_error {
                anyhow::bail!("failed to list users: {error}");
            }
        }
        Command::Show { user_id } => {
            let record = api.get_user(&UserId::from(user_id.as_str())).await?;
            print!("{}", terminal::render_details(&record));
        }
        Command::ToggleStatus { user_id, yes } => {
            let record = api.get_user(&UserId::from(user_id.as_str())).await?;
            let confirm: Arc<dyn ConfirmPrompt> = if yes {
                Arc::new(AutoConfirm)
            } else {
                Arc::new(StdinConfirm::new(terminal::stdin_lines()))
            };
            let toggle = StatusToggle::new(
                api.clone(),
                confirm,
                Arc::new(TerminalNotifier),
                Arc::new(NoModal),
            );
            match toggle.toggle(&record).await {
                ToggleOutcome::Updated { status, .. } => println!("{} is now {status}", record.id),
                ToggleOutcome::Cancelled => println!("cancelled"),
                ToggleOutcome::Busy => {}
                ToggleOutcome::Failed(message) => anyhow::bail!(message),
            }
        }
        Command::Edit {
            user_id,
            first_name,
            middle_name,
            last_name,
            email,
            phone_number,
            gender,
            blood_group,
            address,
            date_of_birth,
            img,
        } => {
            let form = ProfileForm {
                first_name: first_name.unwrap_or_default(),
                middle_name: middle_name.unwrap_or_default(),
                last_name: last_name.unwrap_or_default(),
                email: email.unwrap_or_default(),
                phone_number: phone_number.unwrap_or_default(),
                gender: gender.unwrap_or_default(),
                blood_group: blood_group.unwrap_or_default(),
                address: address.unwrap_or_default(),
                date_of_birth: date_of_birth.unwrap_or_default(),
                img: img.unwrap_or_default(),
            };
            let editor = ProfileEditor::new(api.clone(), Arc::new(TerminalNotifier));
            let outcome = editor.submit(&UserId::from(user_id.as_str()), form).await;
            if let SubmitOutcome::Failed(message) = outcome {
                anyhow::bail!(message);
            }
        }
        Command::Create {
            role,
            email,
            first_name,
            last_name,
            middle_name,
            phone_number,
            img,
        } => {
            let creator = AccountCreator::new(api.clone(), Arc::new(TerminalNotifier));
            let outcome = creator
                .create(NewUser {
                    role,
                    email,
                    name: PersonName {
                        first_name,
                        middle_name,
                        last_name,
                    },
                    phone_number,
                    author: settings.author.clone(),
                    status: AccountStatus::Active,
                    img,
                })
                .await;
            match outcome {
                SubmitOutcome::Saved {
                    record: Some(record),
                } => print!("{}", terminal::render_details(&record)),
                SubmitOutcome::Saved { record: None } => {}
                SubmitOutcome::Failed(message) => anyhow::bail!(message),
            }
        }
        Command::Browse => {
            let input = terminal::stdin_lines();
            let toggle = StatusToggle::new(
                api.clone(),
                Arc::new(StdinConfirm::new(input.clone())),
                Arc::new(TerminalNotifier),
                Arc::new(NoModal),
            );
            browse::run(api, new_view(&settings), toggle, input).await?;
        }
    }

    Ok(())
}

fn new_view(settings: &ConsoleSettings) -> ListViewController {
    ListViewController::new(settings.list_scope(), settings.list_view_config())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{AccountStatus, PersonName, Role, UserId},
    protocol::{NewUser, UserPatch},
};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/users.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateUser {
        role: String,
        email: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    SetStatus {
        user_id: String,
        status: String,
    },
    SoftDelete {
        user_id: String,
    },
    Seed {
        #[arg(long, default_value_t = 40)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateUser {
            role,
            email,
            first_name,
            last_name,
            phone_number,
            author,
        } => {
            let role: Role = role.parse()?;
            let record = storage
                .create_user(&NewUser {
                    role,
                    email,
                    name: PersonName {
                        first_name,
                        middle_name: None,
                        last_name,
                    },
                    phone_number,
                    author,
                    status: AccountStatus::Active,
                    img: None,
                })
                .await?;
            println!("created user_id={}", record.id);
        }
        Command::SetStatus { user_id, status } => {
            let status: AccountStatus = status.parse()?;
            let user_id = UserId::from(user_id.as_str());
            storage
                .update_user(&user_id, &UserPatch::status(status))
                .await?
                .with_context(|| format!("user {user_id} not found"))?;
            println!("user_id={user_id} status={status}");
        }
        Command::SoftDelete { user_id } => {
            let user_id = UserId::from(user_id.as_str());
            if !storage.soft_delete_user(&user_id).await? {
                anyhow::bail!("user {user_id} not found");
            }
            println!("soft-deleted user_id={user_id}");
        }
        Command::Seed { count } => {
            let inserted = storage.seed_demo_users(count).await?;
            println!("seeded {inserted} users");
        }
    }

    Ok(())
}

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

use shared::{
    domain::{AccountStatus, PersonName, Profile, Role, UserId, UserRecord},
    protocol::UserListQuery,
};

use crate::Storage;

const FIRST_NAMES: [&str; 8] = ["Amina", "Bilal", "Chen", "Dana", "Emeka", "Farah", "Goran", "Hana"];
const LAST_NAMES: [&str; 6] = ["Rahman", "Okafor", "Silva", "Novak", "Ito", "Haddad"];

impl Storage {
    /// Inserts `count` demo accounts spread across every role when the users
    /// table is empty. Returns how many rows were written.
    pub async fn seed_demo_users(&self, count: usize) -> Result<usize> {
        let existing = self
            .list_users(&UserListQuery {
                limit: 1,
                ..UserListQuery::default()
            })
            .await?;
        if existing.total > 0 {
            info!(existing = existing.total, "users table not empty; skipping demo seed");
            return Ok(0);
        }

        let now = Utc::now();
        for idx in 0..count {
            self.insert_user(&demo_user(idx, now - Duration::hours(idx as i64)))
                .await?;
        }
        info!(count, "seeded demo users");
        Ok(count)
    }
}

fn demo_user(idx: usize, created_at: chrono::DateTime<Utc>) -> UserRecord {
    let role = Role::KNOWN[idx % Role::KNOWN.len()];
    let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
    let last = LAST_NAMES[idx % LAST_NAMES.len()];
    let email = format!("{}.{}{idx}@example.com", first.to_lowercase(), last.to_lowercase());
    let status = if idx % 5 == 4 {
        AccountStatus::Deactivate
    } else {
        AccountStatus::Active
    };

    let record = UserRecord::new(UserId::generate(), role, email.clone(), status, created_at)
        .with_profile(Profile {
            name: PersonName {
                first_name: first.to_string(),
                middle_name: None,
                last_name: last.to_string(),
            },
            phone_number: Some(format!("0170{idx:07}")),
            email: Some(email),
            ..Profile::default()
        });

    if role == Role::Student {
        record.with_author("demo-seller")
    } else {
        record
    }
}

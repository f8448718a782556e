use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::debug;

mod seed;

use shared::{
    domain::{AccountStatus, PersonName, Profile, Role, UserId, UserRecord, YesNo},
    protocol::{NewUser, SortOrder, UserListQuery, UserPatch},
};

const USER_COLUMNS: &str = "id, role, email, status, is_delete, author, created_at, \
     first_name, middle_name, last_name, phone_number, img, gender, blood_group, address, \
     date_of_birth";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Another account already uses this email address.
#[derive(Debug, Error)]
#[error("email {email} is already registered")]
pub struct EmailTaken {
    pub email: String,
}

/// One page of users plus the number of rows matching the filters.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub total: u64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_user(&self, new_user: &NewUser) -> Result<UserRecord> {
        if new_user.role == Role::Unknown {
            return Err(anyhow!("cannot create a user without a known role"));
        }
        let record = UserRecord::new(
            UserId::generate(),
            new_user.role,
            new_user.email.trim(),
            new_user.status,
            Utc::now(),
        )
        .with_profile(new_user.profile());
        let record = match &new_user.author {
            Some(author) => record.with_author(author.clone()),
            None => record,
        };
        self.insert_user(&record).await?;
        Ok(record)
    }

    pub async fn insert_user(&self, record: &UserRecord) -> Result<()> {
        if !record.status.is_known() {
            return Err(anyhow!("cannot store user {} with an unknown status", record.id));
        }
        let profile = role_profile(record).cloned().unwrap_or_default();
        sqlx::query(
            "INSERT INTO users (id, role, email, status, is_delete, author, created_at,
                first_name, middle_name, last_name, phone_number, img, gender, blood_group,
                address, date_of_birth)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.as_str())
        .bind(record.role.as_str())
        .bind(&record.email)
        .bind(record.status.as_str())
        .bind(record.is_delete.as_str())
        .bind(record.author.as_deref())
        .bind(record.created_at)
        .bind(&profile.name.first_name)
        .bind(profile.name.middle_name.as_deref())
        .bind(&profile.name.last_name)
        .bind(profile.phone_number.as_deref())
        .bind(profile.img.as_deref())
        .bind(profile.gender.as_deref())
        .bind(profile.blood_group.as_deref())
        .bind(profile.address.as_deref())
        .bind(profile.date_of_birth.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|err| write_error(err, &record.email, format!("failed to insert user {}", record.id)))?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn list_users(&self, query: &UserListQuery) -> Result<UserPage> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let limit = query.limit.max(1);
        let offset = i64::try_from(u64::from(query.page.max(1) - 1) * u64::from(limit))
            .context("page offset out of range")?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_filters(&mut select, query);
        select.push(" ORDER BY ");
        match sort_column(&query.sort_by) {
            Some(column) => {
                let direction = match query.sort_order.unwrap_or(SortOrder::Asc) {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                select.push(format!("{column} {direction}, id ASC"));
            }
            None => {
                select.push("created_at DESC, id ASC");
            }
        }
        select.push(" LIMIT ");
        select.push_bind(i64::from(limit));
        select.push(" OFFSET ");
        select.push_bind(offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let users = rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;
        debug!(total, returned = users.len(), "listed users");

        Ok(UserPage {
            users,
            total: total.max(0) as u64,
        })
    }

    /// Applies `patch` and returns the updated record, or `None` when no user
    /// has that id.
    pub async fn update_user(&self, user_id: &UserId, patch: &UserPatch) -> Result<Option<UserRecord>> {
        let Some(current) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        let mut profile = role_profile(&current).cloned().unwrap_or_default();
        patch.apply_to_profile(&mut profile);
        let email = patch
            .email
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.email.as_str())
            .to_string();
        if patch.status.is_some_and(|status| !status.is_known()) {
            return Err(anyhow!("cannot store user {user_id} with an unknown status"));
        }

        sqlx::query(
            "UPDATE users SET email = ?, status = COALESCE(?, status), first_name = ?, middle_name = ?,
                last_name = ?, phone_number = ?, img = ?, gender = ?, blood_group = ?,
                address = ?, date_of_birth = ?
             WHERE id = ?",
        )
        .bind(&email)
        .bind(patch.status.map(AccountStatus::as_str))
        .bind(&profile.name.first_name)
        .bind(profile.name.middle_name.as_deref())
        .bind(&profile.name.last_name)
        .bind(profile.phone_number.as_deref())
        .bind(profile.img.as_deref())
        .bind(profile.gender.as_deref())
        .bind(profile.blood_group.as_deref())
        .bind(profile.address.as_deref())
        .bind(profile.date_of_birth.as_deref())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| write_error(err, &email, format!("failed to update user {user_id}")))?;

        self.get_user(user_id).await
    }

    pub async fn soft_delete_user(&self, user_id: &UserId) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_delete = ? WHERE id = ?")
            .bind(YesNo::Yes.as_str())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &UserListQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(is_delete) = query.is_delete {
        builder.push(" AND is_delete = ");
        builder.push_bind(is_delete.as_str());
    }
    if let Some(author) = query.author.as_deref().filter(|a| !a.is_empty()) {
        builder.push(" AND author = ");
        builder.push_bind(author.to_string());
    }
    if let Some(term) = query
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        for (idx, column) in ["email", "first_name", "last_name", "phone_number"]
            .into_iter()
            .enumerate()
        {
            if idx > 0 {
                builder.push(" OR ");
            }
            builder.push(format!("LOWER(COALESCE({column}, '')) LIKE "));
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\'");
        }
        builder.push(")");
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'`; wildcards in `term` match
/// literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn write_error(err: sqlx::Error, email: &str, context: String) -> anyhow::Error {
    let unique_violation = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());
    if unique_violation {
        EmailTaken {
            email: email.to_string(),
        }
        .into()
    } else {
        anyhow::Error::new(err).context(context)
    }
}

fn sort_column(sort_by: &str) -> Option<&'static str> {
    match sort_by {
        "createdAt" => Some("created_at"),
        "email" => Some("email"),
        "role" => Some("role"),
        "status" => Some("status"),
        "firstName" | "name" => Some("first_name"),
        _ => None,
    }
}

fn role_profile(record: &UserRecord) -> Option<&Profile> {
    match record.role {
        Role::Admin => record.admin.as_ref(),
        Role::Trainer => record.trainer.as_ref(),
        Role::Seller => record.seller.as_ref(),
        Role::Student => record.student.as_ref(),
        Role::Unknown => None,
    }
}

fn user_from_row(row: &SqliteRow) -> Result<UserRecord> {
    let role = row
        .try_get::<String, _>("role")?
        .parse::<Role>()
        .unwrap_or(Role::Unknown);
    let status = row
        .try_get::<String, _>("status")?
        .parse::<AccountStatus>()
        .unwrap_or(AccountStatus::Unknown);
    let is_delete = YesNo::from_bool(row.try_get::<String, _>("is_delete")? == YesNo::Yes.as_str());
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let email: String = row.try_get("email")?;

    let profile = Profile {
        name: PersonName {
            first_name: row.try_get("first_name")?,
            middle_name: row.try_get("middle_name")?,
            last_name: row.try_get("last_name")?,
        },
        phone_number: row.try_get("phone_number")?,
        email: Some(email.clone()),
        img: row.try_get("img")?,
        gender: row.try_get("gender")?,
        blood_group: row.try_get("blood_group")?,
        address: row.try_get("address")?,
        date_of_birth: row.try_get("date_of_birth")?,
    };

    let mut record = UserRecord::new(
        UserId(row.try_get("id")?),
        role,
        email,
        status,
        created_at,
    )
    .with_profile(profile);
    record.is_delete = is_delete;
    record.author = row.try_get("author")?;
    Ok(record)
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Role tag selecting which nested profile a [`UserRecord`] carries.
///
/// Tags this build does not know about decode as [`Role::Unknown`] instead of
/// failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Trainer,
    Seller,
    Student,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const KNOWN: [Role; 4] = [Role::Admin, Role::Trainer, Role::Seller, Role::Student];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Trainer => "trainer",
            Role::Seller => "seller",
            Role::Student => "student",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::KNOWN
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownVariant::new("role", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Deactivate,
    Blocked,
    /// Any status string this build does not know; never written back.
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    pub const KNOWN: [AccountStatus; 3] = [
        AccountStatus::Active,
        AccountStatus::Deactivate,
        AccountStatus::Blocked,
    ];

    pub fn is_known(self) -> bool {
        self != AccountStatus::Unknown
    }

    /// Target of the status toggle: active accounts get deactivated, every
    /// other state goes back to active.
    pub fn toggled(self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Deactivate,
            _ => AccountStatus::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Deactivate => "deactivate",
            AccountStatus::Blocked => "blocked",
            AccountStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AccountStatus::KNOWN
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownVariant::new("status", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: PersonName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Account row as the user API returns it. Only the nested profile named by
/// `role` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub email: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub is_delete: YesNo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<Profile>,
}

impl UserRecord {
    pub fn new(
        id: UserId,
        role: Role,
        email: impl Into<String>,
        status: AccountStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role,
            email: email.into(),
            status,
            is_delete: YesNo::No,
            author: None,
            created_at,
            admin: None,
            trainer: None,
            seller: None,
            student: None,
        }
    }

    /// Places `profile` in the slot named by the record's role. Records with
    /// an unknown role keep every slot empty.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        let slot = match self.role {
            Role::Admin => &mut self.admin,
            Role::Trainer => &mut self.trainer,
            Role::Seller => &mut self.seller,
            Role::Student => &mut self.student,
            Role::Unknown => return self,
        };
        *slot = Some(profile);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

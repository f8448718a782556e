use serde::{Deserialize, Serialize};

use crate::domain::{AccountStatus, PersonName, Profile, Role, UserRecord, YesNo};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query object the list endpoint accepts. `sortBy`/`sortOrder` are always on
/// the wire (empty when unsorted); `searchTerm` and the scope filters are
/// omitted when unset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default, with = "sort_order_wire")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_delete: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            page: 1,
            sort_by: String::new(),
            sort_order: None,
            search_term: None,
            is_delete: None,
            author: None,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_page() -> u32 {
    1
}

mod sort_order_wire {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::SortOrder;

    pub fn serialize<S: Serializer>(value: &Option<SortOrder>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value.map(SortOrder::as_str).unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<SortOrder>, D::Error> {
        let raw = String::deserialize(de)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "asc" | "ascend" => Ok(Some(SortOrder::Asc)),
            "desc" | "descend" => Ok(Some(SortOrder::Desc)),
            other => Err(D::Error::custom(format!("invalid sortOrder '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub data: Vec<UserRecord>,
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl NamePatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.middle_name.is_none() && self.last_name.is_none()
    }
}

/// Partial update for a user. Profile fields apply to the nested profile of
/// the record's role; `email` and `status` apply to the account itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NamePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl UserPatch {
    pub fn status(status: AccountStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.email.is_none()
            && self.name.as_ref().map_or(true, NamePatch::is_empty)
            && self.phone_number.is_none()
            && self.gender.is_none()
            && self.blood_group.is_none()
            && self.address.is_none()
            && self.date_of_birth.is_none()
            && self.img.is_none()
    }

    /// Applies the profile part of the patch to `profile`.
    pub fn apply_to_profile(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            if let Some(first) = &name.first_name {
                profile.name.first_name = first.clone();
            }
            if let Some(middle) = &name.middle_name {
                profile.name.middle_name = Some(middle.clone());
            }
            if let Some(last) = &name.last_name {
                profile.name.last_name = last.clone();
            }
        }
        let fields = [
            (&self.phone_number, &mut profile.phone_number),
            (&self.email, &mut profile.email),
            (&self.gender, &mut profile.gender),
            (&self.blood_group, &mut profile.blood_group),
            (&self.address, &mut profile.address),
            (&self.date_of_birth, &mut profile.date_of_birth),
            (&self.img, &mut profile.img),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }
    }
}

/// Envelope for write endpoints. `success: false` is an application-level
/// rejection carried on an otherwise successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<UserRecord>,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>, data: UserRecord) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub role: Role,
    pub email: String,
    pub name: PersonName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default = "default_new_user_status")]
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

fn default_new_user_status() -> AccountStatus {
    AccountStatus::Active
}

impl NewUser {
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            email: Some(self.email.clone()),
            img: self.img.clone(),
            ..Profile::default()
        }
    }
}

//! Role-dependent field access for user records.
//!
//! Every role keeps its profile under a key named after the role. This table
//! is the one place that knows the mapping; adding a role means adding a row.

use shared::domain::{Profile, Role, UserRecord};

pub const NOT_FOUND_IMAGE: &str = "/assets/not-found.png";

#[derive(Clone, Copy)]
pub struct RoleFields {
    pub role: Role,
    pub label: &'static str,
    profile_of: fn(&UserRecord) -> Option<&Profile>,
}

impl std::fmt::Debug for RoleFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleFields")
            .field("role", &self.role)
            .field("label", &self.label)
            .finish()
    }
}

impl RoleFields {
    pub fn profile_of<'a>(&self, record: &'a UserRecord) -> Option<&'a Profile> {
        (self.profile_of)(record)
    }

    pub fn name_of(&self, record: &UserRecord) -> String {
        self.profile_of(record)
            .map(|profile| {
                format!("{} {}", profile.name.first_name, profile.name.last_name)
                    .trim()
                    .to_string()
            })
            .unwrap_or_default()
    }

    pub fn contact_of(&self, record: &UserRecord) -> String {
        self.profile_of(record)
            .and_then(|profile| profile.phone_number.clone())
            .unwrap_or_default()
    }

    pub fn image_of<'a>(&self, record: &'a UserRecord) -> Option<&'a str> {
        self.profile_of(record)
            .and_then(|profile| profile.img.as_deref())
            .map(str::trim)
            .filter(|img| !img.is_empty() && *img != "undefined")
    }
}

fn admin_profile(record: &UserRecord) -> Option<&Profile> {
    record.admin.as_ref()
}

fn trainer_profile(record: &UserRecord) -> Option<&Profile> {
    record.trainer.as_ref()
}

fn seller_profile(record: &UserRecord) -> Option<&Profile> {
    record.seller.as_ref()
}

fn student_profile(record: &UserRecord) -> Option<&Profile> {
    record.student.as_ref()
}

static ROLE_FIELDS: [RoleFields; 4] = [
    RoleFields {
        role: Role::Admin,
        label: "Admin",
        profile_of: admin_profile,
    },
    RoleFields {
        role: Role::Trainer,
        label: "Trainer",
        profile_of: trainer_profile,
    },
    RoleFields {
        role: Role::Seller,
        label: "Seller",
        profile_of: seller_profile,
    },
    RoleFields {
        role: Role::Student,
        label: "Student",
        profile_of: student_profile,
    },
];

pub fn fields_for(role: Role) -> Option<&'static RoleFields> {
    ROLE_FIELDS.iter().find(|fields| fields.role == role)
}

pub fn profile(record: &UserRecord) -> Option<&Profile> {
    fields_for(record.role).and_then(|fields| fields.profile_of(record))
}

pub fn display_name(record: &UserRecord) -> String {
    fields_for(record.role)
        .map(|fields| fields.name_of(record))
        .unwrap_or_default()
}

pub fn contact(record: &UserRecord) -> String {
    fields_for(record.role)
        .map(|fields| fields.contact_of(record))
        .unwrap_or_default()
}

pub fn image(record: &UserRecord) -> &str {
    fields_for(record.role)
        .and_then(|fields| fields.image_of(record))
        .unwrap_or(NOT_FOUND_IMAGE)
}

pub fn role_label(role: Role) -> &'static str {
    fields_for(role).map(|fields| fields.label).unwrap_or("")
}

//! Profile edit form: defaults from an existing record, blank fields dropped
//! on submit. Account creation reports through the same outcome type.

use std::sync::Arc;

use shared::{
    domain::{UserId, UserRecord},
    protocol::{MutationResponse, NamePatch, NewUser, UserPatch},
};
use tracing::{info, warn};

use crate::{
    fields,
    ports::{Notifier, UserCreator, UserMutator},
};

pub const PROFILE_UPDATED_MESSAGE: &str = "Successfully updated profile";
pub const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile";
pub const USER_CREATED_MESSAGE: &str = "Successfully created user";
pub const USER_CREATE_FAILED_MESSAGE: &str = "Failed to create user";

/// Editable values as plain strings; an empty string means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub gender: String,
    pub blood_group: String,
    pub address: String,
    pub date_of_birth: String,
    pub img: String,
}

fn kept(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ProfileForm {
    pub fn from_record(record: &UserRecord) -> Self {
        let Some(profile) = fields::profile(record) else {
            return Self {
                email: record.email.clone(),
                ..Self::default()
            };
        };
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            first_name: profile.name.first_name.clone(),
            middle_name: text(&profile.name.middle_name),
            last_name: profile.name.last_name.clone(),
            email: profile
                .email
                .clone()
                .unwrap_or_else(|| record.email.clone()),
            phone_number: text(&profile.phone_number),
            gender: text(&profile.gender),
            blood_group: text(&profile.blood_group),
            address: text(&profile.address),
            date_of_birth: text(&profile.date_of_birth),
            img: text(&profile.img),
        }
    }

    pub fn into_patch(self) -> UserPatch {
        let name = NamePatch {
            first_name: kept(self.first_name),
            middle_name: kept(self.middle_name),
            last_name: kept(self.last_name),
        };
        UserPatch {
            status: None,
            email: kept(self.email),
            name: (!name.is_empty()).then_some(name),
            phone_number: kept(self.phone_number),
            gender: kept(self.gender),
            blood_group: kept(self.blood_group),
            address: kept(self.address),
            date_of_birth: kept(self.date_of_birth),
            img: kept(self.img),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The caller should clear the form.
    Saved { record: Option<UserRecord> },
    Failed(String),
}

impl SubmitOutcome {
    pub fn reset_form(&self) -> bool {
        matches!(self, SubmitOutcome::Saved { .. })
    }
}

pub struct ProfileEditor {
    mutator: Arc<dyn UserMutator>,
    notifier: Arc<dyn Notifier>,
}

impl ProfileEditor {
    pub fn new(mutator: Arc<dyn UserMutator>, notifier: Arc<dyn Notifier>) -> Self {
        Self { mutator, notifier }
    }

    pub async fn submit(&self, user_id: &UserId, form: ProfileForm) -> SubmitOutcome {
        let patch = form.into_patch();
        match self.mutator.update_user(user_id, &patch).await {
            Ok(response) if response.success => {
                info!(%user_id, "profile updated");
                self.notifier.success(PROFILE_UPDATED_MESSAGE);
                SubmitOutcome::Saved {
                    record: response.data,
                }
            }
            Ok(response) => {
                let message = rejection_message(response, PROFILE_UPDATE_FAILED_MESSAGE);
                warn!(%user_id, %message, "profile update rejected");
                self.notifier.error(&message);
                SubmitOutcome::Failed(message)
            }
            Err(error) => {
                warn!(%user_id, %error, "profile update failed");
                let message = error.to_string();
                self.notifier.error(&message);
                SubmitOutcome::Failed(message)
            }
        }
    }
}

fn rejection_message(response: MutationResponse, fallback: &str) -> String {
    response
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Registers new accounts and reports the result like the profile editor.
pub struct AccountCreator {
    creator: Arc<dyn UserCreator>,
    notifier: Arc<dyn Notifier>,
}

impl AccountCreator {
    pub fn new(creator: Arc<dyn UserCreator>, notifier: Arc<dyn Notifier>) -> Self {
        Self { creator, notifier }
    }

    pub async fn create(&self, new_user: NewUser) -> SubmitOutcome {
        let email = new_user.email.clone();
        match self.creator.create_user(&new_user).await {
            Ok(response) if response.success => {
                info!(%email, role = %new_user.role, "user created");
                self.notifier.success(USER_CREATED_MESSAGE);
                SubmitOutcome::Saved {
                    record: response.data,
                }
            }
            Ok(response) => {
                let message = rejection_message(response, USER_CREATE_FAILED_MESSAGE);
                warn!(%email, %message, "user creation rejected");
                self.notifier.error(&message);
                SubmitOutcome::Failed(message)
            }
            Err(error) => {
                warn!(%email, %error, "user creation failed");
                let message = error.to_string();
                self.notifier.error(&message);
                SubmitOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use chrono::Utc;
    use shared::{
        domain::{AccountStatus, PersonName, Profile, Role},
        protocol::MutationResponse,
    };
    use std::sync::Mutex;

    fn student() -> UserRecord {
        UserRecord::new(
            UserId::from("s-1"),
            Role::Student,
            "pupil@example.com",
            AccountStatus::Active,
            Utc::now(),
        )
        .with_profile(Profile {
            name: PersonName {
                first_name: "Nia".into(),
                middle_name: None,
                last_name: "Park".into(),
            },
            gender: Some("female".into()),
            ..Profile::default()
        })
    }

    #[test]
    fn form_defaults_fill_missing_fields_with_empty_strings() {
        let form = ProfileForm::from_record(&student());
        assert_eq!(form.first_name, "Nia");
        assert_eq!(form.middle_name, "");
        assert_eq!(form.email, "pupil@example.com");
        assert_eq!(form.gender, "female");
        assert_eq!(form.address, "");
    }

    #[test]
    fn record_without_profile_only_prefills_email() {
        let record = UserRecord::new(
            UserId::from("x"),
            Role::Unknown,
            "ghost@example.com",
            AccountStatus::Active,
            Utc::now(),
        );
        let form = ProfileForm::from_record(&record);
        assert_eq!(
            form,
            ProfileForm {
                email: "ghost@example.com".into(),
                ..ProfileForm::default()
            }
        );
    }

    #[test]
    fn blank_values_are_dropped_from_patch() {
        let form = ProfileForm {
            first_name: "  ".into(),
            last_name: "Park-Lee".into(),
            phone_number: " 0123 ".into(),
            ..ProfileForm::default()
        };
        let patch = form.into_patch();
        assert_eq!(
            patch.name,
            Some(NamePatch {
                first_name: None,
                middle_name: None,
                last_name: Some("Park-Lee".into()),
            })
        );
        assert_eq!(patch.phone_number.as_deref(), Some("0123"));
        assert_eq!(patch.email, None);
        assert_eq!(patch.status, None);
    }

    #[test]
    fn empty_form_produces_empty_patch() {
        assert!(ProfileForm::default().into_patch().is_empty());
    }

    struct Scripted {
        response: Option<MutationResponse>,
        patches: Mutex<Vec<UserPatch>>,
    }

    #[async_trait]
    impl UserMutator for Scripted {
        async fn update_user(
            &self,
            _user_id: &UserId,
            patch: &UserPatch,
        ) -> Result<MutationResponse, ClientError> {
            self.patches.lock().unwrap().push(patch.clone());
            self.response
                .clone()
                .ok_or_else(|| ClientError::Unavailable("offline".into()))
        }
    }

    #[derive(Default)]
    struct Messages(Mutex<Vec<(bool, String)>>);

    impl Notifier for Messages {
        fn success(&self, message: &str) {
            self.0.lock().unwrap().push((true, message.to_string()));
        }

        fn error(&self, message: &str) {
            self.0.lock().unwrap().push((false, message.to_string()));
        }
    }

    fn editor(response: Option<MutationResponse>) -> (ProfileEditor, Arc<Scripted>, Arc<Messages>) {
        let mutator = Arc::new(Scripted {
            response,
            patches: Mutex::new(Vec::new()),
        });
        let messages = Arc::new(Messages::default());
        (
            ProfileEditor::new(mutator.clone(), messages.clone()),
            mutator,
            messages,
        )
    }

    #[tokio::test]
    async fn successful_submit_notifies_and_resets() {
        let (editor, mutator, messages) =
            editor(Some(MutationResponse::ok("user updated", student())));
        let mut form = ProfileForm::from_record(&student());
        form.address = "12 Lake Road".into();

        let outcome = editor.submit(&UserId::from("s-1"), form).await;

        assert!(outcome.reset_form());
        assert_eq!(
            mutator.patches.lock().unwrap()[0].address.as_deref(),
            Some("12 Lake Road")
        );
        assert_eq!(
            *messages.0.lock().unwrap(),
            vec![(true, PROFILE_UPDATED_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn rejected_submit_reports_server_message() {
        let (editor, _, messages) = editor(Some(MutationResponse::rejected("nothing to update")));
        let outcome = editor
            .submit(&UserId::from("s-1"), ProfileForm::default())
            .await;
        assert_eq!(outcome, SubmitOutcome::Failed("nothing to update".into()));
        assert!(!outcome.reset_form());
        assert_eq!(
            *messages.0.lock().unwrap(),
            vec![(false, "nothing to update".to_string())]
        );
    }

    #[tokio::test]
    async fn transport_failure_reports_error_text() {
        let (editor, _, messages) = editor(None);
        let outcome = editor
            .submit(&UserId::from("s-1"), ProfileForm::default())
            .await;
        assert_eq!(outcome, SubmitOutcome::Failed("offline".into()));
        assert_eq!(messages.0.lock().unwrap().len(), 1);
    }

    struct Registrar {
        response: Result<MutationResponse, u16>,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UserCreator for Registrar {
        async fn create_user(&self, new_user: &NewUser) -> Result<MutationResponse, ClientError> {
            self.created.lock().unwrap().push(new_user.email.clone());
            self.response.clone().map_err(|status| {
                ClientError::http(status, "email pupil@example.com is already registered")
            })
        }
    }

    fn creator(
        response: Result<MutationResponse, u16>,
    ) -> (AccountCreator, Arc<Registrar>, Arc<Messages>) {
        let registrar = Arc::new(Registrar {
            response,
            created: Mutex::new(Vec::new()),
        });
        let messages = Arc::new(Messages::default());
        (
            AccountCreator::new(registrar.clone(), messages.clone()),
            registrar,
            messages,
        )
    }

    fn new_student() -> NewUser {
        NewUser {
            role: Role::Student,
            email: "pupil@example.com".into(),
            name: PersonName {
                first_name: "Nia".into(),
                middle_name: None,
                last_name: "Park".into(),
            },
            phone_number: None,
            author: Some("seller-1".into()),
            status: AccountStatus::Active,
            img: None,
        }
    }

    #[tokio::test]
    async fn created_account_is_announced() {
        let (creator, registrar, messages) =
            creator(Ok(MutationResponse::ok("user created", student())));

        let outcome = creator.create(new_student()).await;

        let SubmitOutcome::Saved { record: Some(record) } = &outcome else {
            panic!("expected saved record, got {outcome:?}");
        };
        assert_eq!(record.email, "pupil@example.com");
        assert!(outcome.reset_form());
        assert_eq!(*registrar.created.lock().unwrap(), vec!["pupil@example.com"]);
        assert_eq!(
            *messages.0.lock().unwrap(),
            vec![(true, USER_CREATED_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn refused_account_reports_server_message() {
        let (creator, _, messages) = creator(Err(400));
        let outcome = creator.create(new_student()).await;
        let expected = "email pupil@example.com is already registered";
        assert_eq!(outcome, SubmitOutcome::Failed(expected.into()));
        assert_eq!(*messages.0.lock().unwrap(), vec![(false, expected.to_string())]);
    }

    #[tokio::test]
    async fn in_band_rejection_without_message_uses_fallback() {
        let (creator, _, messages) = creator(Ok(MutationResponse {
            success: false,
            message: None,
            data: None,
        }));
        let outcome = creator.create(new_student()).await;
        assert_eq!(outcome, SubmitOutcome::Failed(USER_CREATE_FAILED_MESSAGE.into()));
        assert_eq!(messages.0.lock().unwrap().len(), 1);
    }
}

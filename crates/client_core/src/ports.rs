//! Collaborators the dashboard core talks to: the data layer, the
//! confirmation dialog, the notification surface and an enclosing modal.

use async_trait::async_trait;
use shared::{
    domain::{UserId, UserRecord},
    protocol::{MutationResponse, NewUser, UserListQuery, UserListResponse, UserPatch},
};

use crate::error::ClientError;

#[async_trait]
pub trait UserListSource: Send + Sync {
    async fn list_users(&self, query: &UserListQuery) -> Result<UserListResponse, ClientError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &UserId) -> Result<UserRecord, ClientError>;
}

#[async_trait]
pub trait UserMutator: Send + Sync {
    async fn update_user(
        &self,
        user_id: &UserId,
        patch: &UserPatch,
    ) -> Result<MutationResponse, ClientError>;
}

#[async_trait]
pub trait UserCreator: Send + Sync {
    async fn create_user(&self, new_user: &NewUser) -> Result<MutationResponse, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub is_confirmed: bool,
}

#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str, confirm_label: &str) -> Confirmation;
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait ModalHandle: Send + Sync {
    fn close(&self);
}

/// Stand-in for views rendered outside a modal.
pub struct NoModal;

impl ModalHandle for NoModal {
    fn close(&self) {}
}

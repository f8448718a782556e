//! Confirm-then-mutate flow that flips an account between active and
//! deactivated.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use shared::{
    domain::{AccountStatus, UserId, UserRecord},
    protocol::UserPatch,
};
use tracing::{info, warn};

use crate::ports::{ConfirmPrompt, ModalHandle, Notifier, UserMutator};

pub const CONFIRM_LABEL: &str = "Yes";
pub const SUCCESS_MESSAGE: &str = "Successfully updated account status";
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to update account status";

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Cancelled,
    /// A toggle for the same record is still in flight.
    Busy,
    /// Carries the server's copy of the record when it returned one.
    Updated {
        status: AccountStatus,
        record: Option<UserRecord>,
    },
    Failed(String),
}

pub fn confirmation_message(from: AccountStatus, to: AccountStatus) -> String {
    format!("Are you sure you want to change this account from {from} to {to}?")
}

pub struct StatusToggle {
    mutator: Arc<dyn UserMutator>,
    confirm: Arc<dyn ConfirmPrompt>,
    notifier: Arc<dyn Notifier>,
    modal: Arc<dyn ModalHandle>,
    pending: Mutex<HashSet<UserId>>,
}

struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<UserId>>,
    user_id: UserId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}

impl StatusToggle {
    pub fn new(
        mutator: Arc<dyn UserMutator>,
        confirm: Arc<dyn ConfirmPrompt>,
        notifier: Arc<dyn Notifier>,
        modal: Arc<dyn ModalHandle>,
    ) -> Self {
        Self {
            mutator,
            confirm,
            notifier,
            modal,
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_pending(&self, user_id: &UserId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(user_id)
    }

    fn claim(&self, user_id: &UserId) -> Option<PendingGuard<'_>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(user_id.clone()) {
            return None;
        }
        Some(PendingGuard {
            pending: &self.pending,
            user_id: user_id.clone(),
        })
    }

    pub async fn toggle(&self, record: &UserRecord) -> ToggleOutcome {
        let Some(_guard) = self.claim(&record.id) else {
            warn!(user_id = %record.id, "status change already in flight");
            return ToggleOutcome::Busy;
        };

        let from = record.status;
        let to = from.toggled();
        let answer = self
            .confirm
            .confirm(&confirmation_message(from, to), CONFIRM_LABEL)
            .await;
        if !answer.is_confirmed {
            return ToggleOutcome::Cancelled;
        }

        match self
            .mutator
            .update_user(&record.id, &UserPatch::status(to))
            .await
        {
            Ok(response) if response.success => {
                info!(user_id = %record.id, %from, %to, "account status updated");
                self.notifier.success(SUCCESS_MESSAGE);
                self.modal.close();
                ToggleOutcome::Updated {
                    status: to,
                    record: response.data,
                }
            }
            Ok(response) => {
                let message = response
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string());
                warn!(user_id = %record.id, %message, "status update rejected");
                self.notifier.error(&message);
                ToggleOutcome::Failed(message)
            }
            Err(error) => {
                let message = error.to_string();
                warn!(user_id = %record.id, %error, "status update failed");
                self.notifier.error(&message);
                ToggleOutcome::Failed(message)
            }
        }
    }
}

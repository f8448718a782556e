//! Dashboard core for user administration: the list-view controller, the
//! status toggle and profile edit flows, and the HTTP client they talk to.

pub mod api;
pub mod debounce;
pub mod edit;
pub mod error;
pub mod fields;
pub mod list_view;
pub mod ports;
pub mod status_toggle;

pub use api::UsersApi;
pub use edit::{AccountCreator, ProfileEditor, ProfileForm, SubmitOutcome};
pub use error::ClientError;
pub use list_view::{
    ListScope, ListViewConfig, ListViewController, SortDirection, SortSignal, UserRow,
};
pub use ports::{
    ConfirmPrompt, Confirmation, ModalHandle, Notifier, UserCreator, UserDirectory,
    UserListSource, UserMutator,
};
pub use status_toggle::{StatusToggle, ToggleOutcome};

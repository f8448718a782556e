//! Types shared by the user API server and its clients.

pub mod domain;
pub mod error;
pub mod protocol;

//! HTTP request handlers.
//!
//! - [`auth`]: Signup, login and logout
//! - [`devices`]: Device registration and listing for the signed-in user
//! - [`users`]: Admin user listing and deletion
//!
//! Handlers return [`crate::errors::Error`], which converts to a status code and a JSON
//! `{"message": ...}` body.

pub mod auth;
pub mod devices;
pub mod users;

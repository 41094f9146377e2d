//! API request and response data models.
//!
//! API models are distinct from database models. Responses never carry password hashes, and
//! device listings never carry pre-shared keys.
//!
//! - [`auth`]: Signup, login and logout bodies, including the session cookie
//! - [`users`]: User views and the authenticated [`users::CurrentUser`]
//! - [`devices`]: Device registration results and listings

pub mod auth;
pub mod devices;
pub mod users;

//! Authentication and authorization.
//!
//! Users authenticate with email and password at `/login` and receive a signed JWT in an
//! HTTP-only cookie. Every protected request resolves that cookie back to a live user row.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Session tokens and cookies
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use ribbit::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", current_user.email))
//! }
//! ```
//!
//! Admin-only routes take [`current_user::AdminUser`] instead; admins are the emails listed in
//! `auth.admin_emails`.

pub mod current_user;
pub mod password;
pub mod session;

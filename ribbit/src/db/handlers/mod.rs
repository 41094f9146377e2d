//! Repository implementations for PostgreSQL access.
//!
//! Each repository:
//! - Wraps a SQLx connection
//! - Provides strongly-typed operations for one table
//! - Returns domain models from [`crate::db::models`]
//!
//! ```ignore
//! use ribbit::db::handlers::Users;
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = Users::new(&mut conn);
//! let user = repo.get_user_by_email("user@example.com").await?;
//! ```

pub mod devices;
pub mod users;

pub use devices::Devices;
pub use users::Users;

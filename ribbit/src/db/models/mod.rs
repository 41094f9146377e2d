//! Database models.
//!
//! `*CreateDBRequest` types describe an insert and `*DBResponse` types a stored row. They are
//! shared by every [`Store`](crate::db::Store) implementation.

pub mod devices;
pub mod users;

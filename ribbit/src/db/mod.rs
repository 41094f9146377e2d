//! Database layer for data persistence and access.
//!
//! The rest of the application talks to a [`Store`], which is constructed once at startup and
//! handed down through the application state. Two implementations exist:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, device registrar)
//! └──────┬──────┘
//!        │  Arc<dyn Store>
//!        ↓
//! ┌─────────────┐        ┌──────────────┐
//! │PostgresStore│        │InMemoryStore │  (tests, --in-memory)
//! └──────┬──────┘        └──────────────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries per table)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! Every operation is a single auto-committing statement. Nothing here spans multiple
//! statements, which is why device registration cannot be atomic with the provider calls (see
//! [`crate::registration`]).
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and run on startup:
//!
//! ```ignore
//! ribbit::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;

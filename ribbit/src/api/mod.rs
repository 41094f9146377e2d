//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # Routes
//!
//! - **Authentication**: `POST /signup`, `POST /login`, `GET|POST /logout`
//! - **Devices** (session required): `POST /addDevice`, `GET /devices`
//! - **Provider check** (admin only): `POST /provider/verify`
//! - **Users** (admin only): `GET /users`, `DELETE /users/{email}`
//! - **Health**: `GET /healthz`

pub mod handlers;
pub mod models;

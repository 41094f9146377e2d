//! Common type definitions.
//!
//! - [`UserId`]: locally generated user identifier
//! - [`DeviceId`]: device identifier assigned by the provider
//! - [`abbrev_uuid`]: abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

pub type UserId = Uuid;

/// Provider-assigned; never generated locally.
pub type DeviceId = String;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

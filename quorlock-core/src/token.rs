//! Lock token generation.

use uuid::Uuid;

/// Produce a fresh, high-entropy token for one acquisition attempt.
///
/// Tokens are never reused across attempts; each draws 122 bits of
/// randomness from the OS, so token generation stays correct under
/// concurrent `acquire` calls from any number of coordinators.
pub(crate) fn generate() -> String {
    Uuid::new_v4().to_string()
}

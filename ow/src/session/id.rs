//! Temporary identifiers for optimistic creates.
//!
//! Entities created locally get an id under a reserved prefix until the
//! server confirms the create and hands back the real one. The prefix
//! must never appear in a request path or body; reconciliation swaps it
//! out before any follow-up write is scheduled.

use uuid::Uuid;

pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Mint a fresh temporary id. v7 keeps them roughly creation-ordered,
/// which makes logs easier to follow.
pub fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::now_v7())
}

/// Whether an id is still awaiting server confirmation.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_ids_are_unique_and_recognizable() {
        let a = temp_id();
        let b = temp_id();
        assert_ne!(a, b);
        assert!(is_temp_id(&a));
        assert!(is_temp_id(&b));
    }

    #[test]
    fn test_server_ids_are_not_temp() {
        assert!(!is_temp_id("st-42"));
        assert!(!is_temp_id(""));
        assert!(!is_temp_id("tmp"));
    }
}

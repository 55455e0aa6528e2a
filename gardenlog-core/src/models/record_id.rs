//! Record identifiers.
//!
//! Ids are the decimal form of a random 128-bit value. They keep the
//! all-digits shape of the clock-based ids already present in existing
//! sheets, but two records created in the same millisecond cannot collide.

use uuid::Uuid;

/// Generates a fresh record id: a string of digits parsing to a positive integer.
pub fn new_record_id() -> String {
    // v4 UUIDs always have version bits set, so the value is never zero.
    Uuid::new_v4().as_u128().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_is_positive_integer() {
        let id = new_record_id();
        let value: u128 = id.parse().unwrap();
        assert!(value > 0);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ids_do_not_collide_in_a_burst() {
        let ids: HashSet<String> = (0..1000).map(|_| new_record_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}

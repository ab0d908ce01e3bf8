//! Order number generation.

use chrono::Utc;
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a human-readable order number, e.g. `ORD-MDQ3K2F1-9A4C`.
///
/// Built from the current time in base36 plus a random suffix. Uniqueness
/// is ultimately enforced by the store's unique constraint on the order
/// number column.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!("ORD-{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

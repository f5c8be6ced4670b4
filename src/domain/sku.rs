//! Stock keeping unit codes.
//!
//! A SKU is `PRD-` followed by exactly eight decimal digits. Codes are drawn at
//! random; uniqueness is enforced by the store and a collision is resolved by
//! drawing again, up to [`MAX_SKU_ATTEMPTS`] times.

use uuid::Uuid;

pub const SKU_PREFIX: &str = "PRD-";
pub const SKU_DIGITS: usize = 8;
pub const MAX_SKU_ATTEMPTS: usize = 5;

const SKU_UPPER_BOUND: u32 = 100_000_000;

pub fn generate_sku() -> String {
    // The 128-bit draw makes the modulo bias negligible.
    let value = Uuid::new_v4().as_u128() % u128::from(SKU_UPPER_BOUND);
    format_sku(value as u32)
}

fn format_sku(value: u32) -> String {
    format!("{SKU_PREFIX}{value:0width$}", width = SKU_DIGITS)
}

pub fn is_valid_sku(candidate: &str) -> bool {
    match candidate.strip_prefix(SKU_PREFIX) {
        Some(digits) => digits.len() == SKU_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_sku_matches_pattern() {
        for _ in 0..64 {
            let sku = generate_sku();
            assert!(is_valid_sku(&sku), "unexpected sku `{sku}`");
        }
    }

    #[test]
    fn small_values_are_zero_padded() {
        assert_eq!(format_sku(42), "PRD-00000042");
        assert_eq!(format_sku(99_999_999), "PRD-99999999");
    }

    #[test]
    fn validation_rejects_malformed_codes() {
        assert!(!is_valid_sku("PRD--1234567"));
        assert!(!is_valid_sku("PRD-1234567"));
        assert!(!is_valid_sku("SKU-12345678"));
        assert!(!is_valid_sku("PRD-1234567a"));
    }
}

//! Product identifiers.
//!
//! Ids are 24 lowercase hex characters: four bytes of big-endian Unix seconds
//! followed by eight random bytes. The leading timestamp keeps freshly created
//! ids roughly ordered by creation time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

pub const PRODUCT_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    pub fn generate() -> Self {
        Self::generate_at(OffsetDateTime::now_utc())
    }

    pub fn generate_at(now: OffsetDateTime) -> Self {
        let seconds = u32::try_from(now.unix_timestamp()).unwrap_or(u32::MAX);
        let mut raw = [0_u8; 12];
        raw[..4].copy_from_slice(&seconds.to_be_bytes());
        raw[4..].copy_from_slice(&Uuid::new_v4().as_bytes()[8..]);
        Self(hex::encode(raw))
    }

    /// Accepts upper- or lowercase hex and normalizes to lowercase.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.len() != PRODUCT_ID_LEN {
            return Err(DomainError::invalid_id(value, "must be 24 characters"));
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DomainError::invalid_id(
                value,
                "must contain only hexadecimal digits",
            ));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ProductId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let first = ProductId::generate();
        let second = ProductId::generate();
        assert_eq!(first.as_str().len(), PRODUCT_ID_LEN);
        assert!(ProductId::parse(first.as_str()).is_ok());
        assert_ne!(first, second);
    }

    #[test]
    fn timestamp_prefix_is_big_endian_seconds() {
        let id = ProductId::generate_at(datetime!(2024-01-01 0:00 UTC));
        assert_eq!(&id.as_str()[..8], "65920080");
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(matches!(
            ProductId::parse("abc"),
            Err(DomainError::InvalidId { .. })
        ));
        assert!(matches!(
            ProductId::parse("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(DomainError::InvalidId { .. })
        ));
    }

    #[test]
    fn parse_normalizes_case() {
        let id = ProductId::parse("65920080ABCDEF0123456789").expect("valid id");
        assert_eq!(id.as_str(), "65920080abcdef0123456789");
    }
}

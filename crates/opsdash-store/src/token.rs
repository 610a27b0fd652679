//! Optimistic concurrency tokens
//!
//! Provides [`VersionToken`], a 32-byte Blake3 digest of the raw value stored
//! under a key. Two readers holding equal tokens saw byte-identical values.

use std::fmt::{self, Display, Formatter};

/// Version of a stored value (Blake3 of the raw string)
///
/// The all-zero token stands for "no value stored under this key".
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionToken([u8; 32]);

impl VersionToken {
    /// Create token from raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Token for a key with no stored value
    #[inline]
    #[must_use]
    pub const fn absent() -> Self {
        Self([0; 32])
    }

    /// Token for a value read from the store
    #[inline]
    #[must_use]
    pub fn of(value: Option<&str>) -> Self {
        match value {
            Some(raw) => Self::new(*blake3::hash(raw.as_bytes()).as_bytes()),
            None => Self::absent(),
        }
    }

    /// Reference to the digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether this is the "absent" token
    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        let mut i = 0;
        while i < 32 {
            if self.0[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_of_absent_is_zero() {
        let token = VersionToken::of(None);
        assert!(token.is_absent());
        assert_eq!(token, VersionToken::default());
    }

    #[test]
    fn token_is_deterministic() {
        let a = VersionToken::of(Some("[1,2,3]"));
        let b = VersionToken::of(Some("[1,2,3]"));
        assert_eq!(a, b);
        assert!(!a.is_absent());
    }

    #[test]
    fn token_sensitive_to_content() {
        let a = VersionToken::of(Some("[]"));
        let b = VersionToken::of(Some("[ ]"));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_value_differs_from_absent() {
        assert_ne!(VersionToken::of(Some("")), VersionToken::absent());
    }

    #[test]
    fn display_is_full_hex() {
        let token = VersionToken::of(Some("value"));
        assert_eq!(token.to_string().len(), 64);
        assert!(token.to_string().starts_with(&token.short()));
    }
}

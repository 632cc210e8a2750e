//! FNV-1a hashing of region contents.
//!
//! Used to compare value-stack prefixes cheaply, e.g. to check that every
//! sibling branch starts from the same state. Not cryptographically
//! secure.

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Hash a byte slice with 64-bit FNV-1a.
///
/// Returns `FNV_OFFSET` for an empty slice.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv1a(&[]), FNV_OFFSET);
    }

    #[test]
    fn known_vector() {
        // Reference value for "a" from the FNV test suite.
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn order_matters() {
        assert_ne!(fnv1a(&[1, 2]), fnv1a(&[2, 1]));
    }
}

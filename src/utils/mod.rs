pub mod url_validator;

pub use url_validator::{normalize_url, validate_url};

/// Base62 alphabet shared by every code generator
pub const BASE62: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Encode `value` in base62, left-padded with the zero digit to `width`
///
/// Values wider than `width` keep only the low-order `width` digits.
pub fn encode_base62(mut value: u64, width: usize) -> String {
    let mut digits = vec![BASE62[0]; width];
    for slot in digits.iter_mut().rev() {
        *slot = BASE62[(value % 62) as usize];
        value /= 62;
    }
    // BASE62 is pure ASCII
    digits.into_iter().map(char::from).collect()
}

/// Custom alias syntax: 1..=max_len characters of `[A-Za-z0-9_-]`
pub fn is_valid_short_code(code: &str, max_len: usize) -> bool {
    !code.is_empty()
        && code.len() <= max_len
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_base62_width() {
        assert_eq!(encode_base62(0, 6), "AAAAAA");
        assert_eq!(encode_base62(1, 6), "AAAAAB");
        assert_eq!(encode_base62(61, 3), "AA9");
        assert_eq!(encode_base62(62, 3), "ABA");
        assert_eq!(encode_base62(u64::MAX, 4).len(), 4);
        assert_eq!(encode_base62(5, 0), "");
    }

    #[test]
    fn test_valid_short_codes() {
        assert!(is_valid_short_code("abc", 64));
        assert!(is_valid_short_code("my-link_2", 64));
        assert!(is_valid_short_code("A", 1));
    }

    #[test]
    fn test_invalid_short_codes() {
        assert!(!is_valid_short_code("", 64));
        assert!(!is_valid_short_code("has space", 64));
        assert!(!is_valid_short_code("slash/inside", 64));
        assert!(!is_valid_short_code("ünicode", 64));
        assert!(!is_valid_short_code("toolong", 3));
    }
}

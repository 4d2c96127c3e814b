//! ROT13 over ASCII letters.

/// Rotate every ASCII letter by 13 positions, preserving case.
///
/// Non-letters (including every non-ASCII byte) pass through untouched.
/// Applying the rotation twice restores the input, so encode and decode call
/// this same function.
pub fn rotate13(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| match b {
            b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
            b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_letters_only() {
        assert_eq!(rotate13(b"Hello, World! 123"), b"Uryyb, Jbeyq! 123");
    }

    #[test]
    fn is_self_inverse() {
        let input = b"https://Example.com/Path?q=Zz";
        assert_eq!(rotate13(&rotate13(input)), input);
    }

    #[test]
    fn leaves_multibyte_utf8_intact() {
        let input = "caf\u{e9}".as_bytes();
        assert_eq!(rotate13(input), "pns\u{e9}".as_bytes());
    }
}

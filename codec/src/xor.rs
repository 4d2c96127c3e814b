//! Repeating-key XOR stream.

/// Key cycled over the input by V2 and V3.
pub const XOR_KEY: &[u8] = b"codewalt2026";

/// XOR every byte of `bytes` with `key`, cycling the key byte-for-byte.
///
/// XOR is its own inverse, so the same call encodes and decodes. An empty key
/// leaves the input unchanged.
pub fn xor_stream(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return bytes.to_vec();
    }
    bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

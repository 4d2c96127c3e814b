//! The V4 scramble layers.
//!
//! V4 stacks four layers. Encoding runs them in order:
//!
//! 1. Caesar-shift each printable ASCII byte (32..=126, modulo 95) by
//!    `BASE_SHIFT + len % 10`, where `len` is the byte length of the input;
//! 2. reverse the byte sequence;
//! 3. permute each full 4-byte block with [`BLOCK_PATTERN`];
//! 4. base64url (in [`crate::version`]).
//!
//! Decoding runs the exact reverse order 4 → 3 → 2 → 1. The shift used by
//! layer 1 is not stored anywhere: it is recomputed from the length of the
//! bytes that reach the final decode step. Layers 2 and 3 preserve length, so
//! that length equals the original input length and the recomputed shift
//! matches the one used while encoding. Anything that changes the length
//! before layer 1 is undone (trimming, padding, partial decodes) silently
//! produces garbage.

/// Constant part of the Caesar shift.
pub const BASE_SHIFT: u8 = 7;

/// Output position `i` of a shuffled block takes input byte `BLOCK_PATTERN[i]`.
pub const BLOCK_PATTERN: [usize; 4] = [2, 0, 3, 1];

const PRINTABLE_START: u8 = 32;
const PRINTABLE_END: u8 = 126;
const PRINTABLE_SPAN: u8 = PRINTABLE_END - PRINTABLE_START + 1;

/// Shift applied to an input of `len` bytes. Always below 95.
pub fn shift_for_len(len: usize) -> u8 {
    BASE_SHIFT + (len % 10) as u8
}

fn rotate_printable(bytes: &[u8], shift: u8) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| {
            if (PRINTABLE_START..=PRINTABLE_END).contains(&b) {
                (b - PRINTABLE_START + shift) % PRINTABLE_SPAN + PRINTABLE_START
            } else {
                b
            }
        })
        .collect()
}

/// Layer 1 forward: shift printable bytes by the length-keyed amount.
pub fn caesar_shift(bytes: &[u8]) -> Vec<u8> {
    rotate_printable(bytes, shift_for_len(bytes.len()))
}

/// Layer 1 inverse. `bytes` must already have layers 2 and 3 undone so its
/// length equals the original input length.
pub fn caesar_unshift(bytes: &[u8]) -> Vec<u8> {
    let shift = shift_for_len(bytes.len());
    rotate_printable(bytes, PRINTABLE_SPAN - shift)
}

/// Layer 2 (self-inverse): reverse the byte order.
pub fn reverse(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Layer 3 forward: permute every full 4-byte block. A trailing block of
/// fewer than four bytes is left as-is.
pub fn shuffle_blocks(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for (dst, src) in out.chunks_exact_mut(4).zip(bytes.chunks_exact(4)) {
        for (i, &from) in BLOCK_PATTERN.iter().enumerate() {
            dst[i] = src[from];
        }
    }
    out
}

/// Layer 3 inverse.
pub fn unshuffle_blocks(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for (dst, src) in out.chunks_exact_mut(4).zip(bytes.chunks_exact(4)) {
        for (i, &to) in BLOCK_PATTERN.iter().enumerate() {
            dst[to] = src[i];
        }
    }
    out
}

/// Layers 1–3 forward.
pub fn scramble(bytes: &[u8]) -> Vec<u8> {
    shuffle_blocks(&reverse(&caesar_shift(bytes)))
}

/// Layers 3–1 inverse, strictly in reverse order.
pub fn unscramble(bytes: &[u8]) -> Vec<u8> {
    caesar_unshift(&reverse(&unshuffle_blocks(bytes)))
}

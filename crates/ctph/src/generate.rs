//! Digest generation: a single-pass rolling scan per block size candidate.

use crate::config::{CtphConfig, CtphError};
use crate::signature::{FuzzyHash, BASE64_ALPHABET, MIN_BLOCK_SIZE, SIGNATURE_LENGTH};
use crate::ROLLING_WINDOW;

const HASH_INIT: u32 = 0x2802_1967;
const HASH_PRIME: u32 = 0x0100_0193;

/// Rolling checksum over the last [`ROLLING_WINDOW`] bytes.
///
/// Three mixing components are kept separately and summed on demand. `h1`
/// is the plain byte sum over the window, `h2` weights each byte by its
/// distance from the window end, and `h3` is a shift-xor mix that reacts
/// to byte order. All arithmetic wraps.
struct RollingHash {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    pos: usize,
}

impl RollingHash {
    fn new() -> Self {
        Self {
            window: [0; ROLLING_WINDOW],
            h1: 0,
            h2: 0,
            h3: 0,
            pos: 0,
        }
    }

    fn update(&mut self, byte: u8) {
        let b = u32::from(byte);
        self.h2 = self.h2.wrapping_sub(self.h1);
        self.h2 = self
            .h2
            .wrapping_add((ROLLING_WINDOW as u32).wrapping_mul(b));
        self.h1 = self.h1.wrapping_add(b);
        self.h1 = self
            .h1
            .wrapping_sub(u32::from(self.window[self.pos % ROLLING_WINDOW]));
        self.window[self.pos % ROLLING_WINDOW] = byte;
        self.pos += 1;
        self.h3 = (self.h3 << 5) ^ b;
    }

    fn sum(&self) -> u32 {
        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

/// FNV-style hash of the current segment, reset at each trigger point.
struct SegmentHash(u32);

impl SegmentHash {
    fn new() -> Self {
        Self(HASH_INIT)
    }

    fn update(&mut self, byte: u8) {
        self.0 = self.0.wrapping_mul(HASH_PRIME) ^ u32::from(byte);
    }

    fn b64_char(&self) -> char {
        BASE64_ALPHABET[(self.0 % 64) as usize] as char
    }
}

/// Smallest block size of the form `3 * 2^i` whose full-length signature
/// could cover the input.
///
/// Capped so the block size always fits a `u32`.
fn initial_block_size(len: usize) -> u32 {
    let mut bs = u64::from(MIN_BLOCK_SIZE);
    while bs * (SIGNATURE_LENGTH as u64) < len as u64 && bs < (1 << 31) {
        bs *= 2;
    }
    bs as u32
}

/// One pass over the input at a fixed block size.
///
/// Emits one base64 character per triggered segment into the primary
/// signature, and one per double-sized segment into the secondary. The
/// trailing segment, if any bytes were consumed, contributes one final
/// character to each.
fn scan(data: &[u8], block_size: u32) -> (String, String) {
    let mut roll = RollingHash::new();
    let mut seg = SegmentHash::new();
    let mut seg_double = SegmentHash::new();
    let mut sig = String::with_capacity(SIGNATURE_LENGTH);
    let mut sig_double = String::with_capacity(SIGNATURE_LENGTH / 2);

    // Moduli are taken in u64: `bs * 2` must not wrap for the largest
    // block sizes.
    let bs = u64::from(block_size);

    for &byte in data {
        roll.update(byte);
        seg.update(byte);
        seg_double.update(byte);

        let sum = u64::from(roll.sum());
        if sum % bs == bs - 1 {
            if sig.len() < SIGNATURE_LENGTH - 1 {
                sig.push(seg.b64_char());
                seg = SegmentHash::new();
            }
            if sum % (bs * 2) == bs * 2 - 1 && sig_double.len() < SIGNATURE_LENGTH / 2 - 1 {
                sig_double.push(seg_double.b64_char());
                seg_double = SegmentHash::new();
            }
        }
    }

    if roll.sum() != 0 {
        sig.push(seg.b64_char());
        sig_double.push(seg_double.b64_char());
    }

    (sig, sig_double)
}

/// Computes the fuzzy digest of `data`.
///
/// Starts from the block size estimate for the input length and halves it
/// until the primary signature is long enough to discriminate, or the
/// minimum block size is reached. Inputs shorter than
/// [`CtphConfig::min_input_bytes`] are rejected.
pub fn digest(data: &[u8], config: &CtphConfig) -> Result<FuzzyHash, CtphError> {
    config.validate()?;
    if data.len() < config.min_input_bytes {
        return Err(CtphError::InputTooSmall {
            len: data.len(),
            min: config.min_input_bytes,
        });
    }

    let mut block_size = initial_block_size(data.len());
    loop {
        let (sig, sig_double) = scan(data, block_size);
        if block_size > MIN_BLOCK_SIZE && sig.len() < SIGNATURE_LENGTH / 2 {
            block_size /= 2;
            continue;
        }
        return Ok(FuzzyHash::new(block_size, sig, sig_double));
    }
}

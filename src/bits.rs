//! Leading-zero-bit difficulty checks.

/// Number of zero bits before the first set bit of `byte`, 8 for zero.
#[inline]
pub fn leading_zero_bits(byte: u8) -> u32 {
    byte.leading_zeros()
}

/// Whether `digest` starts with at least `required` zero bits.
///
/// A requirement longer than the digest can never be met and yields `false`.
pub fn satisfies(digest: &[u8], required: u32) -> bool {
    let mut remaining = required;
    for &byte in digest {
        if remaining == 0 {
            return true;
        }
        if remaining >= 8 {
            if byte != 0 {
                return false;
            }
            remaining -= 8;
        } else {
            return leading_zero_bits(byte) >= remaining;
        }
    }
    remaining == 0
}

/// Total leading zero bits across the whole digest.
pub fn leading_zero_bits_total(digest: &[u8]) -> u32 {
    let mut count = 0u32;
    for &byte in digest {
        if byte == 0 {
            count += 8;
            continue;
        }
        count += leading_zero_bits(byte);
        break;
    }
    count
}

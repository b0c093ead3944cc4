//! Unbounded little-endian nonce counter.

/// A non-negative integer of unbounded width, stored least-significant byte first.
///
/// Starts as a single zero byte and grows by one byte whenever an increment
/// carries out of the most significant byte, so the search space never wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigCounter {
    bytes: Vec<u8>,
}

impl BigCounter {
    /// The zero counter (`[0x00]`).
    pub fn new() -> Self {
        Self { bytes: vec![0] }
    }

    /// Restore a counter from its little-endian bytes. Empty input yields zero.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::new();
        }
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Add one, growing the counter on full carry-out.
    pub fn increment(&mut self) {
        for byte in self.bytes.iter_mut() {
            if *byte == u8::MAX {
                *byte = 0;
            } else {
                *byte += 1;
                return;
            }
        }
        self.bytes.push(1);
    }

    /// Add `n` by repeated increments. Used to stride workers across disjoint ranges.
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.increment();
        }
    }

    /// The raw little-endian bytes, exactly as hashed and transmitted.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for BigCounter {
    fn default() -> Self {
        Self::new()
    }
}

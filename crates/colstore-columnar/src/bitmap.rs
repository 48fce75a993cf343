#![forbid(unsafe_code)]

/// A fixed-length bit vector used as a row selection mask.
///
/// Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 63 is the MSB of word 0
///
/// Bits past `len` in the last word are always zero, so word-level operations
/// can count ones without re-masking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

fn word_count(bits: usize) -> usize {
    (bits + 63) / 64
}

fn tail_mask(bits: usize) -> u64 {
    match bits % 64 {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

impl BitVec {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        if bits == 0 {
            return Self::new();
        }

        let mut words = vec![u64::MAX; word_count(bits)];
        if let Some(last) = words.last_mut() {
            *last = tail_mask(bits);
        }

        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }

        if value {
            let word = self.len / 64;
            self.words[word] |= 1u64 << bit;
            self.ones += 1;
        }

        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = self.words[index / 64];
        ((word >> (index % 64)) & 1) == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = &mut self.words[index / 64];
        let mask = 1u64 << (index % 64);
        let was_set = (*word & mask) != 0;

        match (was_set, value) {
            (true, false) => {
                *word &= !mask;
                self.ones -= 1;
            }
            (false, true) => {
                *word |= mask;
                self.ones += 1;
            }
            _ => {}
        }
    }

    /// Number of set bits. O(1).
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    /// Set every bit back to one without reallocating.
    pub fn fill(&mut self) {
        if self.len == 0 {
            return;
        }
        for w in &mut self.words {
            *w = u64::MAX;
        }
        if let Some(last) = self.words.last_mut() {
            *last = tail_mask(self.len);
        }
        self.ones = self.len;
    }

    /// Clear every set bit whose index fails `keep`.
    ///
    /// Only rows that are currently selected are visited, so narrowing an already
    /// sparse mask costs proportionally less than a full pass.
    pub fn retain(&mut self, mut keep: impl FnMut(usize) -> bool) {
        for word_idx in 0..self.words.len() {
            let mut word = self.words[word_idx];
            let mut remaining = word;
            while remaining != 0 {
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                if !keep(word_idx * 64 + bit) {
                    word &= !(1u64 << bit);
                    self.ones -= 1;
                }
            }
            self.words[word_idx] = word;
        }
    }

    /// Iterate over the indices of set bits in ascending order.
    pub fn iter_ones(&self) -> IterOnes<'_> {
        IterOnes {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IterOnes<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for IterOnes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

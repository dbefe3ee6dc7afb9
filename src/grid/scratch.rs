//! Dense per-cell scratch structures for the search algorithms.
//!
//! All three are sized once to the grid's cell count and indexed by the
//! row-major cell index, so memory stays O(1) per cell at any scale.

use super::direction::Direction;

/// One byte per cell: the wall bit of the direction toward the parent.
/// Zero means "no parent" (roots and unreached cells).
#[derive(Clone, Debug)]
pub struct ParentMap {
    links: Vec<u8>,
}

impl ParentMap {
    pub fn new(len: usize) -> Self {
        Self {
            links: vec![0; len],
        }
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<Direction> {
        Direction::from_wall_bit(self.links[idx])
    }

    #[inline(always)]
    pub fn set(&mut self, idx: usize, toward_parent: Direction) {
        self.links[idx] = toward_parent.wall_bit();
    }

    #[inline(always)]
    pub fn has_parent(&self, idx: usize) -> bool {
        self.links[idx] != 0
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// One `i32` per cell, `-1` meaning unreached.
#[derive(Clone, Debug)]
pub struct DistanceMap {
    dist: Vec<i32>,
}

impl DistanceMap {
    pub const UNREACHED: i32 = -1;

    pub fn new(len: usize) -> Self {
        Self {
            dist: vec![Self::UNREACHED; len],
        }
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<u32> {
        let d = self.dist[idx];
        (d >= 0).then_some(d as u32)
    }

    #[inline(always)]
    pub fn set(&mut self, idx: usize, dist: u32) {
        self.dist[idx] = dist.min(i32::MAX as u32) as i32;
    }

    #[inline(always)]
    pub fn set_unreached(&mut self, idx: usize) {
        self.dist[idx] = Self::UNREACHED;
    }

    /// Store `dist` if it beats the current value. Returns whether it did.
    #[inline(always)]
    pub fn relax(&mut self, idx: usize, dist: u32) -> bool {
        match self.get(idx) {
            Some(old) if old <= dist => false,
            _ => {
                self.set(idx, dist);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.dist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dist.is_empty()
    }
}

/// Packed membership bitmap, one bit per cell.
#[derive(Clone, Debug)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    #[inline(always)]
    pub fn contains(&self, idx: usize) -> bool {
        (self.words[idx >> 6] >> (idx & 63)) & 1 != 0
    }

    #[inline(always)]
    pub fn insert(&mut self, idx: usize) {
        self.words[idx >> 6] |= 1u64 << (idx & 63);
    }

    /// Set the bit and report whether it was already set.
    #[inline(always)]
    pub fn test_and_set(&mut self, idx: usize) -> bool {
        let word = idx >> 6;
        let bit = 1u64 << (idx & 63);
        let old = self.words[word];
        self.words[word] = old | bit;
        (old & bit) != 0
    }

    #[inline(always)]
    pub fn remove(&mut self, idx: usize) {
        self.words[idx >> 6] &= !(1u64 << (idx & 63));
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Capacity in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

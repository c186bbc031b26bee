//! Scripted `DeterministicRng` implementations.

use initiative_core::rng::DeterministicRng;

/// Always rolls the lowest value: a natural 1 and a zero tie-break offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// Hands out a fixed list of values in order, ignoring the requested range
/// so tests can also feed out-of-range values. A player roll consumes one
/// value (the d20); every other category consumes two (d20, then offset).
///
/// Panics once the list is exhausted.
#[derive(Debug, Clone)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Creates a sequence over `values`.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }

    /// Values not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len() - self.index
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let Some(value) = self.values.get(self.index).copied() else {
            panic!("SequenceRng exhausted after {} values", self.values.len());
        };
        self.index += 1;
        value
    }
}

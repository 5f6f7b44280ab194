use std::ops::Index;

/// Precomputed mapping from the flat addresses of one factor to the addresses of a
/// compatible factor with a subset of its dimensions.
///
/// The table only depends on the two dimension layouts, so it stays valid across
/// evidence changes and can be shared read-only between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    positions: Vec<usize>,
    foreign_len: usize, // table length of the factor the positions point into
}

impl Alignment {
    pub(crate) fn new(positions: Vec<usize>, foreign_len: usize) -> Self {
        Alignment {
            positions,
            foreign_len,
        }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn foreign_len(&self) -> usize {
        self.foreign_len
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Index<usize> for Alignment {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.positions[index]
    }
}

//! Evidence-restricted traversal of a flat table.
//!
//! A [`Cut`] decomposes the addresses that are consistent with a set of evidence
//! clamps into nested strided runs. Operations visit only these addresses, with a
//! plain strided range in the innermost loop.

use std::ops::Range;

use super::address_calc;

/// One level of the nested decomposition.
///
/// A leaf visits `index + offset`, `index + offset + step_size`, ... below
/// `index + offset + length`. An inner node instantiates its `sub_cut` at offsets
/// `index + offset + k * subtree_step_size` below `index + offset + length`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cut {
    index: usize,
    length: usize,
    step_size: usize,
    subtree_step_size: usize,
    sub_cut: Option<Box<Cut>>,
}

impl Cut {
    /// Builds the cut for a table with `dimension_sizes` under `selections`
    /// (`None` for an unconstrained dimension, `Some(value)` for a clamp).
    pub fn new(dimension_sizes: &[usize], selections: &[Option<usize>]) -> Self {
        debug_assert_eq!(dimension_sizes.len(), selections.len());
        let strides = address_calc::strides(dimension_sizes);

        // trailing unconstrained dimensions form one contiguous block
        let suffix_start = selections
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |dim| dim + 1);
        let block_len: usize = dimension_sizes[suffix_start..].iter().product();

        // (offset, span, step) for every group of consecutive unconstrained dimensions
        let mut levels = Vec::new();
        let mut offset = 0;
        let mut dim = 0;
        while dim < suffix_start {
            match selections[dim] {
                Some(value) => offset += value * strides[dim],
                None => {
                    let span = dimension_sizes[dim] * strides[dim];
                    while selections[dim + 1].is_none() {
                        dim += 1;
                    }
                    levels.push((offset, span, strides[dim]));
                    offset = 0;
                }
            }
            dim += 1;
        }

        let leaf = match levels.pop() {
            // nothing contiguous left, the innermost level becomes a strided leaf
            Some((level_offset, span, step)) if block_len == 1 => {
                Cut::leaf(level_offset + offset, span, step)
            }
            Some(level) => {
                levels.push(level);
                Cut::leaf(offset, block_len, 1)
            }
            None => Cut::leaf(offset, block_len, 1),
        };

        levels
            .into_iter()
            .rev()
            .fold(leaf, |sub_cut, (offset, span, step)| Cut {
                index: offset,
                length: span,
                step_size: 1,
                subtree_step_size: step,
                sub_cut: Some(Box::new(sub_cut)),
            })
    }

    fn leaf(index: usize, length: usize, step_size: usize) -> Self {
        Cut {
            index,
            length,
            step_size,
            subtree_step_size: 0,
            sub_cut: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn subtree_step_size(&self) -> usize {
        self.subtree_step_size
    }

    pub fn sub_cut(&self) -> Option<&Cut> {
        self.sub_cut.as_deref()
    }

    // Outermost address range; every visited address lies inside it
    pub fn span(&self) -> Range<usize> {
        self.index..self.index + self.length
    }

    /// Number of addresses visited by a traversal.
    pub fn len(&self) -> usize {
        match &self.sub_cut {
            None => self.length.div_ceil(self.step_size),
            Some(sub_cut) => self.length.div_ceil(self.subtree_step_size) * sub_cut.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `visit` for every address of the cut, in ascending order.
    pub fn for_each<F: FnMut(usize)>(&self, mut visit: F) {
        self.traverse(0, &mut visit);
    }

    fn traverse<F: FnMut(usize)>(&self, offset: usize, visit: &mut F) {
        let start = self.index + offset;
        let run = start..start + self.length;
        match &self.sub_cut {
            None => run.step_by(self.step_size).for_each(|address| visit(address)),
            Some(sub_cut) => {
                for sub_offset in run.step_by(self.subtree_step_size) {
                    sub_cut.traverse(sub_offset, visit);
                }
            }
        }
    }

    pub fn addresses(&self) -> Vec<usize> {
        let mut addresses = Vec::with_capacity(self.len());
        self.for_each(|address| addresses.push(address));
        addresses
    }
}

impl Default for Cut {
    // the cut of the scalar factor
    fn default() -> Self {
        Cut::leaf(0, 1, 1)
    }
}

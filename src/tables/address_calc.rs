//! Address arithmetic for row-major tables indexed by discrete variables.

use std::collections::HashMap;

pub type VariableId = usize;

// Computes the row-major stride of every dimension (the last dimension has stride 1)
pub fn strides(dimension_sizes: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dimension_sizes.len()];
    for dim in (0..dimension_sizes.len().saturating_sub(1)).rev() {
        strides[dim] = strides[dim + 1] * dimension_sizes[dim + 1];
    }
    strides
}

/// Flat address of `coords` in a row-major table with the given dimension sizes.
pub fn flatten(coords: &[usize], dimension_sizes: &[usize]) -> usize {
    debug_assert_eq!(coords.len(), dimension_sizes.len());
    coords
        .iter()
        .zip(dimension_sizes)
        .fold(0, |address, (&coord, &size)| address * size + coord)
}

/// Coordinates of a flat address, inverse of [`flatten`] for addresses inside the table.
pub fn unflatten(mut address: usize, dimension_sizes: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; dimension_sizes.len()];
    for (coord, &size) in coords.iter_mut().zip(dimension_sizes).rev() {
        *coord = address % size;
        address /= size;
    }
    coords
}

/// Advances `counter` to the next coordinate combination in row-major order,
/// starting at `start_dim` and carrying towards dimension 0.
///
/// Enumerating from all zeros visits combinations in the same order as their flat
/// addresses. The successor of the last combination is all zeros again.
pub fn increment_counter(counter: &mut [usize], dimension_sizes: &[usize], start_dim: usize) {
    debug_assert_eq!(counter.len(), dimension_sizes.len());
    let mut dim = start_dim;
    loop {
        if counter[dim] + 1 < dimension_sizes[dim] {
            // "Advance" to next label
            counter[dim] += 1;
            return;
        }
        // "Carry over" to initial label
        counter[dim] = 0;
        if dim == 0 {
            return;
        }
        dim -= 1;
    }
}

// Maps every variable of a factor to the position of its dimension
pub fn id_to_dimension_index(dimension_ids: &[VariableId]) -> HashMap<VariableId, usize> {
    dimension_ids
        .iter()
        .enumerate()
        .map(|(dim, &id)| (id, dim))
        .collect()
}

/// Flat address in a foreign layout of a coordinate given in local dimension order.
///
/// Local dimensions whose variable is absent from `foreign_mapping` are ignored.
/// A zero-dimensional foreign factor always maps to address 0.
pub fn foreign_address(
    coords: &[usize],
    local_ids: &[VariableId],
    foreign_mapping: &HashMap<VariableId, usize>,
    foreign_dimension_sizes: &[usize],
) -> usize {
    if foreign_dimension_sizes.is_empty() {
        return 0;
    }
    let mut foreign_coords = vec![0; foreign_dimension_sizes.len()];
    for (&coord, id) in coords.iter().zip(local_ids) {
        if let Some(&foreign_dim) = foreign_mapping.get(id) {
            foreign_coords[foreign_dim] = coord;
        }
    }
    flatten(&foreign_coords, foreign_dimension_sizes)
}

/// For every local dimension, the stride of the same variable in the foreign layout,
/// or 0 if the foreign factor does not contain it.
pub fn projected_strides(
    local_ids: &[VariableId],
    foreign_mapping: &HashMap<VariableId, usize>,
    foreign_dimension_sizes: &[usize],
) -> Vec<usize> {
    let foreign_strides = strides(foreign_dimension_sizes);
    local_ids
        .iter()
        .map(|id| {
            foreign_mapping
                .get(id)
                .map_or(0, |&foreign_dim| foreign_strides[foreign_dim])
        })
        .collect()
}

// Same result as `foreign_address`, given strides from `projected_strides`
pub fn projected_address(coords: &[usize], projected_strides: &[usize]) -> usize {
    coords
        .iter()
        .zip(projected_strides)
        .map(|(coord, stride)| coord * stride)
        .sum()
}

use std::collections::HashSet;

use log::{debug, trace, warn};
use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::{
    errors::{FactorError, Result},
    factors::{alignment::Alignment, options::FactorOptions},
    tables::{
        address_calc::{self, VariableId},
        cut::Cut,
        math_utils,
    },
};

/// A dense probability table over discrete variables.
///
/// Values are stored flat in row-major order (the last dimension varies fastest),
/// either as probabilities or as their logarithms. Evidence clamps dimensions to a
/// single state; algebra operations then only visit the addresses consistent with
/// the evidence, through a cached [`Cut`] that is rebuilt lazily after the
/// selections change.
#[derive(Debug)]
pub struct Factor {
    dimensions: Vec<usize>,          // number of states of every dimension
    dimension_ids: Vec<VariableId>,  // variable bound to every dimension
    values: Vec<f64>,                // never shorter than the product of `dimensions`
    selections: Vec<Option<usize>>,  // evidence clamp of every dimension
    is_log_scale: bool,
    cut: Cut,
    is_cut_valid: bool,
    cut_rebuilds: usize,
    options: FactorOptions,
}

impl Factor {
    // Creates the scalar factor: no dimensions and a single value
    pub fn new() -> Self {
        Factor::with_options(FactorOptions::default())
    }

    pub fn with_options(options: FactorOptions) -> Self {
        Factor {
            dimensions: Vec::new(),
            dimension_ids: Vec::new(),
            values: vec![0.; 1],
            selections: Vec::new(),
            is_log_scale: options.log_scale(),
            cut: Cut::default(),
            is_cut_valid: false,
            cut_rebuilds: 0,
            options,
        }
    }

    /// Creates a factor from an n-dimensional table, binding axis `k` to `dimension_ids[k]`.
    pub fn from_table(dimension_ids: &[VariableId], table: ArrayD<f64>) -> Result<Self> {
        let mut factor = Factor::new();
        factor.set_dimensions(table.shape(), dimension_ids)?;
        factor.values = table.iter().copied().collect();
        Ok(factor)
    }

    /// Sets dimension sizes and their variables together and clears all evidence.
    ///
    /// The value buffer is only reallocated (zeroed) when the new table does not fit
    /// into the current one.
    pub fn set_dimensions(
        &mut self,
        dimensions: &[usize],
        dimension_ids: &[VariableId],
    ) -> Result<()> {
        if dimensions.len() != dimension_ids.len() {
            return Err(FactorError::DimensionMismatch(format!(
                "{} dimension sizes but {} variable ids",
                dimensions.len(),
                dimension_ids.len()
            )));
        }
        if let Some(dimension) = dimensions.iter().position(|&size| size == 0) {
            return Err(FactorError::EmptyDimension { dimension });
        }
        check_unique(dimension_ids)?;

        self.dimensions = dimensions.to_vec();
        self.dimension_ids = dimension_ids.to_vec();
        self.selections = vec![None; dimensions.len()];
        self.is_cut_valid = false;

        let len = self.len();
        if len > self.values.len() {
            self.values = vec![0.; len];
        }
        debug!(
            "Set dimensions {:?} for variables {:?}, table length {}",
            self.dimensions, self.dimension_ids, len
        );
        Ok(())
    }

    /// Rebinds the dimensions to other variables, keeping sizes, values and evidence.
    pub fn set_dimension_ids(&mut self, dimension_ids: &[VariableId]) -> Result<()> {
        if dimension_ids.len() != self.dimensions.len() {
            return Err(FactorError::DimensionMismatch(format!(
                "{} variable ids for a factor with {} dimensions",
                dimension_ids.len(),
                self.dimensions.len()
            )));
        }
        check_unique(dimension_ids)?;
        self.dimension_ids = dimension_ids.to_vec();
        Ok(())
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn dimension_ids(&self) -> &[VariableId] {
        &self.dimension_ids
    }

    pub fn selections(&self) -> &[Option<usize>] {
        &self.selections
    }

    // Number of entries of the table (1 for the scalar factor)
    pub fn len(&self) -> usize {
        self.dimensions.iter().product()
    }

    // A factor always holds at least one entry
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The whole value buffer, which may be longer than the table after the
    /// dimensions have shrunk.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn set_values(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() < self.len() {
            return Err(FactorError::ValueCount {
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    /// View of the table with one axis per dimension.
    pub fn table(&self) -> Result<ArrayViewD<'_, f64>> {
        ArrayViewD::from_shape(IxDyn(&self.dimensions), &self.values[..self.len()])
            .map_err(|error| FactorError::DimensionMismatch(error.to_string()))
    }

    pub fn dimension_of(&self, variable_id: VariableId) -> Result<usize> {
        self.dimension_ids
            .iter()
            .position(|&id| id == variable_id)
            .ok_or(FactorError::UnknownVariable(variable_id))
    }

    pub fn selection(&self, variable_id: VariableId) -> Result<Option<usize>> {
        Ok(self.selections[self.dimension_of(variable_id)?])
    }

    /// Clamps the dimension of `variable_id` to `value`.
    ///
    /// Selecting the current clamp again keeps the cut valid.
    pub fn select(&mut self, variable_id: VariableId, value: usize) -> Result<()> {
        let dim = self.dimension_of(variable_id)?;
        let size = self.dimensions[dim];
        if value >= size {
            return Err(FactorError::InvalidSelectionValue {
                variable: variable_id,
                value,
                size,
            });
        }
        if self.selections[dim] != Some(value) {
            self.selections[dim] = Some(value);
            self.is_cut_valid = false;
        }
        Ok(())
    }

    pub fn reset_selections(&mut self) {
        self.selections.fill(None);
        self.is_cut_valid = false;
    }

    pub fn set_log_scale(&mut self, is_log_scale: bool) {
        self.is_log_scale = is_log_scale;
    }

    pub fn is_log_scale(&self) -> bool {
        self.is_log_scale
    }

    pub fn options(&self) -> &FactorOptions {
        &self.options
    }

    // Converts the table to log scale in place; no-op if it already is
    pub fn to_log_scale(&mut self) {
        if !self.is_log_scale {
            let len = self.len();
            math_utils::linear_to_log(&mut self.values[..len]);
            self.is_log_scale = true;
        }
    }

    // Converts the table back to probabilities in place; no-op if it already is
    pub fn to_linear_scale(&mut self) {
        if self.is_log_scale {
            let len = self.len();
            math_utils::log_to_linear(&mut self.values[..len]);
            self.is_log_scale = false;
        }
    }

    /// The cut for the current evidence, rebuilt first if the evidence changed.
    pub fn cut(&mut self) -> &Cut {
        self.validate_cut();
        &self.cut
    }

    pub fn cut_rebuild_count(&self) -> usize {
        self.cut_rebuilds
    }

    fn validate_cut(&mut self) {
        if !self.is_cut_valid {
            self.cut = Cut::new(&self.dimensions, &self.selections);
            self.is_cut_valid = true;
            self.cut_rebuilds += 1;
            trace!(
                "Rebuilt cut for selections {:?}, {} of {} addresses",
                self.selections,
                self.cut.len(),
                self.len()
            );
        }
    }

    // Dimension to keep and the number of consecutive addresses sharing one of its states
    fn bucket_layout(&self, variable_id: Option<VariableId>) -> Result<(usize, usize)> {
        let dim = match variable_id {
            Some(id) => self.dimension_of(id)?,
            None => self.dimensions.len().checked_sub(1).ok_or_else(|| {
                FactorError::DimensionMismatch(
                    "a factor without dimensions has no dimension to marginalize onto".to_string(),
                )
            })?,
        };
        let divisor = self.dimensions[dim + 1..].iter().product();
        Ok((dim, divisor))
    }

    /// Sums out every dimension except the one of `variable_id` (the last dimension
    /// if `None`), over the addresses consistent with the evidence.
    ///
    /// Treats the values as probabilities; see [`Factor::marginalize_log`] for log scale.
    pub fn marginalize(&mut self, variable_id: Option<VariableId>) -> Result<Vec<f64>> {
        let (dim, divisor) = self.bucket_layout(variable_id)?;
        self.validate_cut();

        let size = self.dimensions[dim];
        let mut result = vec![0.; size];
        let values = &self.values;
        self.cut
            .for_each(|address| result[(address / divisor) % size] += values[address]);
        Ok(result)
    }

    /// Log-domain [`Factor::marginalize`]: the buckets hold the logarithm of the sums.
    /// States without any contribution come out as `-inf`.
    pub fn marginalize_log(&mut self, variable_id: Option<VariableId>) -> Result<Vec<f64>> {
        let (dim, divisor) = self.bucket_layout(variable_id)?;
        self.validate_cut();

        let size = self.dimensions[dim];
        let max = self.find_max();
        let mut result = vec![0.; size];
        let values = &self.values;
        self.cut.for_each(|address| {
            result[(address / divisor) % size] += (values[address] - max).exp()
        });
        result.iter_mut().for_each(|bucket| *bucket = bucket.ln() + max);
        Ok(result)
    }

    // Finite value of largest magnitude over the cut, 0 if there is none.
    // Requires a valid cut.
    fn find_max(&self) -> f64 {
        let mut max = 0.0_f64;
        let values = &self.values;
        self.cut.for_each(|address| {
            let value = values[address];
            if value.is_finite() && value.abs() > max.abs() {
                max = value;
            }
        });
        max
    }

    fn check_compatible(&self, other: &Factor) -> Result<()> {
        let own_mapping = address_calc::id_to_dimension_index(&self.dimension_ids);
        for (&id, &size) in other.dimension_ids.iter().zip(&other.dimensions) {
            match own_mapping.get(&id) {
                None => {
                    return Err(FactorError::DimensionMismatch(format!(
                        "variable {} of the other factor is not a dimension of this factor",
                        id
                    )))
                }
                Some(&dim) if self.dimensions[dim] != size => {
                    return Err(FactorError::DimensionMismatch(format!(
                        "variable {} has {} states here but {} in the other factor",
                        id, self.dimensions[dim], size
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Precomputes, for every address of this factor's value buffer, the address of the
    /// matching entry in `other`, whose dimensions must be a subset of this factor's.
    ///
    /// The result does not depend on evidence and can be reused until either layout changes.
    pub fn prepare_alignment(&self, other: &Factor) -> Result<Alignment> {
        if self.options.validate_alignment() {
            self.check_compatible(other)?;
        }
        debug!(
            "New alignment for variables {:?} onto {:?}",
            self.dimension_ids, other.dimension_ids
        );

        let foreign_mapping = address_calc::id_to_dimension_index(&other.dimension_ids);
        let projected = address_calc::projected_strides(
            &self.dimension_ids,
            &foreign_mapping,
            &other.dimensions,
        );

        let mut positions = Vec::with_capacity(self.values.len());
        match self.dimensions.len().checked_sub(1) {
            None => positions.resize(self.values.len(), 0),
            Some(last_dim) => {
                let mut counter = vec![0; self.dimensions.len()];
                for _ in 0..self.values.len() {
                    positions.push(address_calc::projected_address(&counter, &projected));
                    address_calc::increment_counter(&mut counter, &self.dimensions, last_dim);
                }
            }
        }
        Ok(Alignment::new(positions, other.len()))
    }

    fn check_alignment(&self, alignment: &Alignment, foreign_values_len: usize) -> Result<()> {
        if alignment.len() < self.len() {
            return Err(FactorError::DimensionMismatch(format!(
                "alignment covers {} addresses but the table has {}",
                alignment.len(),
                self.len()
            )));
        }
        if foreign_values_len < alignment.foreign_len() {
            return Err(FactorError::ValueCount {
                expected: alignment.foreign_len(),
                actual: foreign_values_len,
            });
        }
        Ok(())
    }

    /// Multiplies every address consistent with the evidence by the aligned entry of
    /// `other_values` (adds it in log scale).
    pub fn apply_alignment_multiply(
        &mut self,
        alignment: &Alignment,
        other_values: &[f64],
    ) -> Result<()> {
        self.check_alignment(alignment, other_values.len())?;
        self.validate_cut();

        let positions = alignment.positions();
        let values = &mut self.values;
        if self.is_log_scale {
            self.cut
                .for_each(|address| values[address] += other_values[positions[address]]);
        } else {
            self.cut
                .for_each(|address| values[address] *= other_values[positions[address]]);
        }
        Ok(())
    }

    /// Sums the addresses consistent with the evidence into the aligned entries of
    /// `accumulator`, which is zeroed first. In log scale the sums are computed with
    /// log-sum-exp and stored as logarithms.
    pub fn apply_alignment_sum(
        &mut self,
        alignment: &Alignment,
        accumulator: &mut [f64],
    ) -> Result<()> {
        self.check_alignment(alignment, accumulator.len())?;
        self.validate_cut();

        accumulator.fill(0.);
        let positions = alignment.positions();
        let values = &self.values;
        if self.is_log_scale {
            let max = self.find_max();
            self.cut.for_each(|address| {
                accumulator[positions[address]] += (values[address] - max).exp()
            });
            accumulator
                .iter_mut()
                .for_each(|sum| *sum = sum.ln() + max);
        } else {
            self.cut
                .for_each(|address| accumulator[positions[address]] += values[address]);
        }
        Ok(())
    }

    // Multiplies by a factor over a subset of the variables
    pub fn multiply_compatible(&mut self, other: &Factor) -> Result<()> {
        let alignment = self.prepare_alignment(other)?;
        self.apply_alignment_multiply(&alignment, &other.values)
    }

    /// Adds the logarithm of a linear-scale factor over a subset of the variables to
    /// every entry of this (log-scale) factor, regardless of evidence.
    pub fn multiply_into_log(&mut self, other: &Factor) -> Result<()> {
        let alignment = self.prepare_alignment(other)?;
        if other.values[..other.len()].contains(&0.) {
            warn!(
                "Multiplying zero probabilities of {:?} into a log-scale factor",
                other.dimension_ids
            );
        }
        for (value, &position) in self.values.iter_mut().zip(alignment.positions()) {
            *value += other.values[position].ln();
        }
        Ok(())
    }

    /// Copies the addresses consistent with the current evidence from `source`,
    /// leaving all other entries untouched.
    pub fn copy_restricted(&mut self, source: &[f64]) -> Result<()> {
        if source.len() < self.len() {
            return Err(FactorError::ValueCount {
                expected: self.len(),
                actual: source.len(),
            });
        }
        self.validate_cut();

        let values = &mut self.values;
        self.cut
            .for_each(|address| values[address] = source[address]);
        Ok(())
    }
}

fn check_unique(dimension_ids: &[VariableId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(dimension_ids.len());
    match dimension_ids.iter().find(|&&id| !seen.insert(id)) {
        Some(&id) => Err(FactorError::DuplicateVariable(id)),
        None => Ok(()),
    }
}

impl Default for Factor {
    fn default() -> Self {
        Factor::new()
    }
}

impl Clone for Factor {
    // the copy gets its own, invalid cut
    fn clone(&self) -> Self {
        Factor {
            dimensions: self.dimensions.clone(),
            dimension_ids: self.dimension_ids.clone(),
            values: self.values.clone(),
            selections: self.selections.clone(),
            is_log_scale: self.is_log_scale,
            cut: Cut::default(),
            is_cut_valid: false,
            cut_rebuilds: 0,
            options: self.options,
        }
    }
}

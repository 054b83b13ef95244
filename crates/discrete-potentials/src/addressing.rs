//! Addressing model for dense multidimensional tables.
//!
//! A table over variables `[v0, .., vk]` stores its values in a flat array in
//! which `v0` varies fastest. The stride ("offset") of `vi` is the product of
//! the state counts of `v0..vi`.
//!
//! Combining tables whose variables come in different orders is done with
//! *accumulated offsets*: for a target order `R` and an operand `X`, entry `j`
//! is the change of `X`'s linear index when an odometer over `R` increments
//! coordinate `j` and wraps coordinates `0..j` back to zero. Every operation
//! of the algebra is then a single linear scan over the output cells that keeps
//! one running position per operand.
//!
//! ```text
//! R = [b, d, a, c]   X = [a, b, c]   (all binary)
//! offsets(X)      = [1, 2, 4]
//! accumulated(R)  = [+2, -2, -1, +1]
//! ```

use crate::variable::Variable;

/// State count of each variable, in table order.
pub fn dimensions(variables: &[Variable]) -> Vec<usize> {
    variables.iter().map(Variable::num_states).collect()
}

/// Mixed-radix strides for the given dimensions.
pub fn offsets(dimensions: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(dimensions.len());
    let mut stride = 1;
    for &dim in dimensions {
        offsets.push(stride);
        stride *= dim;
    }
    offsets
}

/// Number of cells of a table over `variables` (1 for a constant).
pub fn table_size(variables: &[Variable]) -> usize {
    variables.iter().map(Variable::num_states).product()
}

/// Linear position of a coordinate vector.
///
/// # Panics
///
/// Panics if a coordinate is out of range for its dimension.
pub fn position(offsets: &[usize], dimensions: &[usize], coordinates: &[usize]) -> usize {
    assert_eq!(
        coordinates.len(),
        offsets.len(),
        "coordinate vector has {} entries for a table of {} variables",
        coordinates.len(),
        offsets.len()
    );
    coordinates
        .iter()
        .zip(offsets)
        .zip(dimensions)
        .map(|((&c, &offset), &dim)| {
            assert!(c < dim, "state index {} out of range for dimension {}", c, dim);
            c * offset
        })
        .sum()
}

/// Coordinate vector of a linear position.
pub fn configuration(offsets: &[usize], mut position: usize) -> Vec<usize> {
    let mut coordinates = vec![0; offsets.len()];
    for i in (0..offsets.len()).rev() {
        coordinates[i] = position / offsets[i];
        position -= coordinates[i] * offsets[i];
    }
    coordinates
}

/// Accumulated offsets of an operand over `operand` variables, for an odometer
/// running over `target`.
///
/// Variables of `target` that the operand does not contain contribute zero.
pub fn accumulated_offsets(target: &[Variable], operand: &[Variable]) -> Vec<isize> {
    let operand_offsets = offsets(&dimensions(operand));
    let strides: Vec<isize> = target
        .iter()
        .map(|v| {
            operand
                .iter()
                .position(|o| o == v)
                .map_or(0, |idx| operand_offsets[idx] as isize)
        })
        .collect();

    let mut accumulated = Vec::with_capacity(target.len());
    for j in 0..target.len() {
        let value = if j == 0 {
            strides[0]
        } else {
            let wrapped = target[j - 1].num_states() as isize * strides[j - 1];
            accumulated[j - 1] + strides[j] - wrapped
        };
        accumulated.push(value);
    }
    accumulated
}

/// Mixed-radix counter over a list of dimensions, first coordinate fastest.
#[derive(Debug, Clone)]
pub struct Odometer {
    coordinate: Vec<usize>,
    dimensions: Vec<usize>,
}

impl Odometer {
    /// Create an odometer positioned at the all-zero configuration.
    pub fn new(dimensions: Vec<usize>) -> Self {
        Self {
            coordinate: vec![0; dimensions.len()],
            dimensions,
        }
    }

    /// Step to the next configuration.
    ///
    /// Returns the index of the coordinate that was incremented, or `None`
    /// when every coordinate wrapped back to zero.
    pub fn advance(&mut self) -> Option<usize> {
        for (axis, (c, &dim)) in self
            .coordinate
            .iter_mut()
            .zip(&self.dimensions)
            .enumerate()
        {
            *c += 1;
            if *c < dim {
                return Some(axis);
            }
            *c = 0;
        }
        None
    }

    /// Jump to the configuration with the given linear index.
    pub fn seek(&mut self, mut linear: usize) {
        for (c, &dim) in self.coordinate.iter_mut().zip(&self.dimensions) {
            *c = linear % dim;
            linear /= dim;
        }
    }

    pub fn coordinate(&self) -> &[usize] {
        &self.coordinate
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }
}

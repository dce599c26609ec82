//! Tridiagonal systems and the Thomas algorithm.
//!
//! Rows are stored as three equally long bands. `lower[0]` and
//! `upper[n - 1]` fall outside the matrix and are ignored.

use num_traits::Float;
use thiserror::Error;

/// Errors from building or solving a [`Tridiagonal`] system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TridiagonalError {
    #[error("system has no rows")]
    Empty,

    #[error("band or vector length {actual} does not match {expected} rows")]
    Dimension { expected: usize, actual: usize },

    /// Forward elimination produced a zero or non-finite pivot.
    #[error("singular pivot in row {row}")]
    SingularPivot { row: usize },
}

/// A square tridiagonal matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Tridiagonal<T> {
    lower: Vec<T>,
    diagonal: Vec<T>,
    upper: Vec<T>,
}

impl<T: Float> Tridiagonal<T> {
    /// Builds a matrix from its three bands.
    ///
    /// # Errors
    ///
    /// Returns an error if the bands are empty or differ in length.
    pub fn new(lower: Vec<T>, diagonal: Vec<T>, upper: Vec<T>) -> Result<Self, TridiagonalError> {
        let n = diagonal.len();
        if n == 0 {
            return Err(TridiagonalError::Empty);
        }
        for band in [&lower, &upper] {
            if band.len() != n {
                return Err(TridiagonalError::Dimension {
                    expected: n,
                    actual: band.len(),
                });
            }
        }
        Ok(Self {
            lower,
            diagonal,
            upper,
        })
    }

    /// The `n × n` identity.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            lower: vec![T::zero(); n],
            diagonal: vec![T::one(); n],
            upper: vec![T::zero(); n],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagonal.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagonal.is_empty()
    }

    /// Overwrites row `i` with `lower`, `diagonal` and `upper` entries.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn set_row(&mut self, i: usize, lower: T, diagonal: T, upper: T) {
        self.lower[i] = lower;
        self.diagonal[i] = diagonal;
        self.upper[i] = upper;
    }

    /// Entries of row `i` as `(lower, diagonal, upper)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn row(&self, i: usize) -> (T, T, T) {
        (self.lower[i], self.diagonal[i], self.upper[i])
    }

    /// Sum of the in-matrix entries of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn row_sum(&self, i: usize) -> T {
        let last = self.len() - 1;
        let mut sum = self.diagonal[i];
        if i > 0 {
            sum = sum + self.lower[i];
        }
        if i < last {
            sum = sum + self.upper[i];
        }
        sum
    }

    /// Computes `A x`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` does not have one entry per row.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>, TridiagonalError> {
        let n = self.check_len(x)?;
        Ok((0..n)
            .map(|i| {
                let mut v = self.diagonal[i] * x[i];
                if i > 0 {
                    v = v + self.lower[i] * x[i - 1];
                }
                if i + 1 < n {
                    v = v + self.upper[i] * x[i + 1];
                }
                v
            })
            .collect())
    }

    /// Solves `A x = rhs` by forward elimination and back substitution.
    ///
    /// No pivoting is performed, which is stable for the diagonally
    /// dominant systems produced by implicit diffusion steps.
    ///
    /// # Errors
    ///
    /// Returns [`TridiagonalError::SingularPivot`] naming the first row whose
    /// pivot is zero or non-finite, or a dimension error.
    pub fn solve(&self, rhs: &[T]) -> Result<Vec<T>, TridiagonalError> {
        let n = self.check_len(rhs)?;

        let mut c = vec![T::zero(); n];
        let mut d = vec![T::zero(); n];

        let pivot = checked_pivot(self.diagonal[0], 0)?;
        c[0] = self.upper[0] / pivot;
        d[0] = rhs[0] / pivot;

        for i in 1..n {
            let pivot = checked_pivot(self.diagonal[i] - self.lower[i] * c[i - 1], i)?;
            if i + 1 < n {
                c[i] = self.upper[i] / pivot;
            }
            d[i] = (rhs[i] - self.lower[i] * d[i - 1]) / pivot;
        }

        let mut x = d;
        for i in (0..n - 1).rev() {
            x[i] = x[i] - c[i] * x[i + 1];
        }
        Ok(x)
    }

    fn check_len(&self, v: &[T]) -> Result<usize, TridiagonalError> {
        let n = self.len();
        if n == 0 {
            return Err(TridiagonalError::Empty);
        }
        if v.len() != n {
            return Err(TridiagonalError::Dimension {
                expected: n,
                actual: v.len(),
            });
        }
        Ok(n)
    }
}

fn checked_pivot<T: Float>(pivot: T, row: usize) -> Result<T, TridiagonalError> {
    if pivot == T::zero() || !pivot.is_finite() {
        Err(TridiagonalError::SingularPivot { row })
    } else {
        Ok(pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn identity_returns_rhs() {
        let rhs = [1.0, 2.0, 3.0, 4.0];
        let x = Tridiagonal::<f64>::identity(4).solve(&rhs).unwrap();
        assert_eq!(x, rhs);
    }

    #[test]
    fn solves_laplacian() {
        let a = Tridiagonal::new(
            vec![0.0, -1.0, -1.0, -1.0],
            vec![2.0, 2.0, 2.0, 2.0],
            vec![-1.0, -1.0, -1.0, 0.0],
        )
        .unwrap();
        let rhs = [1.0, 0.0, 0.0, 1.0];

        let x = a.solve(&rhs).unwrap();
        for (ax, b) in a.mul_vec(&x).unwrap().iter().zip(rhs) {
            assert_relative_eq!(*ax, b, epsilon = 1e-12);
        }
        // The symmetric system has the constant solution.
        for xi in x {
            assert_relative_eq!(xi, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn reports_singular_row() {
        let a = Tridiagonal::new(vec![0.0, 1.0], vec![1.0, 1.0], vec![1.0, 0.0]).unwrap();
        assert_eq!(
            a.solve(&[1.0, 1.0]),
            Err(TridiagonalError::SingularPivot { row: 1 })
        );
    }

    #[test]
    fn rejects_mismatched_bands() {
        assert_eq!(
            Tridiagonal::new(vec![0.0; 2], vec![1.0; 3], vec![0.0; 3]),
            Err(TridiagonalError::Dimension {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            Tridiagonal::new(Vec::<f64>::new(), Vec::new(), Vec::new()),
            Err(TridiagonalError::Empty)
        );
    }

    #[test]
    fn row_sums_ignore_out_of_matrix_entries() {
        let a = Tridiagonal::new(vec![9.0, -1.0, -1.0], vec![1.0, 3.0, 1.0], vec![-1.0, -1.0, 9.0])
            .unwrap();
        assert_eq!(a.row_sum(0), 0.0);
        assert_eq!(a.row_sum(1), 1.0);
        assert_eq!(a.row_sum(2), 0.0);
    }
}

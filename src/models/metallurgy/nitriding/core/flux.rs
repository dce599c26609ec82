//! Finite-volume face coefficients on a uniform grid.
//!
//! Cell `i` exchanges nitrogen with `i + 1` through face `i`, so `N` cells
//! have `N - 1` faces. Both end cells are fixed-value boundaries.

use crate::support::tridiagonal::Tridiagonal;

/// Harmonic mean of two cell coefficients; zero when both vanish.
#[must_use]
pub(super) fn harmonic_face(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum == 0.0 { 0.0 } else { 2.0 * a * b / sum }
}

/// Face coefficients `beta_face[i]` from cell diffusivities and `dx²`.
pub(super) fn face_coefficients(mixture: &[f64], dx2: f64) -> Vec<f64> {
    mixture
        .windows(2)
        .map(|w| harmonic_face(w[0] / dx2, w[1] / dx2))
        .collect()
}

/// Writes `du/dt` for the semi-discrete diffusion equation.
///
/// The boundary entries are zero.
pub(super) fn derivative(faces: &[f64], u: &[f64], dudt: &mut [f64]) {
    let n = u.len();
    dudt[0] = 0.0;
    dudt[n - 1] = 0.0;
    for i in 1..n - 1 {
        dudt[i] = faces[i] * (u[i + 1] - u[i]) - faces[i - 1] * (u[i] - u[i - 1]);
    }
}

/// Backward-Euler matrix `I - dt L` with identity boundary rows.
pub(super) fn implicit_matrix(faces: &[f64], dt: f64) -> Tridiagonal<f64> {
    let n = faces.len() + 1;
    let mut matrix = Tridiagonal::identity(n);
    for i in 1..n - 1 {
        let (west, east) = (faces[i - 1], faces[i]);
        matrix.set_row(i, -dt * west, 1.0 + dt * (west + east), -dt * east);
    }
    matrix
}

//! Ordinary least squares regression
//!
//! Fits `y = intercept + X @ coefficients` by solving the normal equations of
//! the mean-centered design matrix with a Cholesky factorization. Columns that
//! are constant, or linear combinations of earlier columns, get a coefficient
//! of exactly zero; the remaining columns are fitted as if the dependent ones
//! were absent, so predictions match any other least squares solution.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Relative pivot size below which a column is treated as dependent
const RANK_TOLERANCE: f64 = 1e-10;

/// Coefficients and intercept of a least squares fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// One coefficient per design matrix column
    pub coefficients: Vec<f64>,
    /// Intercept term
    pub intercept: f64,
    /// Indices of columns pinned to zero because they carried no new information
    pub dependent_columns: Vec<usize>,
}

impl OlsFit {
    /// Predict a single observation
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    /// Number of columns that received a free coefficient
    pub fn rank(&self) -> usize {
        self.coefficients.len() - self.dependent_columns.len()
    }
}

/// Fit ordinary least squares with an intercept
///
/// `x` is row-major: one inner vector per observation, all of equal length.
pub fn least_squares(x: &[Vec<f64>], y: &[f64]) -> Result<OlsFit> {
    let n = y.len();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if x.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            x.len(),
            n
        )));
    }

    let k = x[0].len();
    if let Some(bad) = x.iter().position(|row| row.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} features, expected {}",
            bad,
            x[bad].len(),
            k
        )));
    }
    if x.iter().flatten().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Design matrix and target must be finite".to_string(),
        ));
    }

    let n_f = n as f64;
    let y_mean = y.iter().sum::<f64>() / n_f;
    let x_means: Vec<f64> = (0..k)
        .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n_f)
        .collect();

    // Centered X'X and X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in x.iter().zip(y.iter()) {
        let centered: Vec<f64> = row.iter().zip(&x_means).map(|(v, m)| v - m).collect();
        let yc = yi - y_mean;
        for i in 0..k {
            xty[i] += centered[i] * yc;
            for j in 0..=i {
                xtx[i][j] += centered[i] * centered[j];
            }
        }
    }

    let (coefficients, dependent_columns) = solve_normal_equations(&xtx, &xty)?;

    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_means)
            .map(|(c, m)| c * m)
            .sum::<f64>();

    Ok(OlsFit {
        coefficients,
        intercept,
        dependent_columns,
    })
}

/// Solve the symmetric positive semi-definite system `A @ b = c`.
///
/// Only the lower triangle of `a` is read. Pivots that vanish relative to
/// their diagonal entry mark the column as dependent; its coefficient is zero.
fn solve_normal_equations(a: &[Vec<f64>], c: &[f64]) -> Result<(Vec<f64>, Vec<usize>)> {
    let k = c.len();
    let mut l = vec![vec![0.0; k]; k];
    let mut independent = vec![true; k];

    for j in 0..k {
        let mut pivot = a[j][j];
        for p in 0..j {
            if independent[p] {
                pivot -= l[j][p] * l[j][p];
            }
        }

        if a[j][j] <= 0.0 || pivot <= RANK_TOLERANCE * a[j][j] {
            independent[j] = false;
            continue;
        }
        let diag = pivot.sqrt();
        l[j][j] = diag;

        for i in (j + 1)..k {
            let mut sum = a[i][j];
            for p in 0..j {
                if independent[p] {
                    sum -= l[i][p] * l[j][p];
                }
            }
            l[i][j] = sum / diag;
        }
    }

    // Forward substitution: L @ z = c
    let mut z = vec![0.0; k];
    for i in 0..k {
        if !independent[i] {
            continue;
        }
        let mut sum = c[i];
        for p in 0..i {
            if independent[p] {
                sum -= l[i][p] * z[p];
            }
        }
        z[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ b = z
    let mut b = vec![0.0; k];
    for i in (0..k).rev() {
        if !independent[i] {
            continue;
        }
        let mut sum = z[i];
        for p in (i + 1)..k {
            if independent[p] {
                sum -= l[p][i] * b[p];
            }
        }
        b[i] = sum / l[i][i];
    }

    if b.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares solution is not finite".to_string(),
        ));
    }

    let dependent = (0..k).filter(|&j| !independent[j]).collect();
    Ok((b, dependent))
}

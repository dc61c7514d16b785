//! Numeric kernels used by the power iteration: matrix-vector product and
//! L2 normalization.

use crate::error::EngineError;
use crate::matrix::AdjacencyMatrix;
use crate::vector::ScoreVector;

/// Compute `r = M·v`, i.e. `r[i] = Σ_j M[i][j]·v[j]`.
///
/// # Errors
///
/// [`EngineError::ShapeMismatch`] when `v.len()` differs from the matrix
/// order. The vector is never truncated or padded.
pub fn multiply(matrix: &AdjacencyMatrix, vector: &ScoreVector) -> Result<ScoreVector, EngineError> {
    let n = matrix.order();
    if vector.len() != n {
        return Err(EngineError::ShapeMismatch {
            expected: n,
            found: vector.len(),
        });
    }

    Ok(matrix
        .rows()
        .map(|row| {
            row.iter()
                .zip(vector)
                .map(|(&m, &v)| f64::from(m) * v)
                .sum::<f64>()
        })
        .collect())
}

/// Euclidean norm `sqrt(Σ v[i]²)`.
#[must_use]
pub fn l2_norm(vector: &ScoreVector) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Divide every entry of `vector` by `norm`.
///
/// # Errors
///
/// [`EngineError::ZeroNorm`] when `norm` is zero or not finite; nothing is
/// divided.
pub fn normalize(vector: &ScoreVector, norm: f64) -> Result<ScoreVector, EngineError> {
    if norm == 0.0 || !norm.is_finite() {
        return Err(EngineError::ZeroNorm);
    }
    Ok(vector.iter().map(|x| x / norm).collect())
}

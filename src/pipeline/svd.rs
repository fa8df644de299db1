use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::pipeline::types::{SparseVector, TfidfMatrix};
use crate::pipeline::PipelineError;
use crate::TARGET_PIPELINE;

// Fixed iteration count keeps repeated fits bit-for-bit identical.
const POWER_ITERATIONS: usize = 100;
const RANK_EPS: f64 = 1e-12;

/// Truncated singular value decomposition fitted by seeded power iteration
/// with deflation.
///
/// `fit` extracts the leading right singular vectors of the TF-IDF matrix;
/// `transform` projects a sparse row into the latent space as `x · V`,
/// matching the latent matrix produced at fit time.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    n_components: usize,
    seed: u64,
    // (n_components, n_terms); rows are right singular vectors.
    components: Option<Array2<f64>>,
    singular_values: Option<Array1<f64>>,
}

impl TruncatedSvd {
    pub fn new(n_components: usize, seed: u64) -> Self {
        Self {
            n_components,
            seed,
            components: None,
            singular_values: None,
        }
    }

    /// Fit the decomposition and return the dense latent matrix
    /// (documents x components).
    pub fn fit(&mut self, matrix: &TfidfMatrix) -> Result<Array2<f64>, PipelineError> {
        let (n_rows, n_terms) = (matrix.n_rows(), matrix.n_terms());
        let rank_bound = n_rows.min(n_terms);
        if self.n_components > rank_bound {
            return Err(PipelineError::Dimension {
                n_components: self.n_components,
                rank_bound,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut components = Array2::zeros((self.n_components, n_terms));
        let mut singular_values = Array1::zeros(self.n_components);
        let mut extracted: Vec<(f64, Array1<f64>, Array1<f64>)> = Vec::new();

        for k in 0..self.n_components {
            let (sigma, u, v) = power_iteration(matrix, &extracted, &mut rng);
            if sigma < RANK_EPS {
                // Effective rank exhausted; remaining components stay zero
                // and contribute nothing to projections.
                debug!(
                    target: TARGET_PIPELINE,
                    "Rank exhausted after {} of {} components", k, self.n_components
                );
                break;
            }
            singular_values[k] = sigma;
            components.row_mut(k).assign(&v);
            extracted.push((sigma, u, v));
        }

        self.components = Some(components);
        self.singular_values = Some(singular_values);

        let mut latent = Array2::zeros((n_rows, self.n_components));
        for (row_idx, row) in matrix.rows().iter().enumerate() {
            let projected = self.transform(row)?;
            latent.row_mut(row_idx).assign(&projected);
        }
        Ok(latent)
    }

    /// Project a sparse TF-IDF row into the fitted latent space.
    pub fn transform(&self, vector: &SparseVector) -> Result<Array1<f64>, PipelineError> {
        let components = self.components.as_ref().ok_or(PipelineError::NotFitted)?;
        let mut out = Array1::zeros(components.nrows());
        for (&idx, &value) in vector.indices.iter().zip(&vector.values) {
            for k in 0..components.nrows() {
                out[k] += value * components[[k, idx]];
            }
        }
        Ok(out)
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn singular_values(&self) -> Result<&Array1<f64>, PipelineError> {
        self.singular_values.as_ref().ok_or(PipelineError::NotFitted)
    }
}

/// One round of power iteration on the matrix with the already-extracted
/// components deflated implicitly, so the sparse input is never densified.
fn power_iteration(
    matrix: &TfidfMatrix,
    extracted: &[(f64, Array1<f64>, Array1<f64>)],
    rng: &mut StdRng,
) -> (f64, Array1<f64>, Array1<f64>) {
    let n_terms = matrix.n_terms();

    let mut v = Array1::from_iter((0..n_terms).map(|_| rng.random::<f64>() - 0.5));
    let norm = l2(&v);
    if norm > 0.0 {
        v /= norm;
    }

    let mut u;
    let mut sigma = 0.0;

    for _ in 0..POWER_ITERATIONS {
        // u = A v, minus the components already taken out.
        u = matrix.matvec(v.view());
        for (s, du, dv) in extracted {
            let proj = dv.dot(&v);
            u.scaled_add(-s * proj, du);
        }
        let norm_u = l2(&u);
        if norm_u < RANK_EPS {
            return (0.0, u, v);
        }
        u /= norm_u;

        // w = A^T u, deflated the same way.
        let mut w = matrix.matvec_t(u.view());
        for (s, du, dv) in extracted {
            let proj = du.dot(&u);
            w.scaled_add(-s * proj, dv);
        }
        sigma = l2(&w);
        if sigma < RANK_EPS {
            return (0.0, u, v);
        }
        v = w / sigma;
    }

    // Recompute the left vector for the final v so the extracted triple is
    // self-consistent for deflation.
    u = matrix.matvec(v.view());
    for (s, du, dv) in extracted {
        let proj = dv.dot(&v);
        u.scaled_add(-s * proj, du);
    }
    let norm_u = l2(&u);
    if norm_u > RANK_EPS {
        u /= norm_u;
    }

    (sigma, u, v)
}

fn l2(vector: &Array1<f64>) -> f64 {
    vector.dot(vector).sqrt()
}

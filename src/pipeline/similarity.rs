use ndarray::ArrayView1;

/// Cosine similarity between two latent vectors.
///
/// Zero-magnitude inputs score 0.0 rather than erroring: a query with no
/// vocabulary overlap projects to (near) zero and ranks at the bottom, which
/// is the accepted degenerate case.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let mag_a = a.dot(&a).sqrt();
    let mag_b = b.dot(&b).sqrt();
    if mag_a < 1e-10 || mag_b < 1e-10 {
        return 0.0;
    }

    a.dot(&b) / (mag_a * mag_b)
}

use ndarray::{Array1, ArrayView1};
use serde::Serialize;

use crate::corpus::Article;

/// Sparse TF-IDF row: parallel index/value arrays, sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value *= factor;
        }
    }

    /// Dot product against a dense vector indexed by term.
    pub fn dot_dense(&self, dense: ArrayView1<f64>) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&idx, &value)| value * dense[idx])
            .sum()
    }
}

/// Sparse document-term matrix, one row per corpus article. Fit once,
/// read-only afterward.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    rows: Vec<SparseVector>,
    n_terms: usize,
}

impl TfidfMatrix {
    pub fn new(rows: Vec<SparseVector>, n_terms: usize) -> Self {
        Self { rows, n_terms }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    /// y = A x, with x indexed by term.
    pub fn matvec(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            y[row_idx] = row.dot_dense(x);
        }
        y
    }

    /// y = A^T x, with x indexed by document.
    pub fn matvec_t(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.n_terms);
        for (row_idx, row) in self.rows.iter().enumerate() {
            let weight = x[row_idx];
            for (&idx, &value) in row.indices.iter().zip(&row.values) {
                y[idx] += weight * value;
            }
        }
        y
    }
}

/// Article index paired with its similarity to a query, as returned by the
/// recommender in descending score order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f64,
}

/// One output row for the remote "recommendations" table.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub category: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub content: String,
    pub image_url: String,
    pub published_at: String,
    pub author: String,
    pub similarity_score: f64,
}

impl Recommendation {
    pub fn from_article(category: &str, article: &Article, score: f64) -> Self {
        Self {
            category: category.to_string(),
            title: article.title.clone(),
            url: article.url.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone(),
            published_at: article.published_at.clone(),
            author: article.author.clone(),
            similarity_score: score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sparse_l2_norm_and_scale() {
        let mut vector = SparseVector::new(vec![0, 3], vec![3.0, 4.0]);
        assert!((vector.l2_norm() - 5.0).abs() < 1e-12);
        vector.scale(1.0 / 5.0);
        assert!((vector.l2_norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matvec_against_dense_equivalent() {
        // [[1, 0, 2], [0, 3, 0]]
        let matrix = TfidfMatrix::new(
            vec![
                SparseVector::new(vec![0, 2], vec![1.0, 2.0]),
                SparseVector::new(vec![1], vec![3.0]),
            ],
            3,
        );
        let x = array![1.0, 1.0, 1.0];
        assert_eq!(matrix.matvec(x.view()), array![3.0, 3.0]);

        let y = array![1.0, 2.0];
        assert_eq!(matrix.matvec_t(y.view()), array![1.0, 6.0, 2.0]);
    }
}

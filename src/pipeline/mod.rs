//! The recommendation pipeline: TF-IDF vectorization, truncated-SVD latent
//! projection, and cosine-similarity ranking over the fitted corpus.

pub mod similarity;
pub mod svd;
pub mod tfidf;
pub mod types;

pub use similarity::cosine_similarity;
pub use svd::TruncatedSvd;
pub use tfidf::TfidfVectorizer;
pub use types::{Ranked, Recommendation, SparseVector, TfidfMatrix};

use std::cmp::Ordering;

use ndarray::Array2;
use thiserror::Error;
use tracing::info;

use crate::corpus::Corpus;
use crate::TARGET_PIPELINE;

/// Vocabulary cap applied when fitting the vectorizer.
pub const MAX_FEATURES: usize = 5000;
/// Dimensionality of the latent space.
pub const N_COMPONENTS: usize = 100;
/// Decomposition seed, fixed so repeated runs produce identical output.
pub const SVD_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transform called before fit")]
    NotFitted,

    #[error("{n_components} components exceed the input rank bound of {rank_bound}")]
    Dimension {
        n_components: usize,
        rank_bound: usize,
    },
}

/// Immutable fitted state: the vectorizer, the projector, and the corpus
/// latent matrix. Built once per run; recommendation queries only read it.
pub struct Pipeline {
    vectorizer: TfidfVectorizer,
    projector: TruncatedSvd,
    latent: Array2<f64>,
}

impl Pipeline {
    /// Fit the full pipeline over the corpus with the standard parameters.
    pub fn fit(corpus: &Corpus) -> Result<Self, PipelineError> {
        Self::fit_with(corpus, MAX_FEATURES, N_COMPONENTS, SVD_SEED)
    }

    pub fn fit_with(
        corpus: &Corpus,
        max_features: usize,
        n_components: usize,
        seed: u64,
    ) -> Result<Self, PipelineError> {
        let mut vectorizer = TfidfVectorizer::new(max_features);
        let tfidf = vectorizer.fit(corpus.combined_texts());
        info!(
            target: TARGET_PIPELINE,
            "Fitted TF-IDF over {} documents ({} terms)",
            tfidf.n_rows(),
            tfidf.n_terms()
        );

        let mut projector = TruncatedSvd::new(n_components, seed);
        let latent = projector.fit(&tfidf)?;
        info!(
            target: TARGET_PIPELINE,
            "Projected corpus into {}-dimensional latent space", n_components
        );

        Ok(Self {
            vectorizer,
            projector,
            latent,
        })
    }

    /// Rank every corpus article against the query, most similar first, and
    /// keep the first `top_n`. Equal scores keep corpus order.
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Vec<Ranked>, PipelineError> {
        let query_tfidf = self.vectorizer.transform(query)?;
        let query_latent = self.projector.transform(&query_tfidf)?;

        let mut ranked: Vec<Ranked> = self
            .latent
            .outer_iter()
            .enumerate()
            .map(|(index, row)| Ranked {
                index,
                score: cosine_similarity(query_latent.view(), row),
            })
            .collect();

        // Stable sort: ties keep original corpus order.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);
        Ok(ranked)
    }

    pub fn corpus_size(&self) -> usize {
        self.latent.nrows()
    }
}

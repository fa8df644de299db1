use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::pipeline::types::{SparseVector, TfidfMatrix};
use crate::pipeline::PipelineError;
use crate::text::tokenize;
use crate::TARGET_PIPELINE;

/// TF-IDF vectorizer with a frequency-capped vocabulary.
///
/// Fitting builds the vocabulary from the corpus-wide term counts (capped at
/// `max_features`, ties broken alphabetically) and computes smoothed inverse
/// document frequencies. Every produced row is L2-normalized, so dot products
/// between rows are already cosine similarities.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
            n_documents: 0,
        }
    }

    /// Fit the vocabulary on the given documents and return their sparse
    /// TF-IDF matrix, one row per document in input order.
    pub fn fit<'a, I>(&mut self, documents: I) -> TfidfMatrix
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<Vec<String>> =
            documents.into_iter().map(tokenize).collect();
        self.n_documents = tokenized.len();

        // Corpus-wide term counts drive the vocabulary cap; document
        // frequencies drive the IDF weights.
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in &tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in doc {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut by_count: Vec<(String, usize)> = term_counts.into_iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_count.truncate(self.max_features);

        // Index the retained terms alphabetically so the column layout is
        // stable for identical input.
        let mut terms: Vec<String> = by_count.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        self.vocabulary = terms
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        let n = self.n_documents as f64;
        self.idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.terms = terms;

        debug!(
            target: TARGET_PIPELINE,
            "Vocabulary fitted: {} terms over {} documents",
            self.terms.len(),
            self.n_documents
        );

        let rows = tokenized.iter().map(|doc| self.vectorize(doc)).collect();
        TfidfMatrix::new(rows, self.terms.len())
    }

    /// Map free text onto the fitted vocabulary. Terms outside the
    /// vocabulary contribute nothing.
    pub fn transform(&self, text: &str) -> Result<SparseVector, PipelineError> {
        if self.n_documents == 0 {
            return Err(PipelineError::NotFitted);
        }
        Ok(self.vectorize(&tokenize(text)))
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        // BTreeMap keeps the indices sorted.
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let (indices, values): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(idx, count)| (idx, count as f64 * self.idf[idx]))
            .unzip();

        let mut vector = SparseVector::new(indices, values);
        let norm = vector.l2_norm();
        if norm > 0.0 {
            vector.scale(1.0 / norm);
        }
        vector
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

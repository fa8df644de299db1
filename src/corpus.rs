use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::TARGET_CORPUS;

/// Columns the corpus must supply. `id` is optional and defaults to the row
/// position when absent.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "title",
    "description",
    "content",
    "url",
    "image_url",
    "published_at",
    "author",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("corpus is missing required column '{0}'")]
    MissingColumn(String),

    #[error("corpus is not parseable as CSV: {0}")]
    Format(#[from] csv::Error),

    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
}

// Raw CSV row. Blank cells deserialize to empty strings; an absent id column
// deserializes to None.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    author: String,
}

/// One article of the loaded corpus. Immutable after load; `combined_text`
/// is the space-joined concatenation of title, description and content.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: String,
    pub published_at: String,
    pub author: String,
    pub combined_text: String,
}

/// The in-memory article corpus, in source row order.
#[derive(Debug)]
pub struct Corpus {
    articles: Vec<Article>,
}

impl Corpus {
    /// Load the corpus from a CSV file on disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        let corpus = Self::from_reader(file)?;
        info!(
            target: TARGET_CORPUS,
            "Loaded {} articles from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// Parse the corpus from any CSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut csv = csv::Reader::from_reader(reader);

        let headers = csv.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(LoadError::MissingColumn(column.to_string()));
            }
        }

        let mut articles = Vec::new();
        for (row, record) in csv.deserialize::<RawRecord>().enumerate() {
            let raw = record?;
            let combined_text =
                format!("{} {} {}", raw.title, raw.description, raw.content);
            articles.push(Article {
                id: raw.id.unwrap_or(row as i64),
                title: raw.title,
                description: raw.description,
                content: raw.content,
                url: raw.url,
                image_url: raw.image_url,
                published_at: raw.published_at,
                author: raw.author,
                combined_text,
            });
        }

        Ok(Self { articles })
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// The derived text field of every article, in corpus order.
    pub fn combined_texts(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|a| a.combined_text.as_str())
    }
}

pub mod config;
pub mod corpus;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod text;

pub const TARGET_CORPUS: &str = "corpus";
pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_WEB_REQUEST: &str = "web_request";

/// Categories every run computes recommendations for. Each one is used
/// verbatim as the free-text query against the fitted corpus.
pub const CATEGORIES: [&str; 16] = [
    "General",
    "Business",
    "Technology",
    "Entertainment",
    "Sports",
    "Health",
    "Science",
    "Politics",
    "Environment",
    "Travel",
    "Food",
    "Education",
    "Finance",
    "World",
    "Culture",
    "Crime",
];

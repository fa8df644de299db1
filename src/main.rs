use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use curator::config::Config;
use curator::corpus::Corpus;
use curator::logging::configure_logging;
use curator::pipeline::{Pipeline, Recommendation};
use curator::sink::Sink;
use curator::{CATEGORIES, TARGET_PIPELINE};

#[derive(Parser)]
#[clap(
    name = "curator",
    about = "Computes per-category article recommendations and stores them remotely"
)]
struct Cli {
    /// Path to the scraped-articles CSV corpus
    #[clap(short, long, default_value = "scraped_articles_api.csv")]
    corpus: PathBuf,

    /// Recommendations per category
    #[clap(short, long, default_value = "5")]
    top_n: usize,

    /// Compute recommendations without writing to the remote table
    #[clap(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_logging();
    let cli = Cli::parse();

    let corpus = Corpus::load(&cli.corpus)
        .with_context(|| format!("failed to load corpus from {}", cli.corpus.display()))?;
    let pipeline = Pipeline::fit(&corpus).context("failed to fit the recommendation pipeline")?;

    let mut records: Vec<Recommendation> = Vec::with_capacity(CATEGORIES.len() * cli.top_n);
    for category in CATEGORIES {
        let ranked = pipeline.recommend(category, cli.top_n)?;
        info!(
            target: TARGET_PIPELINE,
            "Ranked {} articles for category '{}'",
            ranked.len(),
            category
        );
        records.extend(ranked.iter().map(|entry| {
            Recommendation::from_article(category, &corpus.articles()[entry.index], entry.score)
        }));
    }

    if cli.dry_run {
        info!(
            "Dry run: computed {} recommendation records, skipping the remote write",
            records.len()
        );
        return Ok(());
    }

    let config = Config::from_env()?;
    let sink = Sink::new(&config.supabase_url, &config.supabase_key);
    match sink.publish(&records).await {
        Ok(count) => {
            info!("Recommendations successfully stored ({} records)", count);
            Ok(())
        }
        Err(err) => {
            error!("Failed to store recommendations: {}", err);
            Err(err.into())
        }
    }
}

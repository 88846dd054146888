use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use tracing::info;

use scout_core::{
    BuildConfig, ColorHistogramEmbedder, EmbeddingBuilder, FailurePolicy, MetadataFileSource, SearchRequest,
    SearchResponse, SimilaritySearcher,
};

use crate::cli::{BuildArgs, IndexArgs, SearchArgs};

pub fn build(args: &BuildArgs) -> Result<()> {
    let corpus = MetadataFileSource::new(&args.dirs.data_dir).load()?;
    info!(items = corpus.len(), data_dir = ?args.dirs.data_dir, "Loaded corpus");

    let policy = if args.strict { FailurePolicy::Strict } else { FailurePolicy::Lenient };
    let config = BuildConfig::default()
        .with_limit(args.limit)
        .with_force(args.force)
        .with_failure_policy(policy)
        .with_batch_size(args.batch_size);

    let builder = EmbeddingBuilder::new(args.dirs.index_dir(), Arc::new(ColorHistogramEmbedder::new()), config);
    let outcome = builder.build(&corpus)?;

    if outcome.is_skipped() {
        println!(
            "Index at {} is up to date ({} vectors)",
            builder.index_dir().display(),
            outcome.manifest.vector_count
        );
        return Ok(());
    }
    println!(
        "Indexed {} of {} items into {}",
        outcome.manifest.vector_count,
        corpus.len(),
        builder.index_dir().display()
    );
    if !outcome.failures.is_empty() {
        println!("Skipped {} items:", outcome.failures.len());
        for failure in &outcome.failures {
            println!("  {} {}: {}", failure.id, failure.path.display(), failure.reason);
        }
    }
    Ok(())
}

pub fn search(args: &SearchArgs) -> Result<()> {
    let searcher = open(&args.dirs)?;

    let request = match (&args.text, &args.image) {
        (Some(text), None) => SearchRequest::text(text.clone(), args.top_k),
        (None, Some(path)) => {
            let bytes = fs::read(path).with_context(|| format!("Failed to read query image {}", path.display()))?;
            SearchRequest::image(bytes, args.top_k)
        }
        _ => anyhow::bail!("Provide exactly one of --text or --image"),
    };
    let response = searcher.handle(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_table(&response);
    }
    Ok(())
}

pub fn stats(args: &IndexArgs) -> Result<()> {
    let searcher = open(args)?;
    println!("{}", serde_json::to_string_pretty(&searcher.stats())?);
    Ok(())
}

fn open(dirs: &IndexArgs) -> Result<SimilaritySearcher> {
    let index_dir = dirs.index_dir();
    SimilaritySearcher::open(&index_dir, Arc::new(ColorHistogramEmbedder::new()))
        .with_context(|| format!("Failed to open index at {}", index_dir.display()))
}

fn print_table(response: &SearchResponse) {
    println!("Query: {} ({:.2} ms)", response.query, response.latency_ms);
    println!("{:>4}  {:>8}  {:>8}  {:<14}  path", "rank", "score", "id", "label");
    for (rank, hit) in response.results.iter().enumerate() {
        println!(
            "{:>4}  {:>8.4}  {:>8}  {:<14}  {}",
            rank + 1,
            hit.score,
            hit.item.id,
            hit.item.label.as_deref().unwrap_or("-"),
            hit.item.path.display()
        );
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use scout_core::request::DEFAULT_TOP_K;

#[derive(Parser, Debug)]
#[command(name = "scout", version, about = "Build and query a similarity index over Earth-observation tiles")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides this).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Embed the tile corpus and write the index.
    Build(BuildArgs),
    /// Query the index with a text phrase or an image.
    Search(SearchArgs),
    /// Print a summary of the stored index.
    Stats(IndexArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Corpus directory holding metadata.json and images/.
    #[arg(long, env = "SCOUT_DATA_DIR", default_value = "data/eurosat")]
    pub data_dir: PathBuf,

    /// Index directory [default: <DATA_DIR>/index].
    #[arg(long, env = "SCOUT_INDEX_DIR")]
    pub index_dir: Option<PathBuf>,
}

impl IndexArgs {
    pub fn index_dir(&self) -> PathBuf {
        self.index_dir.clone().unwrap_or_else(|| self.data_dir.join("index"))
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub dirs: IndexArgs,

    /// Only index the first N corpus items.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Rebuild even if the stored index already covers the corpus.
    #[arg(long)]
    pub force: bool,

    /// Abort on the first unreadable item instead of skipping it.
    #[arg(long)]
    pub strict: bool,

    /// Images handed to the embedder per call.
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("query").required(true).args(["text", "image"])))]
pub struct SearchArgs {
    #[command(flatten)]
    pub dirs: IndexArgs,

    /// Text phrase to search for. Needs a text-capable embedder; the built-in
    /// colour-histogram embedder only accepts image queries.
    #[arg(long)]
    pub text: Option<String>,

    /// Path of an image to search with.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Number of results.
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Print the response as JSON.
    #[arg(long)]
    pub json: bool,
}

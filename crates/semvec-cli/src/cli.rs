//! CLI argument parsing for semvec.
//!
//! Global flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Semantic vector search over text
#[derive(Parser, Debug)]
#[command(name = "semvec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/semvec/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Vocabulary file (tokenizer.json or vocab.txt)
    #[arg(long, global = true)]
    pub vocabulary: Option<String>,

    /// Model directory containing config.json and model.safetensors
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print token ids and attention mask for a text
    Tokenize {
        /// Text to tokenize
        text: String,

        /// Sequence length (default from config)
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Print the embedding vector for a text
    Embed {
        /// Text to embed
        text: String,

        /// Pooling strategy (cls_token, mean_pooling)
        #[arg(short, long)]
        pooling: Option<String>,

        /// L2-normalize the pooled vector
        #[arg(short, long)]
        normalize: bool,
    },

    /// Index a JSONL corpus and query it
    Search {
        /// JSONL file with one {"id": ..., "text": ...} object per line
        #[arg(long)]
        corpus: String,

        /// Index variant (Flat, FlatIP, IVFFlat, IVFPQ, IVFSQ, HNSWFlat)
        #[arg(short, long)]
        index_type: Option<String>,

        /// Neighbors per query
        #[arg(short)]
        k: Option<usize>,

        /// One or more query texts
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// List index variants and whether they need training
    IndexTypes,

    /// Download model files into the local cache
    FetchModel {
        /// Hugging Face repository (default from config)
        #[arg(long)]
        repo: Option<String>,
    },
}

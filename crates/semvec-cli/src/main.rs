//! semvec
//!
//! Tokenize, embed and search text with a BERT-family model.
//!
//! # Usage
//!
//! ```bash
//! semvec tokenize "some text" [--max-length N]
//! semvec embed "some text" [--pooling cls_token|mean_pooling] [--normalize]
//! semvec search --corpus docs.jsonl [-k N] [--index-type Flat] QUERY...
//! semvec index-types
//! semvec fetch-model [--repo ORG/NAME]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/semvec/config.toml)
//! 3. Environment variables (SEMVEC_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use semvec_cli::{
    embed, fetch_model, index_types, init_logging, load_settings, search, tokenize, Cli, Commands,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Tokenize { text, max_length } => {
            tokenize(&settings, &text, max_length)?;
        }
        Commands::Embed {
            text,
            pooling,
            normalize,
        } => {
            embed(&settings, &text, pooling.as_deref(), normalize)?;
        }
        Commands::Search {
            corpus,
            index_type,
            k,
            queries,
        } => {
            search(&settings, &corpus, index_type.as_deref(), k, &queries)?;
        }
        Commands::IndexTypes => {
            index_types()?;
        }
        Commands::FetchModel { repo } => {
            fetch_model(&settings, repo.as_deref())?;
        }
    }

    Ok(())
}

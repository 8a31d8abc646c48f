//! semvec command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (tokenize, embed, search, index-types, fetch-model)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    embed, fetch_model, index_types, init_logging, load_corpus, load_settings, search, tokenize,
    CorpusDocument,
};

//! Command implementations.
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use semvec_embeddings::{
    get_or_download_model, EmbeddingExtractor, EmbeddingModel, ModelCache, ModelPaths,
    PoolingMethod, SubwordTokenizer, Vocabulary,
};
use semvec_types::Settings;
use semvec_vector::{BuiltinEngine, IndexDescriptor, IndexEngine, IndexKind, TextSearcher, VectorIndex};

use crate::cli::Cli;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut settings, cli);
    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(vocabulary) = &cli.vocabulary {
        settings.vocabulary_path = Some(vocabulary.clone());
    }
    if let Some(model) = &cli.model {
        settings.model_path = Some(model.clone());
    }
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}

/// Model files from `model_path`, or from the cache (downloading if needed).
fn resolve_model_paths(settings: &Settings) -> Result<ModelPaths> {
    match settings.expanded_model_path() {
        Some(dir) => {
            let paths = ModelPaths::in_dir(&dir);
            paths
                .ensure_exist()
                .with_context(|| format!("Incomplete model directory {}", dir.display()))?;
            Ok(paths)
        }
        None => {
            let cache = ModelCache::new(settings.expanded_cache_dir(), settings.model_repo.clone());
            get_or_download_model(&cache).context("Failed to fetch model files")
        }
    }
}

fn resolve_vocabulary_path(settings: &Settings, model: Option<&ModelPaths>) -> Result<PathBuf> {
    if let Some(path) = settings.expanded_vocabulary_path() {
        return Ok(path);
    }
    match model {
        Some(paths) => Ok(paths.tokenizer.clone()),
        None => Ok(resolve_model_paths(settings)?.tokenizer),
    }
}

fn build_extractor(
    settings: &Settings,
    normalize: bool,
) -> Result<EmbeddingExtractor<semvec_embeddings::CandleSessionFactory>> {
    let model = resolve_model_paths(settings)?;
    let vocabulary = resolve_vocabulary_path(settings, Some(&model))?;
    let extractor = EmbeddingExtractor::load(&vocabulary, &model, settings.max_sequence_length)
        .context("Failed to load embedding model")?
        .with_normalize(normalize || settings.normalize);
    info!(
        model = %extractor.info().name,
        dim = extractor.info().dimension,
        "Embedding model ready"
    );
    Ok(extractor)
}

#[derive(Serialize)]
struct TokenizeOutput<'a> {
    text: &'a str,
    input_ids: Vec<u32>,
    attention_mask: Vec<u32>,
}

/// Tokenize `text` and print ids plus mask.
pub fn tokenize(settings: &Settings, text: &str, max_length: Option<usize>) -> Result<()> {
    let path = resolve_vocabulary_path(settings, None)?;
    let vocab = Vocabulary::from_file(&path)
        .with_context(|| format!("Failed to load vocabulary from {}", path.display()))?;

    let length = max_length.unwrap_or(settings.max_sequence_length);
    if length == 0 {
        bail!("max length must be greater than zero");
    }
    let sequence = SubwordTokenizer::new(Arc::new(vocab)).tokenize(text, length);

    print_json(&TokenizeOutput {
        text,
        input_ids: sequence.input_ids,
        attention_mask: sequence.attention_mask,
    })
}

#[derive(Serialize)]
struct EmbedOutput {
    pooling: String,
    dimension: usize,
    values: Vec<f32>,
}

/// Embed `text` and print the vector.
///
/// An unrecognized pooling name prints an empty vector.
pub fn embed(settings: &Settings, text: &str, pooling: Option<&str>, normalize: bool) -> Result<()> {
    let extractor = build_extractor(settings, normalize)?;
    let selector = pooling.unwrap_or(&settings.pooling);
    let embedding = extractor
        .embed_with_selector(text, selector)
        .context("Embedding failed")?;

    print_json(&EmbedOutput {
        pooling: selector.to_string(),
        dimension: embedding.dimension(),
        values: embedding.values,
    })
}

/// One line of a JSONL corpus.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusDocument {
    pub id: String,
    pub text: String,
}

/// Read `{"id", "text"}` objects, one per non-blank line.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusDocument>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;

    let mut documents = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: CorpusDocument = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid corpus entry", path.display(), line_no + 1))?;
        documents.push(doc);
    }
    debug!(count = documents.len(), path = %path.display(), "Loaded corpus");
    Ok(documents)
}

/// Index a corpus and print the nearest documents for each query.
///
/// A single query prints a ranked list; several print one list per
/// `QUERY n` label.
pub fn search(
    settings: &Settings,
    corpus: &str,
    index_type: Option<&str>,
    k: Option<usize>,
    queries: &[String],
) -> Result<()> {
    let descriptor: IndexDescriptor = index_type
        .unwrap_or(&settings.index_type)
        .parse()
        .context("Invalid index type")?;
    let k = k.unwrap_or(settings.default_k);

    let documents = load_corpus(Path::new(corpus))?;
    if documents.is_empty() {
        bail!("Corpus {corpus} contains no documents");
    }

    let extractor = Arc::new(build_extractor(settings, false)?.with_pooling(pooling(settings)?));
    let engine = BuiltinEngine::new();
    let index = VectorIndex::create(&engine, extractor.info().dimension, descriptor)
        .with_context(|| format!("Failed to create {descriptor} index"))?;
    let mut searcher = TextSearcher::new(extractor, index)?;

    let pairs: Vec<(&str, &str)> = documents
        .iter()
        .map(|d| (d.id.as_str(), d.text.as_str()))
        .collect();
    let stats = searcher
        .index_documents(&pairs)
        .context("Failed to index corpus")?;
    info!(added = stats.vectors_added, skipped = stats.documents_skipped, "Corpus indexed");

    if let [query] = queries {
        print_json(&searcher.search_text(query, k)?)?;
    } else {
        print_json(&searcher.search_texts(queries, k)?)?;
    }

    searcher.release();
    Ok(())
}

fn pooling(settings: &Settings) -> Result<PoolingMethod> {
    settings
        .pooling
        .parse()
        .with_context(|| format!("Unsupported pooling strategy: {}", settings.pooling))
}

/// Index variant as listed by `index-types`.
#[derive(Debug, Serialize)]
pub struct IndexTypeInfo {
    pub name: &'static str,
    pub requires_training: bool,
    pub supported: bool,
}

pub fn index_type_table(engine: &dyn IndexEngine) -> Vec<IndexTypeInfo> {
    IndexKind::ALL
        .iter()
        .map(|kind| IndexTypeInfo {
            name: kind.factory_string(),
            requires_training: kind.requires_training(),
            supported: engine.supports(kind.factory_string()),
        })
        .collect()
}

pub fn index_types() -> Result<()> {
    print_json(&index_type_table(&BuiltinEngine::new()))
}

#[derive(Serialize)]
struct FetchOutput {
    repo: String,
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

/// Download model files into the cache and print where they landed.
pub fn fetch_model(settings: &Settings, repo: Option<&str>) -> Result<()> {
    let repo = repo.unwrap_or(&settings.model_repo).to_string();
    let cache = ModelCache::new(settings.expanded_cache_dir(), repo.clone());
    let paths = get_or_download_model(&cache).context("Failed to fetch model files")?;

    print_json(&FetchOutput {
        repo,
        config: paths.config,
        tokenizer: paths.tokenizer,
        weights: paths.weights,
    })
}

use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use semvec_vector::{BuiltinEngine, IndexDescriptor, IndexKind, VectorIndex};

const DEFAULT_KINDS: &[IndexKind] = &[
    IndexKind::Flat,
    IndexKind::FlatIP,
    IndexKind::IVFFlat,
    IndexKind::HNSWFlat,
];

#[derive(Parser, Debug)]
#[command(name = "perf_bench", about = "semvec index performance benchmark harness")]
struct Args {
    /// Vectors stored per index
    #[arg(long, default_value_t = 10_000)]
    vectors: usize,
    /// Vector dimensionality
    #[arg(long, default_value_t = 384)]
    dim: usize,
    /// Queries per batched search
    #[arg(long, default_value_t = 100)]
    queries: usize,
    #[arg(short, default_value_t = 10)]
    k: usize,
    /// Index variants to measure (default: every supported one)
    #[arg(long, value_delimiter = ',')]
    kinds: Vec<String>,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Serialize)]
struct KindReport {
    kind: String,
    train_ms: f64,
    add_ms: f64,
    search_ms: f64,
    per_query_us: f64,
    recall_at_1: f64,
}

fn random_buffer(rng: &mut StdRng, n: usize, dim: usize) -> Vec<f32> {
    (0..n * dim).map(|_| rng.random::<f32>()).collect()
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn bench_kind(
    engine: &BuiltinEngine,
    descriptor: IndexDescriptor,
    data: &[f32],
    args: &Args,
) -> Result<KindReport, Box<dyn std::error::Error>> {
    let mut index = VectorIndex::create(engine, args.dim, descriptor)?;

    let start = Instant::now();
    if descriptor.requires_training() {
        index.train(data)?;
    }
    let train_ms = elapsed_ms(start);

    let start = Instant::now();
    index.add(data)?;
    let add_ms = elapsed_ms(start);

    // Query with stored vectors so the expected nearest neighbor is known
    let queries = &data[..args.queries * args.dim];
    let start = Instant::now();
    let batch = index.search(queries, args.k)?;
    let search_ms = elapsed_ms(start);

    let hits = (0..batch.num_queries())
        .filter(|&q| batch.query(q).and_then(|(_, positions)| positions.first()) == Some(&(q as i64)))
        .count();

    index.release();
    Ok(KindReport {
        kind: descriptor.to_string(),
        train_ms,
        add_ms,
        search_ms,
        per_query_us: search_ms * 1000.0 / args.queries as f64,
        recall_at_1: hits as f64 / args.queries as f64,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.queries > args.vectors {
        return Err("--queries must not exceed --vectors".into());
    }

    let descriptors: Vec<IndexDescriptor> = if args.kinds.is_empty() {
        DEFAULT_KINDS.iter().map(|k| IndexDescriptor::from(*k)).collect()
    } else {
        args.kinds
            .iter()
            .map(|k| k.parse())
            .collect::<Result<_, _>>()?
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let data = random_buffer(&mut rng, args.vectors, args.dim);
    let engine = BuiltinEngine::new();

    let mut reports = Vec::new();
    for descriptor in descriptors {
        eprintln!("benchmarking {descriptor} ({} x {})", args.vectors, args.dim);
        reports.push(bench_kind(&engine, descriptor, &data, &args)?);
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

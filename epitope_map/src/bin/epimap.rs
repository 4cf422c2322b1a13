// Copyright (c) 2021 10x Genomics, Inc. All rights reserved.

// epimap map: assign islands and epitopes to a table of responses
// epimap realign: place peptides in a reference protein alignment
//
// Logging goes to stderr and is controlled by RUST_LOG (default info).

use align_tools::{realign_peptides, LazyAlignment};
use anyhow::{Context, Result};
use binding_rank::{AffinityTable, BindingSource};
use clap::{Parser, Subcommand};
use epitope_map::table::{read_peptides, read_responses, write_rows};
use epitope_map::{map_epitopes, MapConfig};
use epitope_types::{IslandMode, RuleKind, SearchMode};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "epimap", version, about = "Map T cell responses to epitopes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find islands and a minimal set of epitopes explaining them
    Map(MapArgs),

    /// Realign peptides to a protein multiple alignment
    Realign(RealignArgs),
}

#[derive(Parser, Debug)]
struct MapArgs {
    /// csv with columns ptid, protein, start, end, seq, RespID
    #[arg(long)]
    responses: PathBuf,

    /// output csv
    #[arg(long)]
    out: PathBuf,

    /// JSON run configuration; the options below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// identical, overlap or hla
    #[arg(long)]
    rule: Option<RuleKind>,

    #[arg(long)]
    min_overlap: Option<usize>,

    #[arg(long)]
    min_shared_aa: Option<usize>,

    /// csv with columns allele, peptide, ic50, for the hla rule
    #[arg(long)]
    binding: Option<PathBuf>,

    #[arg(long, value_delimiter = ',')]
    alleles: Vec<String>,

    #[arg(long)]
    top_pct: Option<f64>,

    #[arg(long)]
    max_island_size: Option<usize>,

    /// exact, greedy or auto
    #[arg(long)]
    search_mode: Option<SearchMode>,

    /// connected or first_match
    #[arg(long)]
    island_mode: Option<IslandMode>,

    /// Do not collapse responses with identical coordinates.
    #[arg(long)]
    no_reduce: bool,

    /// Write one row per response rather than one per (epitope, response).
    #[arg(long)]
    response_indexed: bool,

    /// Also write the island assignment of each response here.
    #[arg(long)]
    islands: Option<PathBuf>,

    /// Also write one summary row per island here.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Also write the islands that could not be searched here.
    #[arg(long)]
    failures: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RealignArgs {
    /// one peptide per line
    #[arg(long)]
    peptides: PathBuf,

    /// fasta alignment, may be gzipped
    #[arg(long)]
    alignment: PathBuf,

    #[arg(long)]
    out: PathBuf,

    /// Shortest sub-peptide tried when a peptide is not found whole.
    #[arg(long, default_value_t = 4)]
    min_len: usize,
}

fn load_config(args: &MapArgs) -> Result<MapConfig> {
    let mut c = match &args.config {
        Some(f) => MapConfig::from_json_file(f)
            .with_context(|| format!("reading config {}", f.display()))?,
        None => MapConfig::default(),
    };
    if let Some(x) = args.rule {
        c.rule.kind = x;
    }
    if let Some(x) = args.min_overlap {
        c.rule.min_overlap = x;
    }
    if let Some(x) = args.min_shared_aa {
        c.rule.min_shared_aa = x;
    }
    if !args.alleles.is_empty() {
        c.rule.alleles = args.alleles.clone();
    }
    if let Some(x) = args.top_pct {
        c.rule.top_pct = x;
    }
    if let Some(x) = args.max_island_size {
        c.max_island_size = x;
    }
    if let Some(x) = args.search_mode {
        c.search_mode = x;
    }
    if let Some(x) = args.island_mode {
        c.island_mode = x;
    }
    if args.no_reduce {
        c.reduce_responses = false;
    }
    if args.response_indexed {
        c.response_indexed = true;
    }
    c.validate()?;
    Ok(c)
}

fn run_map(args: MapArgs) -> Result<()> {
    let config = load_config(&args)?;
    let responses = read_responses(&args.responses)
        .with_context(|| format!("reading responses {}", args.responses.display()))?;
    let table = match &args.binding {
        Some(f) => Some(
            AffinityTable::from_csv(f)
                .with_context(|| format!("reading binding table {}", f.display()))?,
        ),
        None => None,
    };
    let binding = table.as_ref().map(|t| t as &dyn BindingSource);
    let map = map_epitopes(&responses, &config, binding)?;
    if config.response_indexed {
        write_rows(&args.out, &map.responses)?;
    } else {
        write_rows(&args.out, &map.pairs)?;
    }
    if let Some(f) = &args.islands {
        write_rows(f, &map.islands)?;
    }
    if let Some(f) = &args.summary {
        write_rows(f, &map.summaries)?;
    }
    if let Some(f) = &args.failures {
        write_rows(f, &map.failures)?;
    }
    let mut log = Vec::<u8>::new();
    map.summary(&mut log);
    std::io::stdout().write_all(&log)?;
    Ok(())
}

fn run_realign(args: RealignArgs) -> Result<()> {
    let peptides = read_peptides(&args.peptides)
        .with_context(|| format!("reading peptides {}", args.peptides.display()))?;
    let alignment = LazyAlignment::new(&args.alignment)
        .get()
        .with_context(|| format!("reading alignment {}", args.alignment.display()))?;
    let out = realign_peptides(&peptides, &alignment, Some(args.min_len));
    let placed = out.iter().filter(|p| p.is_aligned()).count();
    info!("placed {} of {} peptides", placed, out.len());
    write_rows(&args.out, &out)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Map(args) => run_map(args),
        Commands::Realign(args) => run_realign(args),
    }
}

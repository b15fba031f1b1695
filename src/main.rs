use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use exon_graph_db::alignment::parse_file_stem;
use exon_graph_db::{
    build_database, init_tracing, CollectorOptions, DbSummary, GenomeStore, RawGenomeFile,
    Strand,
};

/// Build or inspect a splice-tolerant exon graph database.
#[derive(Parser, Debug)]
#[command(name = "exon-graph")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a gene database from sim4 alignments of one chromosome/strand
    Build(BuildArgs),

    /// Read a gene database and print summary stats
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Gene database file
    database: PathBuf,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// sim4 alignment file (optionally .gz); the name may encode
    /// chromosome and strand, e.g. `7+.sim4`
    input: PathBuf,

    /// Output gene database file
    output: PathBuf,

    /// Flat chromosome sequence file (byte offset == coordinate)
    #[arg(long, conflicts_with = "genome_dir")]
    genome: Option<PathBuf>,

    /// Directory holding Chr<N>.trie sequence files
    #[arg(long)]
    genome_dir: Option<PathBuf>,

    /// Chromosome number (X = 23, Y = 24); default from the input name
    #[arg(long)]
    chromosome: Option<i32>,

    /// Strand, `+` or `-`; default from the input name
    #[arg(long, value_parser = parse_strand, allow_hyphen_values = true)]
    strand: Option<Strand>,

    /// Maximum genomic reach of one locus, in bases
    #[arg(long, default_value_t = 100_000)]
    span: u32,

    /// Stop codons closer than this many residues are pruned
    #[arg(long, default_value_t = 100)]
    min_orf_len: usize,

    /// Also write the source-ID -> record offset index here
    #[arg(long)]
    source_index: Option<PathBuf>,

    /// Write the same index as tab-separated text
    #[arg(long)]
    source_index_text: Option<PathBuf>,
}

fn parse_strand(s: &str) -> Result<Strand, String> {
    let mut chars = s.chars();
    match (chars.next().and_then(Strand::from_symbol), chars.next()) {
        (Some(strand), None) => Ok(strand),
        _ => Err(format!("expected '+' or '-', got '{s}'")),
    }
}

fn build<G: GenomeStore>(args: &BuildArgs, genome: G, options: CollectorOptions) -> Result<()> {
    let (stats, sources) = build_database(&args.input, &args.output, genome, options)
        .with_context(|| format!("building gene database {}", args.output.display()))?;

    println!("{stats}");
    eprintln!("Gene database written to {}", args.output.display());

    if let Some(path) = &args.source_index {
        sources
            .save(path)
            .with_context(|| format!("writing source index to {}", path.display()))?;
        info!(%sources, path = %path.display(), "source index written");
    }
    if let Some(path) = &args.source_index_text {
        sources
            .save_text(path)
            .with_context(|| format!("writing source index text to {}", path.display()))?;
        info!(ids = sources.len(), path = %path.display(), "source index text written");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Build(args) => {
            let from_name = parse_file_stem(&args.input);
            let chromosome = args.chromosome.or(from_name.map(|(c, _)| c));
            let Some(strand) = args.strand.or(from_name.map(|(_, s)| s)) else {
                bail!(
                    "no strand given and none encoded in {}; pass --strand",
                    args.input.display()
                );
            };

            let mut options = CollectorOptions::default()
                .span(args.span)
                .min_orf_len(args.min_orf_len)
                .strand(strand);
            if let Some(c) = chromosome {
                options = options.chromosome(c);
            }
            info!(?options, input = %args.input.display(), "building");

            match (&args.genome, &args.genome_dir, chromosome) {
                (Some(path), _, _) => build(&args, RawGenomeFile::open(path)?, options)?,
                (None, Some(dir), Some(c)) => {
                    build(&args, RawGenomeFile::open_in_dir(dir, c)?, options)?
                }
                (None, Some(_), None) => {
                    bail!("--genome-dir needs a chromosome (--chromosome or an input like 7+.sim4)")
                }
                (None, None, _) => bail!("pass --genome <file> or --genome-dir <dir>"),
            }
        }

        Command::Stats(args) => {
            let summary = DbSummary::from_path(&args.database)
                .with_context(|| format!("reading {}", args.database.display()))?;
            println!("{summary}");
        }
    }

    Ok(())
}

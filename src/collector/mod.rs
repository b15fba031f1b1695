//! From an ingested interval set to gene records.
//!
//! [`ExonCollector`] walks the pools handed out by [`grouper::LocusGrouper`],
//! consolidates each one, frames and links its exons, and streams the
//! result through a [`GeneWriter`].

pub mod consolidate;
pub mod frames;
pub mod grouper;
pub mod linker;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::alignment::{AlignmentLoader, LoadedAlignments};
use crate::db::{GeneWriter, SourceIndex};
use crate::errors::LocusError;
use crate::genome::GenomeStore;
use crate::model::interval::IntervalSet;
use crate::model::locus::Locus;
use crate::model::types::IntervalId;
use crate::stats::RunStats;
use crate::types::Strand;

pub use grouper::{ActivePool, LocusGrouper};

/// Settings for one chromosome/strand build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorOptions {
    /// Maximum genomic reach of one pool, in bases.
    pub span: u32,

    /// Stop codons closer together than this (in residues) are pruned
    /// along with the residues between them.
    pub min_orf_len: usize,

    pub strand: Strand,

    /// Numeric chromosome (X = 23, Y = 24). Written into every gene header;
    /// also restricts which alignment records are read.
    pub chromosome: Option<i32>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            span: 100_000,
            min_orf_len: 100,
            strand: Strand::Plus,
            chromosome: None,
        }
    }
}

impl CollectorOptions {
    pub fn span(mut self, span: u32) -> Self {
        self.span = span;
        self
    }

    pub fn min_orf_len(mut self, len: usize) -> Self {
        self.min_orf_len = len;
        self
    }

    pub fn strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn chromosome(mut self, chromosome: i32) -> Self {
        self.chromosome = Some(chromosome);
        self
    }

    /// Loader matching these options.
    pub fn loader(&self) -> AlignmentLoader {
        let loader = AlignmentLoader::new(self.strand);
        match self.chromosome {
            Some(c) => loader.chromosome(c),
            None => loader,
        }
    }
}

/// Turns pools of intervals into written gene records.
pub struct ExonCollector<G: GenomeStore> {
    options: CollectorOptions,
    genome: G,
}

impl<G: GenomeStore> ExonCollector<G> {
    pub fn new(options: CollectorOptions, genome: G) -> Self {
        Self { options, genome }
    }

    /// Consolidate one pool, then generate and link its exons.
    ///
    /// A [`LocusError`] inside the returned error means the pool's link
    /// graph was unusable; anything else came from the genome store.
    pub fn build_locus(
        &mut self,
        set: &IntervalSet,
        members: &[IntervalId],
        stats: &mut RunStats,
    ) -> Result<Locus> {
        let mut locus = Locus::from_pool(set, members, self.options.strand);
        stats.links_outside_pool += locus.dropped_links;
        if locus.dropped_links > 0 {
            debug!(dropped = locus.dropped_links, "links leave the pool");
        }

        let report = consolidate::consolidate(&mut locus.intervals)?;
        locus.refresh_order();
        debug!(
            splits = report.splits,
            merges = report.merges,
            intervals = locus.order.len(),
            "pool consolidated"
        );

        stats.empty_intervals +=
            frames::generate_exons(&mut locus, &mut self.genome, self.options.min_orf_len)?;
        let links = linker::link_exons(&mut locus)?;
        stats.double_links += links.double_links;
        stats.links_outside_pool += links.skipped;
        Ok(locus)
    }

    /// Group, consolidate and write every locus of `set`.
    pub fn write_genes<W: Write>(&mut self, set: &IntervalSet, out: W) -> Result<RunStats> {
        let mut stats = RunStats::new();
        stats.intervals_ingested = set.len();
        let chromosome = self.options.chromosome.unwrap_or(0);
        let mut writer = GeneWriter::new(out);

        for pool in LocusGrouper::new(set, self.options.span) {
            stats.pools += 1;
            let mut locus = match self.build_locus(set, &pool.members, &mut stats) {
                Ok(locus) => locus,
                Err(e) => match e.downcast_ref::<LocusError>() {
                    Some(bad) => {
                        warn!(
                            pool = stats.pools - 1,
                            members = pool.members.len(),
                            error = %bad,
                            "dropping locus"
                        );
                        stats.failed_loci += 1;
                        continue;
                    }
                    None => return Err(e),
                },
            };
            if locus.exons.is_empty() {
                debug!(pool = stats.pools - 1, "locus has no exons");
                continue;
            }
            writer.write_gene(&mut locus, chromosome, &mut stats)?;
        }
        writer.flush()?;

        info!(
            genes = stats.loci_written,
            failed = stats.failed_loci,
            exons = stats.exons_written,
            "genes written"
        );
        Ok(stats)
    }

    /// Write the genes of already loaded alignments to `output`.
    pub fn run(&mut self, loaded: &LoadedAlignments, output: &Path) -> Result<RunStats> {
        let file = File::create(output)
            .with_context(|| format!("create gene database {}", output.display()))?;
        let mut stats = RunStats {
            records_read: loaded.records_read,
            records_skipped: loaded.records_skipped,
            ..RunStats::default()
        };
        stats.merge(&self.write_genes(&loaded.intervals, BufWriter::new(file))?);
        Ok(stats)
    }
}

/// Read `input` (sim4, optionally gzipped), build the gene database at
/// `output`, and return the run statistics along with the source index.
pub fn build_database<G: GenomeStore>(
    input: &Path,
    output: &Path,
    genome: G,
    options: CollectorOptions,
) -> Result<(RunStats, SourceIndex)> {
    let loaded = options
        .loader()
        .load_from_path(input)
        .with_context(|| format!("reading alignments from {}", input.display()))?;
    let stats = ExonCollector::new(options, genome).run(&loaded, output)?;
    Ok((stats, loaded.source_index))
}

use std::collections::BTreeMap;
use std::fmt;

/// Counters and histograms gathered over one build.
///
/// Each build owns its own `RunStats`; separate runs (one per
/// chromosome/strand) are combined with [`RunStats::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub records_read: usize,
    pub records_skipped: usize,
    pub intervals_ingested: usize,
    pub pools: usize,
    pub loci_written: usize,
    /// Loci abandoned because their link graph was inconsistent.
    pub failed_loci: usize,
    pub exons_written: usize,
    /// Link ends that pointed outside the locus they were found in.
    pub links_outside_pool: usize,
    /// Intervals that produced no exons and were left out.
    pub empty_intervals: usize,
    pub double_links: usize,
    /// Translated sequence length -> number of exons.
    pub sequence_lengths: BTreeMap<usize, u64>,
    /// Forward link count -> number of exons.
    pub edge_counts: BTreeMap<usize, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_exon(&mut self, sequence_len: usize, forward_links: usize) {
        *self.sequence_lengths.entry(sequence_len).or_default() += 1;
        *self.edge_counts.entry(forward_links).or_default() += 1;
        self.exons_written += 1;
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.records_read += other.records_read;
        self.records_skipped += other.records_skipped;
        self.intervals_ingested += other.intervals_ingested;
        self.pools += other.pools;
        self.loci_written += other.loci_written;
        self.failed_loci += other.failed_loci;
        self.exons_written += other.exons_written;
        self.links_outside_pool += other.links_outside_pool;
        self.empty_intervals += other.empty_intervals;
        self.double_links += other.double_links;
        for (&k, &v) in &other.sequence_lengths {
            *self.sequence_lengths.entry(k).or_default() += v;
        }
        for (&k, &v) in &other.edge_counts {
            *self.edge_counts.entry(k).or_default() += v;
        }
    }
}

fn write_histogram(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    histogram: &BTreeMap<usize, u64>,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    let total: u64 = histogram.values().sum();
    for (key, &count) in histogram {
        let pct = if total == 0 {
            0.0
        } else {
            100.0 * count as f64 / total as f64
        };
        writeln!(f, "{key}: {count} ({pct:.2}%)")?;
    }
    Ok(())
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run: {} records read ({} skipped), {} intervals, {} pools",
            self.records_read, self.records_skipped, self.intervals_ingested, self.pools
        )?;
        writeln!(
            f,
            "  - {} genes written, {} failed, {} exons",
            self.loci_written, self.failed_loci, self.exons_written
        )?;
        writeln!(
            f,
            "  - {} links outside their pool, {} intervals without exons, {} double links",
            self.links_outside_pool, self.empty_intervals, self.double_links
        )?;
        write_histogram(f, "Sequence Lengths", &self.sequence_lengths)?;
        write_histogram(f, "Edge count histogram", &self.edge_counts)
    }
}

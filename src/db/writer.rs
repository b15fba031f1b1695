use std::io::Write;

use tracing::debug;

use crate::errors::DbError;
use crate::model::locus::Locus;
use crate::model::types::SourceId;
use crate::stats::RunStats;

/// Bytes in each of the two name fields of a gene header.
pub const NAME_LEN: usize = 256;
/// Source IDs written per gene header; unused slots hold -1.
pub const SOURCE_ID_SLOTS: usize = 10;
/// Bytes in the prefix and in the suffix field of an exon.
pub const FRAGMENT_LEN: usize = 2;

/// Human-readable gene name written into the header.
pub fn gene_name(locus: &Locus, chromosome: i32, record: usize) -> String {
    let (start, end) = locus.bounds().map_or((0, 0), |s| (s.start, s.end));
    format!(
        "{}{} Gene {} of {} exons, {} intervals from {} to {}",
        chromosome,
        locus.strand.symbol(),
        record,
        locus.exons.len(),
        locus.order.len(),
        start,
        end
    )
}

fn name_field(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(NAME_LEN - 1);
    field[..n].copy_from_slice(&bytes[..n]);
    field
}

fn fragment_field(bases: &[u8]) -> [u8; FRAGMENT_LEN] {
    let mut field = [b' '; FRAGMENT_LEN];
    for (slot, &b) in field.iter_mut().zip(bases) {
        *slot = b;
    }
    field
}

fn to_i32<T: TryInto<i32>>(value: T, gene: usize, what: &str) -> Result<i32, DbError> {
    value.try_into().map_err(|_| DbError::Invalid {
        gene,
        reason: format!("{what} does not fit in a 32-bit field"),
    })
}

/// Appends gene records to a byte stream.
///
/// Layout per gene (all integers little-endian `i32`):
/// - name (256 bytes, NUL padded), written twice
/// - chromosome, exon count, then 10 source IDs (-1 when unused)
/// - per exon: start, end, sequence length, occurrences, the residues,
///   2-byte prefix, 2-byte suffix (space padded), backward and forward
///   link counts, then per backward link: partner exon index, weight and a
///   one-byte amino acid (NUL when none)
pub struct GeneWriter<W: Write> {
    out: W,
    genes_written: usize,
}

impl<W: Write> GeneWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            genes_written: 0,
        }
    }

    pub fn genes_written(&self) -> usize {
        self.genes_written
    }

    /// Write one locus. Exon sequences are released once written.
    pub fn write_gene(
        &mut self,
        locus: &mut Locus,
        chromosome: i32,
        stats: &mut RunStats,
    ) -> Result<(), DbError> {
        let gene = self.genes_written;
        let name = gene_name(locus, chromosome, gene);
        let field = name_field(&name);
        self.out.write_all(&field)?;
        self.out.write_all(&field)?;

        self.out.write_all(&chromosome.to_le_bytes())?;
        self.out
            .write_all(&to_i32(locus.exons.len(), gene, "exon count")?.to_le_bytes())?;

        let ids: Vec<SourceId> = locus.source_ids();
        for slot in 0..SOURCE_ID_SLOTS {
            let id = ids.get(slot).copied().unwrap_or(-1);
            self.out.write_all(&id.to_le_bytes())?;
        }

        for &id in &locus.order {
            let range = locus.exon_range(id);
            let occurrences = to_i32(locus.intervals[id].occurrences, gene, "occurrences")?;
            for exon in &mut locus.exons[range] {
                let header = [
                    to_i32(exon.span.start, gene, "exon start")?,
                    to_i32(exon.span.end, gene, "exon end")?,
                    to_i32(exon.sequence.len(), gene, "sequence length")?,
                    occurrences,
                ];
                for v in header {
                    self.out.write_all(&v.to_le_bytes())?;
                }
                self.out.write_all(&exon.sequence)?;
                self.out.write_all(&fragment_field(&exon.prefix))?;
                self.out.write_all(&fragment_field(&exon.suffix))?;
                self.out
                    .write_all(&to_i32(exon.backward.len(), gene, "backward links")?.to_le_bytes())?;
                self.out
                    .write_all(&to_i32(exon.forward.len(), gene, "forward links")?.to_le_bytes())?;
                for link in &exon.backward {
                    self.out
                        .write_all(&to_i32(link.target, gene, "partner index")?.to_le_bytes())?;
                    self.out.write_all(&link.kind.weight().to_le_bytes())?;
                    self.out.write_all(&[link.amino_acid.unwrap_or(0)])?;
                }

                stats.record_exon(exon.sequence.len(), exon.forward.len());
                exon.sequence = Vec::new();
            }
        }

        debug!(gene, exons = locus.exons.len(), %name, "gene written");
        self.genes_written += 1;
        stats.loci_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), DbError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W, DbError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

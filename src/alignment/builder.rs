use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::alignment::io::{AlignmentRecord, ParseError, Sim4Reader};
use crate::db::SourceIndex;
use crate::model::interval::{Interval, IntervalSet};
use crate::model::types::LinkKind;
use crate::types::{Span, Strand};

/// Everything ingested from one alignment file.
#[derive(Debug, Clone, Default)]
pub struct LoadedAlignments {
    pub intervals: IntervalSet,
    pub source_index: SourceIndex,
    pub records_read: usize,
    pub records_skipped: usize,
}

/// Turns sim4 alignments for one chromosome/strand into an [`IntervalSet`].
///
/// Every distinct aligned block becomes one interval; seeing it again bumps
/// its occurrence count. Consecutive blocks of one alignment add a splice
/// link between their intervals.
#[derive(Debug, Clone)]
pub struct AlignmentLoader {
    pub strand: Strand,
    /// Only keep records on this chromosome (None keeps all).
    pub chromosome: Option<i32>,
}

impl AlignmentLoader {
    pub fn new(strand: Strand) -> Self {
        Self {
            strand,
            chromosome: None,
        }
    }

    pub fn chromosome(mut self, chromosome: i32) -> Self {
        self.chromosome = Some(chromosome);
        self
    }

    fn accepts(&self, rec: &AlignmentRecord) -> bool {
        rec.is_usable()
            && rec.strand == Some(self.strand)
            && self.chromosome.map_or(true, |c| c == rec.chromosome)
            && !rec.blocks.is_empty()
    }

    /// Load from anything implementing `BufRead`.
    pub fn load_from_reader<R: BufRead>(&self, reader: R) -> Result<LoadedAlignments, ParseError> {
        let mut out = LoadedAlignments::default();
        let mut by_span: HashMap<Span, usize> = HashMap::new();

        for rec in Sim4Reader::new(reader).records() {
            let rec = rec?;
            out.records_read += 1;
            if !self.accepts(&rec) {
                debug!(line = rec.line_no, "skipping alignment record");
                out.records_skipped += 1;
                continue;
            }
            let Some(source_id) = rec.source_id else { continue };
            out.source_index.record(source_id, rec.offset);

            let mut previous = None;
            for &block in &rec.blocks {
                let id = *by_span
                    .entry(block)
                    .or_insert_with(|| out.intervals.insert(Interval::new(block, 0)));
                let iv = &mut out.intervals[id];
                iv.occurrences += 1;
                iv.add_source_id(source_id);

                if let Some(prev) = previous {
                    if prev != id {
                        out.intervals.link(prev, id, LinkKind::Splice(1));
                    }
                }
                previous = Some(id);
            }
        }

        info!(
            records = out.records_read,
            skipped = out.records_skipped,
            intervals = out.intervals.len(),
            "alignments loaded"
        );
        Ok(out)
    }

    /// Load from a file path.
    ///
    /// - If path ends with `.gz`, uses the gzip decoder.
    /// - Otherwise reads as plain text.
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<LoadedAlignments, ParseError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ParseError::IoPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_gz = path.extension().map(|e| e == "gz").unwrap_or(false);
        let result = if is_gz {
            let decoder = flate2::read::GzDecoder::new(file);
            self.load_from_reader(BufReader::new(decoder))
        } else {
            self.load_from_reader(BufReader::new(file))
        };

        // Attach the real path to reader-level I/O failures.
        result.map_err(|e| match e {
            ParseError::IoPath { source, .. } => ParseError::IoPath {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn record(gi: i32, chrom: &str, dir: &str, blocks: &[(u32, u32)]) -> String {
        let mut s = format!(
            "sim4begin\n1[500-0-0] 0[1001-9000] <300-0-99-{dir}-unknown>\nedef=>gi|{gi}|gb|X\nddef=>{chrom} test\n"
        );
        for &(a, b) in blocks {
            s.push_str(&format!("1-10 ({a}-{b}) <10-0-100>\n"));
        }
        s.push_str("sim4end\n");
        s
    }

    #[test]
    fn repeated_blocks_accumulate_occurrences_and_links() {
        // GStart = 1001, so (g1-g2) maps to [1000 + g1, 1001 + g2)
        let text = [
            record(1, "chr5", "forward", &[(1, 100), (201, 300)]),
            record(2, "chr5", "forward", &[(1, 100), (201, 300)]),
            record(3, "chr5", "forward", &[(1, 100), (401, 450)]),
        ]
        .concat();

        let loaded = AlignmentLoader::new(Strand::Plus)
            .chromosome(5)
            .load_from_reader(Cursor::new(text))
            .unwrap();

        assert_eq!(loaded.records_read, 3);
        assert_eq!(loaded.records_skipped, 0);
        let set = &loaded.intervals;
        assert_eq!(set.len(), 3);

        let first = set.iter().find(|(_, iv)| iv.span == Span::new(1001, 1101)).unwrap();
        assert_eq!(first.1.occurrences, 3);
        assert_eq!(first.1.source_ids, vec![1, 2, 3]);
        assert_eq!(first.1.forward.len(), 2);

        let second = set.iter().find(|(_, iv)| iv.span == Span::new(1201, 1301)).unwrap();
        assert_eq!(first.1.forward_kind(second.0), Some(LinkKind::Splice(2)));
        assert_eq!(second.1.backward_kind(first.0), Some(LinkKind::Splice(2)));

        assert_eq!(loaded.source_index.len(), 3);
    }

    #[test]
    fn other_strands_and_chromosomes_are_skipped() {
        let text = [
            record(1, "chr5", "complement", &[(1, 100)]),
            record(2, "chr6", "forward", &[(1, 100)]),
            record(3, "chr5", "forward", &[(1, 100)]),
        ]
        .concat();
        let loaded = AlignmentLoader::new(Strand::Plus)
            .chromosome(5)
            .load_from_reader(Cursor::new(text))
            .unwrap();
        assert_eq!(loaded.records_skipped, 2);
        assert_eq!(loaded.intervals.len(), 1);
        assert_eq!(loaded.source_index.offsets(3).len(), 1);
    }

    #[test]
    fn gzipped_input_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("5+.sim4.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        gz.write_all(record(9, "chr5", "forward", &[(1, 50), (61, 90)]).as_bytes())
            .unwrap();
        gz.finish().unwrap();

        let loaded = AlignmentLoader::new(Strand::Plus).load_from_path(&path).unwrap();
        assert_eq!(loaded.intervals.len(), 2);
        assert_eq!(loaded.intervals.edges().len(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AlignmentLoader::new(Strand::Plus)
            .load_from_path("/definitely/not/here.sim4")
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.sim4"));
    }
}

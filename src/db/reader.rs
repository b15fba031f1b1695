use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::db::writer::{FRAGMENT_LEN, NAME_LEN, SOURCE_ID_SLOTS};
use crate::errors::DbError;
use crate::model::types::{LinkKind, SourceId};

/// One backward edge as stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRecord {
    pub partner: usize,
    pub kind: LinkKind,
    pub amino_acid: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonRecord {
    pub start: u32,
    pub end: u32,
    pub occurrences: u32,
    pub sequence: Vec<u8>,
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
    pub backward: Vec<LinkRecord>,
    pub forward_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub name: String,
    pub chromosome: i32,
    /// Used source-ID slots only.
    pub source_ids: Vec<SourceId>,
    pub exons: Vec<ExonRecord>,
}

fn trim_padding(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|&b| b != 0 && b != b' ')
        .collect()
}

/// Streams [`GeneRecord`]s back out of a database file.
pub struct GeneReader<R: Read> {
    inner: R,
    genes_read: usize,
}

impl<R: Read> GeneReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            genes_read: 0,
        }
    }

    fn exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), DbError> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => DbError::Truncated {
                gene: self.genes_read,
                what,
            },
            _ => DbError::Io(e),
        })
    }

    fn i32(&mut self, what: &'static str) -> Result<i32, DbError> {
        let mut b = [0u8; 4];
        self.exact(&mut b, what)?;
        Ok(i32::from_le_bytes(b))
    }

    fn count(&mut self, what: &'static str) -> Result<usize, DbError> {
        let v = self.i32(what)?;
        usize::try_from(v).map_err(|_| DbError::Invalid {
            gene: self.genes_read,
            reason: format!("negative {what}: {v}"),
        })
    }

    fn coordinate(&mut self, what: &'static str) -> Result<u32, DbError> {
        let v = self.i32(what)?;
        u32::try_from(v).map_err(|_| DbError::Invalid {
            gene: self.genes_read,
            reason: format!("negative {what}: {v}"),
        })
    }

    /// Read exactly `len` bytes, growing the buffer only as data arrives.
    fn bytes(&mut self, len: usize, what: &'static str) -> Result<Vec<u8>, DbError> {
        let mut buf = Vec::new();
        let got = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(DbError::Io)?;
        if got < len {
            return Err(DbError::Truncated {
                gene: self.genes_read,
                what,
            });
        }
        Ok(buf)
    }

    /// Fill `buf` unless the stream is already at its end.
    fn fill_or_eof(&mut self, buf: &mut [u8]) -> Result<bool, DbError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DbError::Io(e)),
            }
        }
        match filled {
            0 => Ok(false),
            n if n == buf.len() => Ok(true),
            _ => Err(DbError::Truncated {
                gene: self.genes_read,
                what: "gene name",
            }),
        }
    }

    /// Next gene, or None at a clean end of stream.
    pub fn read_gene(&mut self) -> Result<Option<GeneRecord>, DbError> {
        let gene = self.genes_read;
        let mut name = [0u8; NAME_LEN];
        if !self.fill_or_eof(&mut name)? {
            return Ok(None);
        }
        let mut copy = [0u8; NAME_LEN];
        self.exact(&mut copy, "second gene name")?;
        if copy != name {
            return Err(DbError::Invalid {
                gene,
                reason: "name fields differ".to_string(),
            });
        }
        let end = name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name[..end]).into_owned();

        let chromosome = self.i32("chromosome")?;
        let exon_count = self.count("exon count")?;
        let mut source_ids = Vec::new();
        for _ in 0..SOURCE_ID_SLOTS {
            let id = self.i32("source id")?;
            if id != -1 {
                source_ids.push(id);
            }
        }

        // counts come from the file, so nothing is reserved up front
        let mut exons = Vec::new();
        for _ in 0..exon_count {
            let start = self.coordinate("exon start")?;
            let end = self.coordinate("exon end")?;
            let seq_len = self.count("sequence length")?;
            let occurrences = self.coordinate("occurrences")?;
            let sequence = self.bytes(seq_len, "sequence")?;
            let mut prefix = [0u8; FRAGMENT_LEN];
            self.exact(&mut prefix, "prefix")?;
            let mut suffix = [0u8; FRAGMENT_LEN];
            self.exact(&mut suffix, "suffix")?;
            let backward_count = self.count("backward link count")?;
            let forward_count = self.count("forward link count")?;

            let mut backward = Vec::new();
            for _ in 0..backward_count {
                let partner = self.count("partner index")?;
                if partner >= exon_count {
                    return Err(DbError::Invalid {
                        gene,
                        reason: format!("partner exon {partner} out of {exon_count}"),
                    });
                }
                let kind = LinkKind::from_weight(self.i32("link weight")?);
                let mut aa = [0u8; 1];
                self.exact(&mut aa, "amino acid")?;
                backward.push(LinkRecord {
                    partner,
                    kind,
                    amino_acid: (aa[0] != 0).then_some(aa[0]),
                });
            }

            exons.push(ExonRecord {
                start,
                end,
                occurrences,
                sequence,
                prefix: trim_padding(&prefix),
                suffix: trim_padding(&suffix),
                backward,
                forward_count,
            });
        }

        self.genes_read += 1;
        Ok(Some(GeneRecord {
            name,
            chromosome,
            source_ids,
            exons,
        }))
    }
}

impl<R: Read> Iterator for GeneReader<R> {
    type Item = Result<GeneRecord, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_gene().transpose()
    }
}

/// Whole-file totals, as printed by `exon-graph stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbSummary {
    pub genes: usize,
    pub exons: usize,
    pub backward_links: usize,
    pub forward_links: usize,
    pub residues: usize,
    /// Name and exon count of the gene with the most exons.
    pub largest: Option<(String, usize)>,
}

impl DbSummary {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DbError> {
        let mut summary = DbSummary::default();
        for gene in GeneReader::new(reader) {
            let gene = gene?;
            summary.genes += 1;
            summary.exons += gene.exons.len();
            for exon in &gene.exons {
                summary.backward_links += exon.backward.len();
                summary.forward_links += exon.forward_count;
                summary.residues += exon.sequence.len();
            }
            let bigger = summary
                .largest
                .as_ref()
                .map_or(true, |(_, n)| gene.exons.len() > *n);
            if bigger {
                summary.largest = Some((gene.name, gene.exons.len()));
            }
        }
        Ok(summary)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("read gene database {}", path.display()))
    }
}

impl fmt::Display for DbSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "GeneDb: {} genes, {} exons, {} links, {} residues",
            self.genes, self.exons, self.backward_links, self.residues
        )?;
        if self.forward_links != self.backward_links {
            writeln!(
                f,
                "  ! forward link total {} does not match backward total {}",
                self.forward_links, self.backward_links
            )?;
        }
        match &self.largest {
            Some((name, n)) => writeln!(f, "  - largest gene: {name} ({n} exons)"),
            None => writeln!(f, "  - database is empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::frames::generate_exons;
    use crate::collector::linker::link_exons;
    use crate::db::writer::GeneWriter;
    use crate::genome::InMemoryGenome;
    use crate::model::interval::{Interval, IntervalSet};
    use crate::model::locus::Locus;
    use crate::stats::RunStats;
    use crate::types::{Span, Strand};
    use std::io::Cursor;

    fn database() -> Vec<u8> {
        let mut set = IntervalSet::new();
        set.insert(Interval::new(Span::new(0, 4), 2));
        set.insert(Interval::new(Span::new(10, 16), 1));
        set[0].add_source_id(5);
        set[1].add_source_id(6);
        set.link(0, 1, LinkKind::Splice(2));
        let mut locus = Locus::from_pool(&set, &[0, 1], Strand::Plus);
        let mut genome = InMemoryGenome::new(b"ATGGNNNNNNCCTTAA".to_vec());
        generate_exons(&mut locus, &mut genome, 100).unwrap();
        link_exons(&mut locus).unwrap();

        let mut w = GeneWriter::new(Vec::new());
        let mut stats = RunStats::new();
        w.write_gene(&mut locus.clone(), 3, &mut stats).unwrap();
        w.write_gene(&mut locus, 3, &mut stats).unwrap();
        w.into_inner().unwrap()
    }

    #[test]
    fn reads_back_written_genes() {
        let genes: Vec<GeneRecord> = GeneReader::new(Cursor::new(database()))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(genes.len(), 2);
        assert!(genes[1].name.starts_with("3+ Gene 1 of 6 exons"));

        let g = &genes[0];
        assert_eq!(g.chromosome, 3);
        assert_eq!(g.source_ids, vec![5, 6]);
        assert_eq!(g.exons.len(), 6);
        assert_eq!(g.exons[0].sequence, b"M".to_vec());
        assert_eq!(g.exons[0].suffix, b"G".to_vec());
        assert!(g.exons[0].prefix.is_empty());
        assert_eq!(g.exons[0].occurrences, 2);

        // B frame 2 (exon 5) is reached from A frame 0 through "G" + "CC"
        assert_eq!(
            g.exons[5].backward,
            vec![LinkRecord {
                partner: 0,
                kind: LinkKind::Splice(2),
                amino_acid: Some(b'A'),
            }]
        );
        assert_eq!(g.exons[4].backward[0].partner, 2);
    }

    #[test]
    fn truncated_stream_is_reported() {
        let mut bytes = database();
        bytes.truncate(bytes.len() - 3);
        let err = GeneReader::new(Cursor::new(bytes))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert!(matches!(err, DbError::Truncated { gene: 1, .. }));
    }

    #[test]
    fn huge_counts_in_a_short_file_are_truncation_errors() {
        let mut header = vec![0u8; 2 * NAME_LEN];
        header.extend_from_slice(&3i32.to_le_bytes());
        header.extend_from_slice(&i32::MAX.to_le_bytes());
        for _ in 0..SOURCE_ID_SLOTS {
            header.extend_from_slice(&(-1i32).to_le_bytes());
        }
        let err = GeneReader::new(Cursor::new(header.clone()))
            .read_gene()
            .unwrap_err();
        assert!(matches!(err, DbError::Truncated { what: "exon start", .. }));

        // one exon claiming a huge sequence
        let mut bytes = header;
        bytes[2 * NAME_LEN + 4..2 * NAME_LEN + 8].copy_from_slice(&1i32.to_le_bytes());
        for v in [0i32, 10, i32::MAX, 1] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(b"MK");
        let err = GeneReader::new(Cursor::new(bytes)).read_gene().unwrap_err();
        assert!(matches!(err, DbError::Truncated { what: "sequence", .. }));
    }

    #[test]
    fn summary_totals() {
        let summary = DbSummary::from_reader(Cursor::new(database())).unwrap();
        assert_eq!(summary.genes, 2);
        assert_eq!(summary.exons, 12);
        assert_eq!(summary.backward_links, 6);
        assert_eq!(summary.forward_links, 6);
        assert_eq!(summary.largest.as_ref().map(|(_, n)| *n), Some(6));
        assert!(summary.to_string().starts_with("GeneDb: 2 genes, 12 exons, 6 links"));
    }

    #[test]
    fn empty_stream_has_no_genes() {
        let summary = DbSummary::from_reader(Cursor::new(Vec::new())).unwrap();
        assert_eq!(summary, DbSummary::default());
    }
}

use std::io::BufRead;
use std::path::Path;

use thiserror::Error;

use crate::model::types::SourceId;
use crate::types::{Span, Strand};

/// Parsing errors for sim4 alignment files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error while reading '{path}': {source}")]
    IoPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sim4 line {line_no} ({problem}): {line}")]
    MalformedLine {
        line_no: usize,
        problem: &'static str,
        line: String,
    },
    #[error("bad coordinates on sim4 line {line_no}: {line}")]
    BadCoordinates { line_no: usize, line: String },
}

/// Number assigned to a chromosome name (`chr1`..`chr22`, `chrX` = 23,
/// `chrY` = 24). Unknown names map to 0.
pub fn chromosome_number(name: &str) -> i32 {
    match name {
        "chrX" => 23,
        "chrY" => 24,
        _ => name
            .strip_prefix("chr")
            .and_then(|n| n.parse::<i32>().ok())
            .filter(|n| (1..=22).contains(n))
            .unwrap_or(0),
    }
}

/// Chromosome and strand encoded in an alignment file name: everything
/// before the first `.` is `<chromosome><+|->`, e.g. `7+.sim4` or
/// `X-.sim4.gz`.
pub fn parse_file_stem(path: &Path) -> Option<(i32, Strand)> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next()?;
    let mut chars = stem.chars();
    let strand = Strand::from_symbol(chars.next_back()?)?;
    let chromosome = match chars.as_str() {
        "X" => 23,
        "Y" => 24,
        n => n.parse::<i32>().ok()?,
    };
    Some((chromosome, strand))
}

/// One cDNA-to-genome alignment.
///
/// `strand` and `source_id` are None when the record's header lines were
/// unusable; such records carry no blocks and are skipped by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    /// Byte offset of the `sim4begin` line.
    pub offset: u64,
    pub line_no: usize,
    pub source_id: Option<SourceId>,
    pub chromosome: i32,
    pub strand: Option<Strand>,
    /// Aligned genome blocks, in file order.
    pub blocks: Vec<Span>,
}

impl AlignmentRecord {
    pub fn is_usable(&self) -> bool {
        self.strand.is_some() && self.source_id.is_some()
    }
}

/// Record under construction; fed one line at a time.
#[derive(Debug)]
struct PartialRecord {
    record: AlignmentRecord,
    lines_seen: usize,
    genome_start: u32,
    abandoned: bool,
}

impl PartialRecord {
    fn new(offset: u64, line_no: usize) -> Self {
        Self {
            record: AlignmentRecord {
                offset,
                line_no,
                source_id: None,
                chromosome: 0,
                strand: None,
                blocks: Vec::new(),
            },
            lines_seen: 0,
            genome_start: 0,
            abandoned: false,
        }
    }

    fn feed(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        if self.abandoned {
            return Ok(());
        }
        self.lines_seen += 1;
        match self.lines_seen {
            1 => self.parse_header(line, line_no),
            2 => self.parse_source(line, line_no),
            3 => {
                // "ddef=>chr7 ..." : drop the 6-char tag
                let token = line.split_whitespace().next().unwrap_or("");
                self.record.chromosome = chromosome_number(token.get(6..).unwrap_or(""));
                Ok(())
            }
            _ => self.parse_block(line, line_no),
        }
    }

    // "2[339-0-0] 0[227615646-227622915] <279-0-96-forward-unknown>"
    fn parse_header(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        let pieces: Vec<&str> = line.split('-').collect();
        if pieces.len() < 7 {
            self.abandoned = true;
            return Ok(());
        }
        let Some(strand) = Strand::from_sim4_direction(pieces[6]) else {
            self.abandoned = true;
            return Ok(());
        };

        let malformed = || ParseError::MalformedLine {
            line_no,
            problem: "expected a second [start-end] genome range",
            line: line.to_string(),
        };
        let first = line.find('[').ok_or_else(malformed)?;
        let second = line[first + 1..].find('[').map(|p| p + first + 1).ok_or_else(malformed)?;
        let close = line[second..].find(']').map(|p| p + second).ok_or_else(malformed)?;
        let start = line[second + 1..close]
            .split('-')
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| ParseError::BadCoordinates {
                line_no,
                line: line.to_string(),
            })?;

        self.genome_start = start;
        self.record.strand = Some(strand);
        Ok(())
    }

    // "edef=>gi|12345|gb|..."
    fn parse_source(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        let id = line
            .split('|')
            .nth(1)
            .and_then(|s| s.trim().parse::<SourceId>().ok())
            .ok_or_else(|| ParseError::MalformedLine {
                line_no,
                problem: "expected gi|<number>| source id",
                line: line.to_string(),
            })?;
        self.record.source_id = Some(id);
        Ok(())
    }

    // "377-622 (117076-117321) <246-0-100> ->"
    fn parse_block(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        let (Some(open), Some(close)) = (line.find('('), line.find(')')) else {
            return Err(ParseError::MalformedLine {
                line_no,
                problem: "expected (start-end) block coordinates",
                line: line.to_string(),
            });
        };
        let bad = || ParseError::BadCoordinates {
            line_no,
            line: line.to_string(),
        };
        if close < open {
            return Err(bad());
        }
        let mut coords = line[open + 1..close].split('-').map(|s| s.trim().parse::<u32>());
        let (Some(Ok(from)), Some(Ok(to))) = (coords.next(), coords.next()) else {
            return Err(bad());
        };
        if from == 0 || to < from {
            return Err(bad());
        }
        let start = self.genome_start.checked_add(from - 1).ok_or_else(bad)?;
        let end = self.genome_start.checked_add(to).ok_or_else(bad)?;
        self.record.blocks.push(Span::new(start, end));
        Ok(())
    }

    fn finish(self) -> Option<AlignmentRecord> {
        if self.lines_seen == 0 {
            return None;
        }
        let mut record = self.record;
        if self.abandoned {
            record.strand = None;
            record.blocks.clear();
        }
        Some(record)
    }
}

/// Streaming parser for sim4 "polishes" alignment files.
///
/// Records start at a `sim4begin` line and end at `sim4end` (or at the next
/// `sim4begin`/EOF). Text outside records is ignored.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use exon_graph_db::alignment::io::Sim4Reader;
///
/// let text = "\
/// sim4begin
/// 1[300-0-0] 0[1000-2000] <200-0-99-forward-unknown>
/// edef=>gi|42|gb|AA000001
/// ddef=>chr7 assembled
/// 1-100 (11-110) <100-0-100> ->
/// 101-200 (511-610) <100-0-100>
/// sim4end
/// ";
/// let recs: Vec<_> = Sim4Reader::new(Cursor::new(text))
///     .records()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(recs.len(), 1);
/// assert_eq!(recs[0].source_id, Some(42));
/// assert_eq!(recs[0].chromosome, 7);
/// assert_eq!(recs[0].blocks[0].start, 1010);
/// assert_eq!(recs[0].blocks[0].end, 1110);
/// ```
pub struct Sim4Reader<R: BufRead> {
    reader: R,
    buf: String,
    offset: u64,
    line_no: usize,
}

impl<R: BufRead> Sim4Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            offset: 0,
            line_no: 0,
        }
    }

    /// Returns an iterator over parsed records.
    pub fn records(mut self) -> impl Iterator<Item = Result<AlignmentRecord, ParseError>> {
        let mut pending: Option<PartialRecord> = None;
        std::iter::from_fn(move || loop {
            self.buf.clear();
            let line_offset = self.offset;
            let n = match self.reader.read_line(&mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    pending = None;
                    return Some(Err(ParseError::IoPath {
                        path: "<reader>".to_string(),
                        source: e,
                    }));
                }
            };
            if n == 0 {
                return pending.take().and_then(PartialRecord::finish).map(Ok);
            }
            self.offset += n as u64;
            self.line_no += 1;

            let line = self.buf.trim();
            if line == "sim4begin" {
                let done = pending.replace(PartialRecord::new(line_offset, self.line_no));
                if let Some(rec) = done.and_then(PartialRecord::finish) {
                    return Some(Ok(rec));
                }
                continue;
            }
            if line == "sim4end" {
                if let Some(rec) = pending.take().and_then(PartialRecord::finish) {
                    return Some(Ok(rec));
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let Some(partial) = pending.as_mut() else {
                continue;
            };
            if let Err(e) = partial.feed(line, self.line_no) {
                pending = None;
                return Some(Err(e));
            }
        })
    }
}

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::dna::{prune_stop_runs, reverse_complement, translate};
use crate::genome::GenomeStore;
use crate::model::exon::Exon;
use crate::model::locus::Locus;
use crate::model::types::IntervalId;
use crate::types::Span;

/// Read one interval's bases in every usable reading frame.
///
/// `dna` is already in reading direction. A frame shift `s` is usable while
/// `s <= dna.len()`, so a single base yields frames 0 and 1 and anything
/// longer yields all three.
pub fn frame_exons(interval: IntervalId, span: Span, dna: &[u8], min_orf_len: usize) -> Vec<Exon> {
    if dna.is_empty() {
        return Vec::new();
    }
    (0..3usize)
        .filter(|&shift| shift <= dna.len())
        .map(|shift| {
            let body = &dna[shift..];
            let remainder = body.len() % 3;
            let mut exon = Exon::new(interval, span, shift as u8);
            exon.sequence = prune_stop_runs(&translate(body), min_orf_len);
            exon.prefix = dna[..shift].to_vec();
            exon.suffix = body[body.len() - remainder..].to_vec();
            exon
        })
        .collect()
}

/// Generate exons for every interval of a consolidated locus.
///
/// Intervals that yield no exons are dropped from the reading order; their
/// count is returned.
pub fn generate_exons<G: GenomeStore + ?Sized>(
    locus: &mut Locus,
    genome: &mut G,
    min_orf_len: usize,
) -> Result<usize> {
    let mut empty = Vec::new();
    for id in locus.order.clone() {
        let span = locus.intervals[id].span;
        let mut dna = genome
            .fetch(span.start, span.end)
            .with_context(|| format!("fetch bases {}-{}", span.start, span.end))?;
        if dna.len() < span.len() as usize {
            debug!(
                start = span.start,
                end = span.end,
                got = dna.len(),
                "interval runs past the chromosome end"
            );
        }
        if locus.strand.is_reverse() {
            dna = reverse_complement(&dna);
        }
        let exons = frame_exons(id, span, &dna, min_orf_len);
        if exons.is_empty() {
            warn!(start = span.start, end = span.end, "interval produced no exons");
            empty.push(id);
            continue;
        }
        locus.push_exons(id, exons);
    }
    locus.exclude(&empty);
    Ok(empty.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::InMemoryGenome;
    use crate::model::interval::{Interval, IntervalSet};
    use crate::types::Strand;

    #[test]
    fn three_frames_with_prefix_and_suffix() {
        // 8 bases: frame 0 -> 2 codons + 2 left, frame 1 -> 2 codons + 1, frame 2 -> 2 codons
        let exons = frame_exons(0, Span::new(0, 8), b"ATGGCCTA", 100);
        assert_eq!(exons.len(), 3);

        assert_eq!(exons[0].sequence, b"MA".to_vec());
        assert!(exons[0].prefix.is_empty());
        assert_eq!(exons[0].suffix, b"TA".to_vec());

        assert_eq!(exons[1].frame, 1);
        assert_eq!(exons[1].prefix, b"A".to_vec());
        assert_eq!(exons[1].sequence, b"WP".to_vec());
        assert_eq!(exons[1].suffix, b"A".to_vec());

        assert_eq!(exons[2].prefix, b"AT".to_vec());
        assert_eq!(exons[2].sequence, b"GL".to_vec());
        assert!(exons[2].suffix.is_empty());
    }

    #[test]
    fn exon_count_by_length() {
        assert_eq!(frame_exons(0, Span::new(0, 1), b"A", 100).len(), 2);
        assert_eq!(frame_exons(0, Span::new(0, 2), b"AC", 100).len(), 3);
        assert_eq!(frame_exons(0, Span::new(0, 3), b"ACG", 100).len(), 3);
        assert!(frame_exons(0, Span::new(0, 1), b"", 100).is_empty());

        let single = frame_exons(0, Span::new(0, 1), b"G", 100);
        assert_eq!(single[0].suffix, b"G".to_vec());
        assert_eq!(single[1].prefix, b"G".to_vec());
        assert!(single[1].suffix.is_empty());
    }

    #[test]
    fn minus_strand_translates_reverse_complement() {
        // [2,8) = "CATGGC" -> reverse complement "GCCATG" -> "AM"
        let mut genome = InMemoryGenome::new(b"TTCATGGCTT".to_vec());
        let mut set = IntervalSet::new();
        set.insert(Interval::new(Span::new(2, 8), 1));
        let mut locus = Locus::from_pool(&set, &[0], Strand::Minus);

        let empty = generate_exons(&mut locus, &mut genome, 100).unwrap();
        assert_eq!(empty, 0);
        assert_eq!(locus.exons.len(), 3);
        assert_eq!(locus.exons[0].sequence, b"AM".to_vec());
        assert_eq!(locus.exons_of(0).len(), 3);
        assert_eq!(locus.exons[2].index, 2);
    }

    #[test]
    fn intervals_past_the_chromosome_end() {
        let mut genome = InMemoryGenome::new(b"ACGT".to_vec());
        let mut set = IntervalSet::new();
        let short = set.insert(Interval::new(Span::new(2, 40), 1));
        let gone = set.insert(Interval::new(Span::new(50, 60), 1));
        let mut locus = Locus::from_pool(&set, &[short, gone], Strand::Plus);

        let empty = generate_exons(&mut locus, &mut genome, 100).unwrap();
        assert_eq!(empty, 1);
        assert_eq!(locus.order, vec![short]);
        // "GT" is all that is left of [2,40)
        assert_eq!(locus.exons_of(short).len(), 3);
        assert_eq!(locus.exons[0].suffix, b"GT".to_vec());
        assert_eq!(locus.exons[0].span, Span::new(2, 40));
        assert!(locus.exons_of(gone).is_empty());
    }
}

use tracing::trace;

use crate::dna::codon_to_amino_acid;
use crate::errors::LocusError;
use crate::model::exon::ExonLink;
use crate::model::locus::Locus;
use crate::model::types::{ExonId, LinkKind};

/// What the linker produced for one locus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub links: usize,
    pub double_links: usize,
    /// Interval links whose partner has no exons.
    pub skipped: usize,
}

fn spliced(parts: &[&[u8]]) -> Option<u8> {
    let codon: Vec<u8> = parts.concat();
    codon_to_amino_acid(&codon)
}

/// Connect the exons of a locus along its interval links.
///
/// An exon whose suffix holds `n` leftover bases continues in the partner
/// frame that consumes `3 - n` bases as prefix, and the junction residue is
/// built from those bases. When one leftover base meets a single-base
/// interval, the link jumps over it to that interval's own partners and
/// the codon is stitched from all three intervals.
pub fn link_exons(locus: &mut Locus) -> Result<LinkReport, LocusError> {
    let mut report = LinkReport::default();
    let mut found: Vec<(ExonId, ExonId, LinkKind, Option<u8>)> = Vec::new();

    for &ia in &locus.order {
        for la in locus.reading_links(ia) {
            let ib = la.target;
            locus.check_reading_edge(ia, ib)?;
            let b_exons = locus.exons_of(ib);
            if b_exons.len() < 2 {
                report.skipped += 1;
                continue;
            }

            for a in locus.exons_of(ia) {
                match a.suffix.len() {
                    0 => found.push((a.index, b_exons[0].index, la.kind, None)),
                    2 => {
                        let b = &b_exons[1];
                        let aa = spliced(&[a.suffix.as_slice(), b.prefix.as_slice()]);
                        found.push((a.index, b.index, la.kind, aa));
                    }
                    _ if b_exons.len() > 2 => {
                        let b = &b_exons[2];
                        let aa = spliced(&[a.suffix.as_slice(), b.prefix.as_slice()]);
                        found.push((a.index, b.index, la.kind, aa));
                    }
                    _ => {
                        let b = &b_exons[0];
                        for lb in locus.reading_links(ib) {
                            let ic = lb.target;
                            locus.check_reading_edge(ib, ic)?;
                            let c_exons = locus.exons_of(ic);
                            if c_exons.len() < 2 {
                                report.skipped += 1;
                                continue;
                            }
                            let c = &c_exons[1];
                            let aa = spliced(&[
                                a.suffix.as_slice(),
                                b.suffix.as_slice(),
                                c.prefix.as_slice(),
                            ]);
                            trace!(from = a.index, via = b.index, to = c.index, "double link");
                            found.push((a.index, c.index, la.kind.weakest(lb.kind), aa));
                            report.double_links += 1;
                        }
                    }
                }
            }
        }
    }

    report.links = found.len();
    for (from, to, kind, amino_acid) in found {
        locus.exons[from].forward.push(ExonLink {
            target: to,
            kind,
            amino_acid,
        });
        locus.exons[to].backward.push(ExonLink {
            target: from,
            kind,
            amino_acid,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::frames::generate_exons;
    use crate::genome::InMemoryGenome;
    use crate::model::interval::{Interval, IntervalSet};
    use crate::model::types::IntervalId;
    use crate::types::{Span, Strand};

    fn locus_with(
        genome: &[u8],
        spans: &[(u32, u32)],
        links: &[(IntervalId, IntervalId, LinkKind)],
        strand: Strand,
    ) -> Locus {
        let mut set = IntervalSet::new();
        for &(s, e) in spans {
            set.insert(Interval::new(Span::new(s, e), 1));
        }
        for &(a, b, kind) in links {
            set.link(a, b, kind);
        }
        let members: Vec<IntervalId> = (0..spans.len()).collect();
        let mut locus = Locus::from_pool(&set, &members, strand);
        generate_exons(&mut locus, &mut InMemoryGenome::new(genome.to_vec()), 100).unwrap();
        link_exons(&mut locus).unwrap();
        locus
    }

    fn link(locus: &Locus, from: ExonId, to: ExonId) -> Option<ExonLink> {
        locus.exons[from].forward.iter().find(|l| l.target == to).copied()
    }

    #[test]
    fn suffix_length_picks_the_partner_frame() {
        // A = [0,4) "ATGG", B = [10,16) "CCTTAA"
        let genome = b"ATGGNNNNNNCCTTAA";
        let locus = locus_with(
            genome,
            &[(0, 4), (10, 16)],
            &[(0, 1, LinkKind::Splice(3))],
            Strand::Plus,
        );
        let a = locus.exon_range(0);
        let b = locus.exon_range(1);

        // frame 0: suffix "G" -> B frame 2, prefix "CC": GCC = A
        let l0 = link(&locus, a.start, b.start + 2).unwrap();
        assert_eq!(l0.amino_acid, Some(b'A'));
        assert_eq!(l0.kind, LinkKind::Splice(3));

        // frame 1: "TGG" is whole, no suffix -> B frame 0
        let l1 = link(&locus, a.start + 1, b.start).unwrap();
        assert_eq!(l1.amino_acid, None);

        // frame 2: suffix "GG" -> B frame 1, prefix "C": GGC = G
        let l2 = link(&locus, a.start + 2, b.start + 1).unwrap();
        assert_eq!(l2.amino_acid, Some(b'G'));

        // backward side mirrors the forward side
        let back = &locus.exons[b.start + 2].backward;
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].target, a.start);
        assert_eq!(back[0].kind, LinkKind::Splice(3));
    }

    #[test]
    fn single_base_interval_is_threaded_through() {
        // [90,100) -> [100,101) -> [101,130); frame 0 of the first leaves one base
        let mut genome = vec![b'A'; 130];
        genome[99] = b'T';
        genome[100] = b'G';
        genome[101] = b'G';
        let locus = locus_with(
            &genome,
            &[(90, 100), (100, 101), (101, 130)],
            &[(0, 1, LinkKind::Splice(4)), (1, 2, LinkKind::Splice(2))],
            Strand::Plus,
        );
        let a = locus.exon_range(0);
        let c = locus.exon_range(2);

        let double = link(&locus, a.start, c.start + 1).unwrap();
        // T + G + G
        assert_eq!(double.amino_acid, Some(b'W'));
        assert_eq!(double.kind, LinkKind::Splice(2));
        assert!(locus.exons[c.start + 1].backward.iter().any(|l| l.target == a.start));
    }

    #[test]
    fn adjacency_hop_takes_the_other_weight() {
        let genome = vec![b'C'; 130];
        let locus = locus_with(
            &genome,
            &[(90, 100), (100, 101), (101, 130)],
            &[(0, 1, LinkKind::Adjacent), (1, 2, LinkKind::Splice(6))],
            Strand::Plus,
        );
        let a = locus.exon_range(0);
        let c = locus.exon_range(2);
        assert_eq!(link(&locus, a.start, c.start + 1).unwrap().kind, LinkKind::Splice(6));
    }

    #[test]
    fn minus_strand_links_run_against_the_genome() {
        let genome = b"ATGGNNNNNNCCTTAA";
        let mut locus = Locus::from_pool(
            &{
                let mut set = IntervalSet::new();
                set.insert(Interval::new(Span::new(0, 4), 1));
                set.insert(Interval::new(Span::new(10, 16), 1));
                set.link(0, 1, LinkKind::Splice(1));
                set
            },
            &[0, 1],
            Strand::Minus,
        );
        generate_exons(&mut locus, &mut InMemoryGenome::new(genome.to_vec()), 100).unwrap();
        let report = link_exons(&mut locus).unwrap();

        // [10,16) is read first and links on to [0,4)
        assert_eq!(locus.order, vec![1, 0]);
        assert_eq!(report.links, 3);
        assert!(locus.exons_of(1).iter().all(|e| e.forward.len() == 1));
        assert!(locus.exons_of(0).iter().all(|e| e.forward.is_empty()));
    }

    #[test]
    fn upstream_link_aborts_the_locus() {
        let mut set = IntervalSet::new();
        set.insert(Interval::new(Span::new(0, 10), 1));
        set.insert(Interval::new(Span::new(5, 20), 1));
        set.link(1, 0, LinkKind::Splice(1));
        let mut locus = Locus::from_pool(&set, &[0, 1], Strand::Plus);
        generate_exons(&mut locus, &mut InMemoryGenome::new(vec![b'A'; 20]), 100).unwrap();
        assert!(matches!(link_exons(&mut locus), Err(LocusError::BackwardLink { .. })));
    }
}

use std::collections::BTreeMap;

use proptest::prelude::*;

use exon_graph_db::collector::consolidate::consolidate;
use exon_graph_db::collector::frames::generate_exons;
use exon_graph_db::collector::grouper::LocusGrouper;
use exon_graph_db::collector::linker::link_exons;
use exon_graph_db::model::IntervalId;
use exon_graph_db::{InMemoryGenome, Interval, IntervalSet, LinkKind, Locus, Span, Strand};

const GENOME_LEN: u32 = 400;

/// Random pool: spans, occurrence counts and a handful of downstream links.
fn pool_strategy() -> impl Strategy<Value = IntervalSet> {
    let spans = prop::collection::vec((0u32..300, 1u32..60, 1u32..5), 1..12);
    let links = prop::collection::vec((0usize..12, 0usize..12, 1u32..4), 0..10);
    (spans, links).prop_map(|(spans, links)| {
        let mut set = IntervalSet::new();
        for (start, len, occ) in spans {
            set.insert(Interval::new(Span::new(start, start + len), occ));
        }
        let n = set.capacity();
        for (a, b, w) in links {
            let (a, b) = (a % n, b % n);
            if a != b && set[a].end() <= set[b].start() {
                set.link(a, b, LinkKind::Splice(w));
            }
        }
        set
    })
}

fn coverage(set: &IntervalSet) -> BTreeMap<u32, u64> {
    let mut cov = BTreeMap::new();
    for (_, iv) in set.iter() {
        for p in iv.start()..iv.end() {
            *cov.entry(p).or_insert(0) += iv.occurrences as u64;
        }
    }
    cov
}

fn links_are_mirrored(set: &IntervalSet) -> bool {
    set.iter().all(|(id, iv)| {
        iv.forward.iter().all(|l| {
            set.get(l.target).is_some() && set[l.target].backward_kind(id) == Some(l.kind)
        }) && iv.backward.iter().all(|l| {
            set.get(l.target).is_some() && set[l.target].forward_kind(id) == Some(l.kind)
        })
    })
}

fn bases() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')],
        GENOME_LEN as usize,
    )
}

proptest! {
    #[test]
    fn consolidation_conserves_evidence_per_position(mut set in pool_strategy()) {
        let before = coverage(&set);
        let evidence = set.evidence();
        consolidate(&mut set).unwrap();
        prop_assert_eq!(coverage(&set), before);
        prop_assert_eq!(set.evidence(), evidence);
    }

    #[test]
    fn consolidation_output_is_disjoint_and_mirrored(mut set in pool_strategy()) {
        consolidate(&mut set).unwrap();
        prop_assert!(set.is_disjoint());
        prop_assert!(links_are_mirrored(&set));
        for (from, to, _) in set.edges() {
            prop_assert!(set.check_edge(from, to).is_ok());
        }
    }

    #[test]
    fn consolidation_is_idempotent(mut set in pool_strategy()) {
        consolidate(&mut set).unwrap();
        let once = set.clone();
        consolidate(&mut set).unwrap();
        prop_assert_eq!(set, once);
    }

    #[test]
    fn every_interval_lands_in_some_pool(set in pool_strategy(), span in 20u32..500) {
        let mut seen = vec![false; set.capacity()];
        for pool in LocusGrouper::new(&set, span) {
            for id in pool.members {
                seen[id] = true;
            }
        }
        prop_assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn exon_counts_and_exon_links(
        set in pool_strategy(),
        genome in bases(),
        reverse in any::<bool>(),
    ) {
        let strand = if reverse { Strand::Minus } else { Strand::Plus };
        let members: Vec<IntervalId> = set.ids().collect();
        let mut locus = Locus::from_pool(&set, &members, strand);
        consolidate(&mut locus.intervals).unwrap();
        locus.refresh_order();
        let mut genome = InMemoryGenome::new(genome);
        generate_exons(&mut locus, &mut genome, 100).unwrap();
        link_exons(&mut locus).unwrap();

        for &id in &locus.order {
            let expected = if locus.intervals[id].len() == 1 { 2 } else { 3 };
            prop_assert_eq!(locus.exons_of(id).len(), expected);
        }
        for (i, exon) in locus.exons.iter().enumerate() {
            prop_assert_eq!(exon.index, i);
            for l in &exon.forward {
                let back = &locus.exons[l.target].backward;
                prop_assert!(back
                    .iter()
                    .any(|b| b.target == i && b.kind == l.kind && b.amino_acid == l.amino_acid));
            }
        }
        let forward: usize = locus.exons.iter().map(|e| e.forward.len()).sum();
        let backward: usize = locus.exons.iter().map(|e| e.backward.len()).sum();
        prop_assert_eq!(forward, backward);
    }
}

#[test]
fn staggered_pair_becomes_three_linked_pieces() {
    let mut set = IntervalSet::new();
    set.insert(Interval::new(Span::new(100, 200), 5));
    set.insert(Interval::new(Span::new(150, 250), 3));
    consolidate(&mut set).unwrap();

    let ids = set.sorted_ids();
    let pieces: Vec<(u32, u32, u32)> = ids
        .iter()
        .map(|&id| (set[id].start(), set[id].end(), set[id].occurrences))
        .collect();
    assert_eq!(pieces, vec![(100, 150, 5), (150, 200, 8), (200, 250, 3)]);
    assert_eq!(set[ids[0]].forward_kind(ids[1]), Some(LinkKind::Adjacent));
    assert_eq!(set[ids[1]].forward_kind(ids[2]), Some(LinkKind::Adjacent));
}

#[test]
fn single_base_interval_gets_a_double_link() {
    let mut genome = vec![b'C'; 200];
    // frame 0 of [90,100) leaves "A"; [100,101) is "T"; [101,130) frame 1 prefix "G"
    genome[99] = b'A';
    genome[100] = b'T';
    genome[101] = b'G';

    let mut set = IntervalSet::new();
    let left = set.insert(Interval::new(Span::new(90, 100), 3));
    let mid = set.insert(Interval::new(Span::new(100, 101), 2));
    let right = set.insert(Interval::new(Span::new(101, 130), 2));
    set.link(left, mid, LinkKind::Splice(5));
    set.link(mid, right, LinkKind::Splice(2));

    let mut locus = Locus::from_pool(&set, &[left, mid, right], Strand::Plus);
    consolidate(&mut locus.intervals).unwrap();
    locus.refresh_order();
    generate_exons(&mut locus, &mut InMemoryGenome::new(genome), 100).unwrap();
    let report = link_exons(&mut locus).unwrap();
    assert!(report.double_links >= 1);

    let from = locus.exon_range(left).start;
    let to = locus.exon_range(right).start + 1;
    let link = locus.exons[from]
        .forward
        .iter()
        .find(|l| l.target == to)
        .copied()
        .unwrap();
    // A + T + G
    assert_eq!(link.amino_acid, Some(b'M'));
    assert_eq!(link.kind, LinkKind::Splice(2));
}

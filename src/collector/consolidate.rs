//! Overlap resolution for one active pool.
//!
//! The pool is rewritten in place until no two live intervals overlap. Each
//! overlapping pair is cut at all of its distinct endpoints; every piece
//! carries the summed occurrences of the members that cover it, so
//! `occurrences * length` summed over the pool never changes. Links are
//! re-homed onto the piece that now owns the old boundary, and the pieces of
//! one old interval are chained with [`LinkKind::Adjacent`] edges.

use tracing::trace;

use crate::errors::LocusError;
use crate::model::interval::{Interval, IntervalSet};
use crate::model::types::{IntervalId, LinkKind};
use crate::types::Span;

/// What one consolidation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidateReport {
    pub splits: usize,
    pub merges: usize,
}

/// Make the live intervals of `set` pairwise disjoint.
pub fn consolidate(set: &mut IntervalSet) -> Result<ConsolidateReport, LocusError> {
    let mut report = ConsolidateReport::default();
    while let Some((a, b)) = find_overlap(set) {
        split_pair(set, a, b)?;
        report.splits += 1;
    }
    report.merges = merge_redundant(set);
    Ok(report)
}

/// First overlapping pair, scanning in (start, end) order.
///
/// Exact duplicates are returned before any other overlap.
pub fn find_overlap(set: &IntervalSet) -> Option<(IntervalId, IntervalId)> {
    let ids = set.sorted_ids();
    if let Some(w) = ids.windows(2).find(|w| set[w[0]].span == set[w[1]].span) {
        return Some((w[0], w[1]));
    }
    for (i, &a) in ids.iter().enumerate() {
        let a_end = set[a].end();
        if let Some(&b) = ids[i + 1..].first() {
            if set[b].start() < a_end {
                return Some((a, b));
            }
        }
    }
    None
}

fn covering_piece(pieces: &[(Span, IntervalId)], pred: impl Fn(Span) -> bool) -> Option<IntervalId> {
    pieces.iter().find(|(span, _)| pred(*span)).map(|&(_, id)| id)
}

/// Replace an overlapping pair by the pieces of its union.
///
/// Returns the ids of the new pieces in genome order.
pub fn split_pair(
    set: &mut IntervalSet,
    a: IntervalId,
    b: IntervalId,
) -> Result<Vec<IntervalId>, LocusError> {
    // Overlapping intervals can never be joined by a valid link.
    if set[a].forward_kind(b).is_some() || set[b].backward_kind(a).is_some() {
        set.check_edge(a, b)?;
    }
    if set[b].forward_kind(a).is_some() || set[a].backward_kind(b).is_some() {
        set.check_edge(b, a)?;
    }

    let members = [a, b];
    let cuts = Span::cut_points(set[a].span, set[b].span);
    let mut pieces: Vec<(Span, IntervalId)> = Vec::with_capacity(cuts.len() - 1);
    for w in cuts.windows(2) {
        let span = Span::new(w[0], w[1]);
        let mut piece = Interval::new(span, 0);
        for &m in &members {
            if set[m].span.contains(span) {
                piece.occurrences += set[m].occurrences;
                for &sid in &set[m].source_ids {
                    piece.add_source_id(sid);
                }
            }
        }
        pieces.push((span, set.insert(piece)));
    }

    let mut outgoing = Vec::new();
    let mut incoming = Vec::new();
    for &m in &members {
        let old = set[m].span;
        let tail = covering_piece(&pieces, |s| s.end == old.end);
        let head = covering_piece(&pieces, |s| s.start == old.start);
        let (Some(tail), Some(head)) = (tail, head) else {
            continue;
        };
        outgoing.extend(set[m].forward.iter().map(|l| (tail, l.target, l.kind)));
        incoming.extend(set[m].backward.iter().map(|l| (l.target, head, l.kind)));

        let inside: Vec<IntervalId> = pieces
            .iter()
            .filter(|(s, _)| old.contains(*s))
            .map(|&(_, id)| id)
            .collect();
        for w in inside.windows(2) {
            set.link(w[0], w[1], LinkKind::Adjacent);
        }
    }

    set.retire(a);
    set.retire(b);
    for (from, to, kind) in outgoing.into_iter().chain(incoming) {
        set.link_checked(from, to, kind)?;
    }

    trace!(
        a = ?set[a].span,
        b = ?set[b].span,
        pieces = pieces.len(),
        "split overlapping pair"
    );
    Ok(pieces.into_iter().map(|(_, id)| id).collect())
}

/// Fuse `A -> B` back together where splitting left a seam with no evidence
/// of its own: B starts where A ends, the only link between them is an
/// adjacency, neither has any other link on that side, and both carry the
/// same occurrence count. Repeats until nothing changes; returns the number
/// of fusions.
pub fn merge_redundant(set: &mut IntervalSet) -> usize {
    let mut merges = 0;
    loop {
        let mut changed = false;
        for a in set.sorted_ids() {
            if set[a].is_retired() {
                continue;
            }
            let [only] = set[a].forward.as_slice() else {
                continue;
            };
            let b = only.target;
            if !only.kind.is_adjacent()
                || set[b].backward.len() != 1
                || !set[a].span.abuts(set[b].span)
                || set[a].occurrences != set[b].occurrences
            {
                continue;
            }

            let onward: Vec<_> = set[b].forward.iter().map(|l| (l.target, l.kind)).collect();
            let b_span = set[b].span;
            let b_ids = set[b].source_ids.clone();
            set.retire(b);

            let fused = &mut set[a];
            fused.span = Span::new(fused.span.start, b_span.end);
            for sid in b_ids {
                fused.add_source_id(sid);
            }
            for (to, kind) in onward {
                set.link(a, to, kind);
            }
            merges += 1;
            changed = true;
        }
        if !changed {
            return merges;
        }
    }
}

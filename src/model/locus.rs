use std::ops::Range;

use crate::errors::LocusError;
use crate::model::exon::Exon;
use crate::model::interval::IntervalSet;
use crate::model::types::{IntervalId, Link, SourceId};
use crate::types::{Span, Strand};

/// One active pool on its way to becoming a gene record.
///
/// Holds a private copy of the pool's intervals (ids are local to the
/// locus), the reading order of the intervals, and the exons generated for
/// them.
#[derive(Debug, Clone)]
pub struct Locus {
    pub strand: Strand,
    pub intervals: IntervalSet,
    /// Live intervals in reading order: genome order on the plus strand,
    /// reversed on the minus strand.
    pub order: Vec<IntervalId>,
    /// Exons in gene-table order; `exons[i].index == i`.
    pub exons: Vec<Exon>,
    exon_ranges: Vec<Range<usize>>,
    /// Link ends that pointed at intervals outside the pool.
    pub dropped_links: usize,
}

impl Locus {
    pub fn from_pool(set: &IntervalSet, members: &[IntervalId], strand: Strand) -> Self {
        let (intervals, dropped_links) = set.subset(members);
        let mut locus = Self {
            strand,
            intervals,
            order: Vec::new(),
            exons: Vec::new(),
            exon_ranges: Vec::new(),
            dropped_links,
        };
        locus.refresh_order();
        locus
    }

    /// Recompute `order` from the live intervals.
    pub fn refresh_order(&mut self) {
        let mut order = self.intervals.sorted_ids();
        if self.strand.is_reverse() {
            order.reverse();
        }
        self.order = order;
    }

    /// Links leaving `id` in reading direction.
    pub fn reading_links(&self, id: IntervalId) -> &[Link] {
        let iv = &self.intervals[id];
        if self.strand.is_reverse() {
            &iv.backward
        } else {
            &iv.forward
        }
    }

    /// Check that `to` lies downstream of `from` in reading direction.
    pub fn check_reading_edge(&self, from: IntervalId, to: IntervalId) -> Result<(), LocusError> {
        if self.strand.is_reverse() {
            self.intervals.check_edge(to, from)
        } else {
            self.intervals.check_edge(from, to)
        }
    }

    /// Append the exons of one interval, assigning their table indices.
    pub fn push_exons(&mut self, id: IntervalId, exons: Vec<Exon>) {
        if self.exon_ranges.len() < self.intervals.capacity() {
            self.exon_ranges.resize(self.intervals.capacity(), 0..0);
        }
        let first = self.exons.len();
        for (offset, mut exon) in exons.into_iter().enumerate() {
            exon.index = first + offset;
            self.exons.push(exon);
        }
        self.exon_ranges[id] = first..self.exons.len();
    }

    pub fn exon_range(&self, id: IntervalId) -> Range<usize> {
        self.exon_ranges.get(id).cloned().unwrap_or(0..0)
    }

    /// Exons of one interval, in frame order.
    pub fn exons_of(&self, id: IntervalId) -> &[Exon] {
        &self.exons[self.exon_range(id)]
    }

    /// Drop intervals that produced no exons from the reading order.
    pub fn exclude(&mut self, ids: &[IntervalId]) {
        self.order.retain(|id| !ids.contains(id));
    }

    /// Source IDs of all intervals in reading order, first-seen, deduped.
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut out = Vec::new();
        for &id in &self.order {
            for &sid in &self.intervals[id].source_ids {
                if !out.contains(&sid) {
                    out.push(sid);
                }
            }
        }
        out
    }

    /// Lowest start and highest end over the intervals in `order`.
    pub fn bounds(&self) -> Option<Span> {
        let start = self.order.iter().map(|&id| self.intervals[id].start()).min()?;
        let end = self.order.iter().map(|&id| self.intervals[id].end()).max()?;
        Some(Span { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Interval;
    use crate::model::types::LinkKind;

    fn three_intervals() -> IntervalSet {
        let mut set = IntervalSet::new();
        set.insert(Interval::new(Span::new(500, 600), 1));
        set.insert(Interval::new(Span::new(100, 200), 1));
        set.insert(Interval::new(Span::new(300, 400), 1));
        set[1].add_source_id(8);
        set[2].add_source_id(9);
        set[0].add_source_id(8);
        set.link(1, 2, LinkKind::Splice(1));
        set.link(2, 0, LinkKind::Splice(1));
        set
    }

    #[test]
    fn reading_order_follows_strand() {
        let set = three_intervals();
        let plus = Locus::from_pool(&set, &[0, 1, 2], Strand::Plus);
        let starts: Vec<u32> = plus.order.iter().map(|&id| plus.intervals[id].start()).collect();
        assert_eq!(starts, vec![100, 300, 500]);

        let minus = Locus::from_pool(&set, &[0, 1, 2], Strand::Minus);
        let starts: Vec<u32> = minus.order.iter().map(|&id| minus.intervals[id].start()).collect();
        assert_eq!(starts, vec![500, 300, 100]);
    }

    #[test]
    fn minus_strand_reads_backward_links() {
        let set = three_intervals();
        let minus = Locus::from_pool(&set, &[0, 1, 2], Strand::Minus);
        let first = minus.order[0];
        let next = minus.reading_links(first);
        assert_eq!(next.len(), 1);
        assert_eq!(minus.intervals[next[0].target].start(), 300);
        assert!(minus.check_reading_edge(first, next[0].target).is_ok());
        assert!(minus.check_reading_edge(next[0].target, first).is_err());
    }

    #[test]
    fn pool_subset_counts_dropped_links() {
        let set = three_intervals();
        let locus = Locus::from_pool(&set, &[1, 2], Strand::Plus);
        assert_eq!(locus.intervals.len(), 2);
        assert_eq!(locus.dropped_links, 1);
        assert_eq!(locus.source_ids(), vec![8, 9]);
        assert_eq!(locus.bounds(), Some(Span::new(100, 400)));
    }
}

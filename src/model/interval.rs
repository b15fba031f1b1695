use std::ops::{Index, IndexMut};

use crate::errors::LocusError;
use crate::model::types::{IntervalId, Link, LinkKind, SourceId};
use crate::types::Span;

/// A genomic interval witnessed by one or more cDNA alignments.
///
/// Links are kept on both ends: `forward` holds edges leaving this interval,
/// `backward` mirrors the edges arriving at it. [`IntervalSet::link`] and
/// [`IntervalSet::unlink`] keep the two sides in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub span: Span,
    pub occurrences: u32,
    pub source_ids: Vec<SourceId>,
    pub forward: Vec<Link>,
    pub backward: Vec<Link>,
    retired: bool,
}

impl Interval {
    pub fn new(span: Span, occurrences: u32) -> Self {
        Self {
            span,
            occurrences,
            source_ids: Vec::new(),
            forward: Vec::new(),
            backward: Vec::new(),
            retired: false,
        }
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.span.start
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.span.end
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.span.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Record a witnessing source (deduped, first-seen order).
    pub fn add_source_id(&mut self, id: SourceId) {
        if !self.source_ids.contains(&id) {
            self.source_ids.push(id);
        }
    }

    pub fn forward_kind(&self, target: IntervalId) -> Option<LinkKind> {
        self.forward.iter().find(|l| l.target == target).map(|l| l.kind)
    }

    pub fn backward_kind(&self, source: IntervalId) -> Option<LinkKind> {
        self.backward.iter().find(|l| l.target == source).map(|l| l.kind)
    }

    #[inline]
    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

fn upsert(links: &mut Vec<Link>, target: IntervalId, kind: LinkKind) {
    match links.iter_mut().find(|l| l.target == target) {
        Some(existing) => existing.kind = existing.kind.merge(kind),
        None => links.push(Link::new(target, kind)),
    }
}

fn take_link(links: &mut Vec<Link>, target: IntervalId) -> Option<LinkKind> {
    let pos = links.iter().position(|l| l.target == target)?;
    Some(links.remove(pos).kind)
}

/// Arena of intervals addressed by [`IntervalId`].
///
/// Used both for the whole chromosome/strand (as ingested) and for the
/// private copy of one active pool while it is consolidated. Intervals that
/// get absorbed or split are retired in place so ids stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, interval: Interval) -> IntervalId {
        let id = self.intervals.len();
        self.intervals.push(interval);
        id
    }

    /// Number of live intervals.
    pub fn len(&self) -> usize {
        self.intervals.iter().filter(|iv| !iv.retired).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the id space (live and retired).
    pub fn capacity(&self) -> usize {
        self.intervals.len()
    }

    pub fn get(&self, id: IntervalId) -> Option<&Interval> {
        self.intervals.get(id).filter(|iv| !iv.retired)
    }

    pub fn ids(&self) -> impl Iterator<Item = IntervalId> + '_ {
        self.intervals
            .iter()
            .enumerate()
            .filter(|(_, iv)| !iv.retired)
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IntervalId, &Interval)> + '_ {
        self.intervals.iter().enumerate().filter(|(_, iv)| !iv.retired)
    }

    /// Live ids ordered by (start, end, id).
    pub fn sorted_ids(&self) -> Vec<IntervalId> {
        let mut ids: Vec<IntervalId> = self.ids().collect();
        ids.sort_by_key(|&id| (self.intervals[id].span, id));
        ids
    }

    /// Add (or strengthen) the edge `from -> to` on both ends.
    pub fn link(&mut self, from: IntervalId, to: IntervalId, kind: LinkKind) {
        upsert(&mut self.intervals[from].forward, to, kind);
        upsert(&mut self.intervals[to].backward, from, kind);
    }

    /// Like [`IntervalSet::link`], but refuses edges that do not run downstream.
    pub fn link_checked(
        &mut self,
        from: IntervalId,
        to: IntervalId,
        kind: LinkKind,
    ) -> Result<(), LocusError> {
        self.check_edge(from, to)?;
        self.link(from, to, kind);
        Ok(())
    }

    /// Remove the edge `from -> to` from both ends, returning its weight.
    pub fn unlink(&mut self, from: IntervalId, to: IntervalId) -> Option<LinkKind> {
        let kind = take_link(&mut self.intervals[from].forward, to);
        take_link(&mut self.intervals[to].backward, from);
        kind
    }

    /// An edge is valid when its source ends at or before its target starts.
    pub fn check_edge(&self, from: IntervalId, to: IntervalId) -> Result<(), LocusError> {
        let a = self.intervals[from].span;
        let b = self.intervals[to].span;
        if from == to {
            return Err(LocusError::SelfLink {
                id: from,
                start: a.start,
                end: a.end,
            });
        }
        if a.end > b.start {
            return Err(LocusError::BackwardLink {
                from,
                from_start: a.start,
                from_end: a.end,
                to,
                to_start: b.start,
                to_end: b.end,
            });
        }
        Ok(())
    }

    /// Every live edge as `(from, to, kind)`, taken from the forward lists.
    pub fn edges(&self) -> Vec<(IntervalId, IntervalId, LinkKind)> {
        self.iter()
            .flat_map(|(id, iv)| iv.forward.iter().map(move |l| (id, l.target, l.kind)))
            .collect()
    }

    /// Retire an interval. Its remaining edges are cut on both ends.
    pub fn retire(&mut self, id: IntervalId) {
        let forward: Vec<IntervalId> = self.intervals[id].forward.iter().map(|l| l.target).collect();
        for to in forward {
            self.unlink(id, to);
        }
        let backward: Vec<IntervalId> = self.intervals[id].backward.iter().map(|l| l.target).collect();
        for from in backward {
            self.unlink(from, id);
        }
        self.intervals[id].retired = true;
    }

    /// Copy the given members into a fresh arena.
    ///
    /// Edges to intervals outside `members` are not carried over; the number
    /// of such dropped edge ends is returned alongside the new arena.
    pub fn subset(&self, members: &[IntervalId]) -> (IntervalSet, usize) {
        let mut local_of = vec![None; self.intervals.len()];
        let mut local = IntervalSet::new();
        let mut copied = Vec::with_capacity(members.len());
        for &id in members {
            if self.intervals[id].retired || local_of[id].is_some() {
                continue;
            }
            let src = &self.intervals[id];
            let mut copy = Interval::new(src.span, src.occurrences);
            copy.source_ids = src.source_ids.clone();
            local_of[id] = Some(local.insert(copy));
            copied.push(id);
        }

        let mut dropped = 0;
        for id in copied {
            let Some(from) = local_of[id] else { continue };
            for l in &self.intervals[id].forward {
                match local_of[l.target] {
                    Some(to) => local.link(from, to, l.kind),
                    None => dropped += 1,
                }
            }
            dropped += self.intervals[id]
                .backward
                .iter()
                .filter(|l| local_of[l.target].is_none())
                .count();
        }
        (local, dropped)
    }

    /// Sum of `occurrences * length` over the live intervals.
    pub fn evidence(&self) -> u64 {
        self.iter()
            .map(|(_, iv)| iv.occurrences as u64 * iv.len() as u64)
            .sum()
    }

    /// True if no two live intervals overlap.
    pub fn is_disjoint(&self) -> bool {
        let ids = self.sorted_ids();
        ids.windows(2)
            .all(|w| self.intervals[w[0]].end() <= self.intervals[w[1]].start())
    }
}

impl Index<IntervalId> for IntervalSet {
    type Output = Interval;

    fn index(&self, id: IntervalId) -> &Interval {
        &self.intervals[id]
    }
}

impl IndexMut<IntervalId> for IntervalSet {
    fn index_mut(&mut self, id: IntervalId) -> &mut Interval {
        &mut self.intervals[id]
    }
}

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::model::interval::IntervalSet;
use crate::model::types::IntervalId;
use crate::types::Span;

/// Intervals destined for one output locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePool {
    pub members: Vec<IntervalId>,
    /// Right-hand boundary used while this pool was assembled.
    pub limit: u32,
    /// Intervals carried over from the previous pool.
    pub carried: usize,
}

/// Walks a chromosome/strand's intervals left to right and hands out one
/// [`ActivePool`] at a time.
///
/// A pool grows from its seed by following links in both directions and by
/// taking any pending interval that starts before the pool's current right
/// end. Nothing ending past `seed.start + span` is taken; the member that
/// tried to reach it is carried into the next pool as a straggler, and
/// only its forward links are followed there.
pub struct LocusGrouper<'a> {
    set: &'a IntervalSet,
    span: u32,
    pending: BTreeSet<(Span, IntervalId)>,
    consumed: Vec<bool>,
    stragglers: Vec<IntervalId>,
}

impl<'a> LocusGrouper<'a> {
    pub fn new(set: &'a IntervalSet, span: u32) -> Self {
        Self {
            set,
            span,
            pending: set.iter().map(|(id, iv)| (iv.span, id)).collect(),
            consumed: vec![false; set.capacity()],
            stragglers: Vec::new(),
        }
    }

    /// Intervals not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn take(&mut self, id: IntervalId) {
        self.pending.remove(&(self.set[id].span, id));
        self.consumed[id] = true;
    }
}

impl Iterator for LocusGrouper<'_> {
    type Item = ActivePool;

    fn next(&mut self) -> Option<ActivePool> {
        if self.pending.is_empty() {
            if !self.stragglers.is_empty() {
                debug!(count = self.stragglers.len(), "stragglers left after last pool");
                self.stragglers.clear();
            }
            return None;
        }

        let set = self.set;
        let carried = std::mem::take(&mut self.stragglers);
        let mut members: Vec<IntervalId>;
        let mut max_end: u32;
        let mut limit: u32;

        if carried.is_empty() {
            let &(seed_span, seed) = self.pending.first()?;
            self.take(seed);
            members = vec![seed];
            max_end = seed_span.end;
            limit = seed_span.start.saturating_add(self.span);
        } else {
            members = carried.clone();
            max_end = carried.iter().map(|&id| set[id].end()).max().unwrap_or(0);
            let min_start = carried.iter().map(|&id| set[id].start()).min().unwrap_or(0);
            limit = min_start.saturating_add(self.span);
            for &id in &carried {
                for l in &set[id].forward {
                    limit = limit.max(set[l.target].end());
                }
            }
        }

        let carried_set: HashSet<IntervalId> = carried.iter().copied().collect();
        let mut in_pool: HashSet<IntervalId> = members.iter().copied().collect();
        let mut fresh = members.clone();
        let mut stragglers: Vec<IntervalId> = Vec::new();

        while !fresh.is_empty() {
            let batch = std::mem::take(&mut fresh);
            for id in batch {
                let iv = &set[id];
                let backward: &[_] = if carried_set.contains(&id) { &[] } else { &iv.backward };
                for l in iv.forward.iter().chain(backward) {
                    let target = l.target;
                    if in_pool.contains(&target) || self.consumed[target] {
                        continue;
                    }
                    if set[target].end() > limit {
                        if !stragglers.contains(&id) {
                            stragglers.push(id);
                        }
                        continue;
                    }
                    self.take(target);
                    in_pool.insert(target);
                    members.push(target);
                    fresh.push(target);
                    max_end = max_end.max(set[target].end());
                }
            }

            // Positional sweep: anything starting inside the pool's reach.
            let mut swept = Vec::new();
            for &(span, id) in &self.pending {
                if span.start >= max_end {
                    break;
                }
                if span.end < limit {
                    swept.push(id);
                    max_end = max_end.max(span.end);
                }
            }
            for id in swept {
                self.take(id);
                in_pool.insert(id);
                members.push(id);
                fresh.push(id);
            }
        }

        debug!(
            members = members.len(),
            carried = carried.len(),
            stragglers = stragglers.len(),
            limit,
            remaining = self.pending.len(),
            "active pool assembled"
        );
        self.stragglers = stragglers;
        Some(ActivePool {
            members,
            limit,
            carried: carried.len(),
        })
    }
}

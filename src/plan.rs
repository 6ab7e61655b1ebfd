//! A priority queue of closures keyed by simulated time.
//!
//! `Context` stores every scheduled piece of work, most importantly the daily epidemic step, as
//! a plan in a `PlanQueue`. Plans are ordered by time, then by `ExecutionPhase`, then by the
//! order in which they were added. Adding and retrieving a plan are *O*(log(*n*)).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::{HashMap, HashMapExt};

/// Plans scheduled for the same time run `First`, then `Normal`, then `Last`.
///
/// The epidemic day runs in `Normal`; the end of a run is scheduled in `Last` so that the final
/// day completes first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutionPhase {
    First,
    #[default]
    Normal,
    Last,
}

pub(crate) struct Plan<T> {
    pub time: f64,
    pub data: T,
}

#[derive(PartialEq, Debug)]
struct Entry {
    time: f64,
    phase: ExecutionPhase,
    id: u64,
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `BinaryHeap` is a max-heap, so every comparison is reversed.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.phase.cmp(&other.phase))
            .then(self.id.cmp(&other.id))
            .reverse()
    }
}

pub(crate) struct PlanQueue<T> {
    queue: BinaryHeap<Entry>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T> PlanQueue<T> {
    pub(crate) fn new() -> Self {
        PlanQueue {
            queue: BinaryHeap::new(),
            data_map: HashMap::new(),
            plan_counter: 0,
        }
    }

    pub(crate) fn add_plan(&mut self, time: f64, data: T, phase: ExecutionPhase) {
        trace!("adding plan at {time} ({phase:?})");
        let id = self.plan_counter;
        self.queue.push(Entry { time, phase, id });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
    }

    pub(crate) fn get_next_plan(&mut self) -> Option<Plan<T>> {
        let entry = self.queue.pop()?;
        let data = self
            .data_map
            .remove(&entry.id)
            .expect("every queued plan has data");
        Some(Plan {
            time: entry.time,
            data,
        })
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.data_map.clear();
    }

    pub(crate) fn remaining_plan_count(&self) -> usize {
        self.data_map.len()
    }
}

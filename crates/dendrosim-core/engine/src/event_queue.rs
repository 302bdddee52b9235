// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Event Queue
//!
//! Min-heap of pending synaptic events keyed by `(delivery time, insertion
//! order)`. Simultaneous events therefore come out in the order they were
//! scheduled. Events are never cancelled; each is popped exactly once.

use core::cmp::Ordering;
use std::collections::BinaryHeap;

use dendrosim_neural::SynapseId;
use serde::{Deserialize, Serialize};

/// A weighted activation of one synapse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Delivery time (ms)
    pub time: f64,
    pub target: SynapseId,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    event: Event,
    seq: u64,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the std max-heap pops the earliest event first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
    delivered: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { event, seq });
    }

    /// Earliest pending delivery time
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|s| s.event.time)
    }

    /// Move every event due at or before `now` into `out`, in delivery order
    pub fn pop_due_into(&mut self, now: f64, out: &mut Vec<Event>) {
        while let Some(next) = self.heap.peek() {
            if next.event.time > now {
                break;
            }
            if let Some(scheduled) = self.heap.pop() {
                out.push(scheduled.event);
                self.delivered += 1;
            }
        }
    }

    /// Every event due at or before `now`, in delivery order
    pub fn pop_due(&mut self, now: f64) -> Vec<Event> {
        let mut out = Vec::new();
        self.pop_due_into(now, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total number of events scheduled so far
    pub fn scheduled_count(&self) -> u64 {
        self.next_seq
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(time: f64, target: u32) -> Event {
        Event {
            time,
            target: SynapseId(target),
            weight: 1.0,
        }
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut q = EventQueue::new();
        q.schedule(event(3.0, 0));
        q.schedule(event(1.0, 1));
        q.schedule(event(2.0, 2));
        let due = q.pop_due(10.0);
        let times: Vec<f64> = due.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_ties_are_fifo() {
        let mut q = EventQueue::new();
        for target in 0..5 {
            q.schedule(event(4.0, target));
        }
        q.schedule(event(1.0, 99));
        let due = q.pop_due(4.0);
        let targets: Vec<u32> = due.iter().map(|e| e.target.0).collect();
        assert_eq!(targets, vec![99, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_future_events_stay_queued() {
        let mut q = EventQueue::new();
        q.schedule(event(1.0, 0));
        q.schedule(event(1.5, 1));
        assert_eq!(q.pop_due(1.0).len(), 1);
        assert_eq!(q.peek_time(), Some(1.5));
        assert!(q.pop_due(1.4).is_empty());
        assert_eq!(q.pop_due(1.5).len(), 1);
        assert_eq!(q.scheduled_count(), 2);
        assert_eq!(q.delivered_count(), 2);
    }
}

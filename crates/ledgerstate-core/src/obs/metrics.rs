//! Per-instance operation counters.
//!
//! Counters live inside the sink, never in process-global state, so two
//! engines built for two invocations never observe each other.
use crate::obs::sink::{OpKind, StateEvent, StateSink};
use std::{cell::RefCell, collections::HashMap};

///
/// OpCounters
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OpCounters {
    pub calls: u64,
    pub misses: u64,
    pub rows: u64,
    pub bytes_written: u64,
    pub conflicts: u64,
    pub failures: u64,
}

///
/// StateMetrics
///

#[derive(Clone, Debug, Default)]
pub struct StateMetrics {
    ops: HashMap<OpKind, OpCounters>,
}

impl StateMetrics {
    #[must_use]
    pub fn op(&self, op: OpKind) -> OpCounters {
        self.ops.get(&op).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_failures(&self) -> u64 {
        self.ops.values().map(|c| c.failures).sum()
    }

    fn entry(&mut self, op: OpKind) -> &mut OpCounters {
        self.ops.entry(op).or_default()
    }
}

///
/// MetricsSink
///

#[derive(Debug, Default)]
pub struct MetricsSink {
    state: RefCell<StateMetrics>,
}

impl MetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> StateMetrics {
        self.state.borrow().clone()
    }
}

impl StateSink for MetricsSink {
    fn record(&self, event: StateEvent<'_>) {
        let mut m = self.state.borrow_mut();

        match event {
            StateEvent::Read { op, found, .. } => {
                let entry = m.entry(op);
                entry.calls = entry.calls.saturating_add(1);
                if !found {
                    entry.misses = entry.misses.saturating_add(1);
                }
            }
            StateEvent::Write { op, bytes, .. } => {
                let entry = m.entry(op);
                entry.calls = entry.calls.saturating_add(1);
                entry.bytes_written = entry.bytes_written.saturating_add(bytes as u64);
            }
            StateEvent::Scan { op, rows, .. } => {
                let entry = m.entry(op);
                entry.calls = entry.calls.saturating_add(1);
                entry.rows = entry.rows.saturating_add(rows as u64);
            }
            StateEvent::Conflict { op, .. } => {
                let entry = m.entry(op);
                entry.conflicts = entry.conflicts.saturating_add(1);
            }
            StateEvent::Failure { op, .. } => {
                let entry = m.entry(op);
                entry.failures = entry.failures.saturating_add(1);
            }
        }
    }
}

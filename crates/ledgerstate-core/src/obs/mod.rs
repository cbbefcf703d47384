//! Observability: structured engine events and the sinks that consume them.
//!
//! Engine code never logs directly; it records `StateEvent`s into the sink
//! injected at construction.

mod metrics;
mod sink;

#[cfg(test)]
mod tests;

pub use metrics::{MetricsSink, OpCounters, StateMetrics};
pub use sink::{NoopSink, OpKind, StateEvent, StateSink, TracingSink};

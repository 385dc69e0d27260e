//! Observability boundary.
//!
//! Compile and serialize logic MUST NOT touch counter state directly; all
//! instrumentation flows through [`ObsEvent`] and [`ObsSink`]. This module
//! is the only bridge between the core paths and the counters.

pub mod metrics;
pub mod sink;

pub use metrics::{ObsCounters, report, reset_all};
pub use sink::{ObsEvent, ObsSink, with_obs_sink};

pub(crate) use sink::record;

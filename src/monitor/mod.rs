//! Sampling core: collector loop, rate derivation, bounded history, and the
//! producer/consumer handoff to the presentation layer.
//!
//! Everything here is UI-agnostic. OS bindings enter only through the
//! injected capability traits (`MetricsSource`, `CommandRunner`,
//! `ProcessProvider`), so the whole core runs against scripted fakes in
//! tests.

pub mod channel;
pub mod command;
pub mod history;
pub mod process;
pub mod rate;
pub mod sampler;
pub mod service;
pub mod snapshot;
pub mod source;

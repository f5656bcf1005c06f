//! sysdeck: a terminal dashboard for host resources.
//!
//! The crate splits into a UI-free monitoring core ([`monitor`]) and the
//! terminal front end built on top of it. The core runs on its own threads
//! and hands finished snapshots to the UI through a latest-wins channel, so
//! a slow redraw never blocks sampling.

pub mod action;
pub mod app;
pub mod config;
pub mod event;
pub mod format;
pub mod monitor;
pub mod ui;

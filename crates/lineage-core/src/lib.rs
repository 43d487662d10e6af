//! Command layer of the Lineage genealogy core.
//!
//! Everything here operates on the event-sourced stores in
//! `lineage-store`: commands validate against the read model, append
//! events with optimistic concurrency, and synchronously project the
//! committed events back into the read model before returning. On top
//! of the per-entity commands sit the person-merge engine (one atomic
//! cross-aggregate commit), the snapshot diff engine, and the history
//! service.
//!
//! # Modules
//!
//! - [`service`] -- The [`Core`] handle bundling stores and limits
//! - [`commands`] -- Per-entity create / update / delete services
//! - [`merge`] -- Person merging and duplicate dismissal
//! - [`snapshots`] -- Named snapshots and snapshot comparison
//! - [`history`] -- Global and per-entity change feeds
//! - [`state`] -- Pure event folds shared by every state consumer
//! - [`projection`] -- Synchronous read-model projection and rebuild
//! - [`config`] -- Tunable limits
//! - [`error`] -- The command-layer error taxonomy

pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod merge;
pub mod projection;
pub mod service;
pub mod snapshots;
pub mod state;

pub use config::Limits;
pub use error::{CoreError, ErrorKind};
pub use history::HistoryQuery;
pub use service::Core;

//! Core of calnote: keeps daily notes in step with a remote calendar.
//!
//! This crate provides everything except the command line:
//! - `store` remembers which `(name, due_date)` tasks were already emitted
//! - `reconcile` fetches the calendar and returns only unseen tasks
//! - `note` recognises daily notes and appends checklist lines to them
//! - `watch` turns file-creation events into serialized pipeline runs

pub mod config;
pub mod error;
pub mod ics;
pub mod note;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod task;
pub mod watch;

pub use config::CalnoteConfig;
pub use error::{CalNoteError, CalNoteResult};
pub use note::NoteAppender;
pub use pipeline::{CycleOutcome, Pipeline};
pub use reconcile::Reconciler;
pub use source::{CalendarSource, HttpSource};
pub use store::TaskStore;
pub use task::TaskRecord;
pub use watch::{NoteQueue, NoteWatcher, QueueSettings};

//! Core types for agenda-watch.
//!
//! This crate holds everything that does not touch the network:
//! - `Event` and `Snapshot`, the data compared between two fetches
//! - `diff` for field-level change detection between snapshots
//! - `render` for turning a delta into notification fields
//! - `ics` for reading a calendar feed into a snapshot

pub mod diff;
pub mod error;
pub mod event;
pub mod ics;
pub mod normalize;
pub mod render;
pub mod snapshot;
pub mod store;

pub use event::Event;
pub use snapshot::Snapshot;
pub use store::EventStore;

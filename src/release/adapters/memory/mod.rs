//! In-memory adapters for release synchronization tests.

mod tracker;

pub use tracker::{InMemoryTracker, IssueSnapshot, TrackerCall};

//! Application services for release synchronization.

mod sync;
mod tickets;
mod versions;

pub use sync::{
    DEFAULT_NETWORK_CONCURRENCY, DEFAULT_READY_ISSUE_TYPES, DEFAULT_READY_STATUS,
    ReleaseSyncError, ReleaseSyncReport, ReleaseSyncResult, ReleaseSyncService, SyncSettings,
    ready_tickets_query,
};
pub use tickets::{ActionOutcome, TicketAction, TicketActionRecord, TicketWorkflow};
pub use versions::{PreReleaseClosure, VersionOptions, VersionService};

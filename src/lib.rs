//! Release sync: keeps a Jira project in step with code releases.
//!
//! Given the commits of a release, the crate finds the tickets they
//! reference, moves and comments on those tickets, makes sure a tracker
//! version exists for the release, and attaches that version to every
//! ticket.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure release logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the tracker and commit history
//! - **Adapters**: Jira REST, in-memory, and `git` implementations
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`release`]: Ticket extraction, version resolution, and ticket updates

pub mod config;
pub mod release;

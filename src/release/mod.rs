//! Release synchronization between a code release and the issue tracker.
//!
//! A run extracts ticket keys from the release commits, advances those
//! tickets through the branch's configured workflow transition, resolves
//! the tracker version named after the release, closes stale daily
//! pre-releases on production, and tags every ticket with the version. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

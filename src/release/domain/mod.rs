//! Domain model for release synchronization.
//!
//! The release domain covers ticket extraction, version naming, and the
//! branch transition rules, keeping every tracker call outside of the domain
//! boundary.

mod context;
mod error;
mod ids;
mod template;
mod ticket;
mod transition;
mod version;

pub use context::{Commit, ReleaseContext, ReleaseStage};
pub use error::ReleaseDomainError;
pub use ids::{ProjectKey, StateId, TicketKey, VersionId};
pub use template::{
    DEFAULT_COMMENT_TEMPLATE, DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_VERSION_TEMPLATE,
    ReleaseTemplates, TemplateError, render_comment, validate_comment_template,
};
pub use ticket::TicketMatcher;
pub use transition::{
    BranchTransition, TransitionConfig, TransitionConfigError, TransitionOption, find_transition,
    validate_transition_config,
};
pub use version::{
    DEFAULT_PRE_RELEASE_PATTERN, NewVersion, PreReleasePattern, VersionRecord, VersionUpdate,
};

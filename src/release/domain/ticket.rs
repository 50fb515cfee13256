//! Ticket key extraction from commit messages.

use super::{Commit, ReleaseDomainError, TicketKey};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use tracing::info;

/// Compiled set of patterns that recognise ticket keys.
///
/// Matching never keeps cursor state between calls, so one matcher can scan
/// any number of messages in any order.
///
/// # Examples
///
///     use release_sync::release::domain::{Commit, TicketMatcher};
///
///     let matcher = TicketMatcher::from_prefixes(["ABC"]).expect("valid prefix");
///     let tickets = matcher.extract(&[Commit::new("a1b2c3d", "fix abc-12")]);
///     assert_eq!(tickets.len(), 1);
#[derive(Debug, Clone)]
pub struct TicketMatcher {
    patterns: Vec<Regex>,
}

impl TicketMatcher {
    /// Builds one `\bPREFIX-\d+\b` pattern per prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::MissingTicketPattern`] when no prefix is
    /// given, or [`ReleaseDomainError::EmptyTicketPrefix`] for blank entries.
    pub fn from_prefixes<I, S>(prefixes: I) -> Result<Self, ReleaseDomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = prefixes
            .into_iter()
            .map(|prefix| {
                let trimmed = prefix.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(ReleaseDomainError::EmptyTicketPrefix);
                }
                compile(&format!(r"\b{}-\d+\b", regex::escape(trimmed)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            return Err(ReleaseDomainError::MissingTicketPattern);
        }
        Ok(Self { patterns })
    }

    /// Uses an explicit pattern verbatim, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidPattern`] when the pattern does
    /// not compile.
    pub fn from_pattern(pattern: &str) -> Result<Self, ReleaseDomainError> {
        Ok(Self {
            patterns: vec![compile(pattern)?],
        })
    }

    /// Returns every ticket key found in a single message, in match order.
    #[must_use]
    pub fn matches_in(&self, message: &str) -> Vec<TicketKey> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.find_iter(message))
            .filter_map(|found| TicketKey::new(found.as_str()).ok())
            .collect()
    }

    /// Returns the distinct ticket keys referenced by `commits`, ordered by
    /// first appearance.
    #[must_use]
    pub fn extract(&self, commits: &[Commit]) -> Vec<TicketKey> {
        let mut seen = HashSet::new();
        let mut tickets = Vec::new();
        for commit in commits {
            for ticket in self.matches_in(commit.message()) {
                info!(ticket = %ticket, commit = commit.short_hash(), "found ticket in commit");
                if seen.insert(ticket.clone()) {
                    tickets.push(ticket);
                }
            }
        }
        tickets
    }
}

fn compile(pattern: &str) -> Result<Regex, ReleaseDomainError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .map_err(|err| ReleaseDomainError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: err.to_string(),
        })
}

//! Set-difference logic behind the sync.
//!
//! Every function here is pure and total. Inputs are treated as sets and
//! outputs are sorted ascending with duplicates removed, so repeated runs
//! against the same state produce identical plans. Names are compared
//! exactly; no case folding or Unicode normalization happens.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Candidate group names that have no managed-domain group yet.
///
/// `managed` holds the names of every existing managed-domain group.
pub fn groups_not_listed(candidates: Option<&[String]>, managed: &[String]) -> Vec<String> {
    let Some(candidates) = candidates else {
        return Vec::new();
    };
    let managed: BTreeSet<&str> = managed.iter().map(String::as_str).collect();

    sorted_unique(
        candidates
            .iter()
            .filter(|name| !managed.contains(name.as_str())),
    )
}

/// Directory groups the user lacks a managed membership for (additions).
pub fn extra_directory_groups(local_groups: &[String], directory_groups: &[String]) -> Vec<String> {
    difference(directory_groups, local_groups)
}

/// Managed groups the user holds that the directory no longer reports (removals).
pub fn extra_local_groups(local_groups: &[String], directory_groups: &[String]) -> Vec<String> {
    difference(local_groups, directory_groups)
}

fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let right: BTreeSet<&str> = right.iter().map(String::as_str).collect();
    sorted_unique(left.iter().filter(|name| !right.contains(name.as_str())))
}

fn sorted_unique<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    names
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// A single store change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    CreateGroup { group: String },
    AddMembership { user: String, group: String },
    RemoveMembership { user: String, group: String },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::CreateGroup { group } => write!(f, "create group {}", group),
            Mutation::AddMembership { user, group } => write!(f, "add {} to {}", user, group),
            Mutation::RemoveMembership { user, group } => {
                write!(f, "remove {} from {}", user, group)
            }
        }
    }
}

/// Additions and removals for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipPlan {
    pub user: String,
    pub additions: Vec<String>,
    pub removals: Vec<String>,
}

impl MembershipPlan {
    /// Diff the user's managed groups against the directory's view.
    pub fn compute(
        user: impl Into<String>,
        local_groups: &[String],
        directory_groups: &[String],
    ) -> Self {
        Self {
            user: user.into(),
            additions: extra_directory_groups(local_groups, directory_groups),
            removals: extra_local_groups(local_groups, directory_groups),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Drop removals outside `scope`.
    pub fn restrict_removals(mut self, scope: &BTreeSet<String>) -> Self {
        self.removals.retain(|group| scope.contains(group));
        self
    }

    /// Ordered mutations: every addition before any removal.
    pub fn mutations(&self) -> Vec<Mutation> {
        let adds = self.additions.iter().map(|group| Mutation::AddMembership {
            user: self.user.clone(),
            group: group.clone(),
        });
        let removes = self.removals.iter().map(|group| Mutation::RemoveMembership {
            user: self.user.clone(),
            group: group.clone(),
        });
        adds.chain(removes).collect()
    }
}

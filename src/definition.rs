// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain model for subdomain definitions and the change feed.
//!
//! A [`SubdomainDefinition`] is the validated form of one
//! `domains/<subdomain>.json` file: the desired state for that subdomain.
//! The change feed is the ordered list of (status, path) pairs produced by a
//! version-control diff that drives each reconciliation run.

use crate::constants::{DOMAINS_DIR, DOMAIN_FILE_EXT};
use crate::records::Record;
use anyhow::{bail, Result};

/// The contributor owning a subdomain definition.
///
/// The definition file may carry additional keys inside `user`; only the
/// username is required and retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Non-empty contributor handle
    pub username: String,
}

/// One validated subdomain definition: the desired state for a subdomain.
///
/// Identity is the `subdomain` field; the file must live at the path derived
/// from it (see [`definition_path`]), so there is exactly one definition per
/// subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainDefinition {
    /// The contributor owning this subdomain
    pub user: UserInfo,
    /// Optional free-form description
    pub description: Option<String>,
    /// The requested subdomain label, `[a-z0-9-]+`
    pub subdomain: String,
    /// Desired records, at least one
    pub records: Vec<Record>,
}

impl SubdomainDefinition {
    /// The repository path this definition must be stored at.
    #[must_use]
    pub fn expected_path(&self) -> String {
        definition_path(&self.subdomain)
    }

    /// Fully-qualified hostname of this subdomain under the parent zone.
    #[must_use]
    pub fn hostname(&self, zone_name: &str) -> String {
        fqdn(&self.subdomain, zone_name)
    }
}

/// Derive the repository path for a subdomain, `domains/<subdomain>.json`.
#[must_use]
pub fn definition_path(subdomain: &str) -> String {
    format!("{DOMAINS_DIR}/{subdomain}.{DOMAIN_FILE_EXT}")
}

/// Recover the subdomain from a definition path, the inverse of
/// [`definition_path`].
///
/// Returns `None` for paths outside the definitions directory or with the
/// wrong extension. Needed for the deletion path, where the file content is
/// already gone and the subdomain must come from the path alone.
#[must_use]
pub fn subdomain_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(DOMAINS_DIR)?.strip_prefix('/')?;
    let stem = rest.strip_suffix(&format!(".{DOMAIN_FILE_EXT}"))?;
    if stem.is_empty() || stem.contains('/') {
        return None;
    }
    Some(stem.to_string())
}

/// Qualify a record label with the parent zone name.
///
/// `fqdn("blog", "example.com")` is `blog.example.com`;
/// `fqdn("www.blog", "example.com")` is `www.blog.example.com`.
#[must_use]
pub fn fqdn(name: &str, zone_name: &str) -> String {
    format!("{name}.{zone_name}")
}

/// How a definition file changed in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// File was added; validate then converge
    Added,
    /// File was modified; validate then converge
    Modified,
    /// File was removed; tear down the subdomain's remote state
    Deleted,
}

/// One entry of the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// What happened to the file
    pub status: ChangeStatus,
    /// Repository-relative path, `domains/<subdomain>.json`
    pub path: String,
}

/// Parse a change feed in `git diff --name-status` form.
///
/// Each non-empty line is `<status-letter><whitespace><path>`. Lines whose
/// path is not a definition file (wrong directory or extension) are skipped;
/// the feed may legitimately contain unrelated repository changes. Order is
/// preserved, since files are reconciled in the order they were reported.
///
/// # Errors
///
/// Fails on a malformed line or an unsupported status letter (renames and
/// copies are not part of the contract).
pub fn parse_change_feed(text: &str) -> Result<Vec<ChangedFile>> {
    let mut changes = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((status, path)) = line.split_once(char::is_whitespace) else {
            bail!("malformed change feed line: '{line}'");
        };
        let path = path.trim();
        let status = match status {
            "A" => ChangeStatus::Added,
            "M" => ChangeStatus::Modified,
            "D" => ChangeStatus::Deleted,
            other => bail!("unsupported change status '{other}' in line: '{line}'"),
        };
        if subdomain_from_path(path).is_none() {
            continue;
        }
        changes.push(ChangedFile {
            status,
            path: path.to_string(),
        });
    }
    Ok(changes)
}

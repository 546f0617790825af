// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation: converging remote DNS records and redirect rules to the
//! validated desired state.
//!
//! Changed definition files are processed strictly in order, one at a time.
//! For each added or modified file, validation must pass before any network
//! effect; the DNS record diff then fully completes before redirect-rule
//! convergence begins, and before the next file starts. The redirect ruleset
//! is a single shared mutable resource across all hostnames, and its
//! read-modify-write cycle is only safe because writes are serialized here.
//! Anyone parallelizing this loop must keep ruleset writes under mutual
//! exclusion or a version-checked conditional write.
//!
//! No operation retries: a failed provider call aborts the whole run. The
//! record diff is idempotent, so re-running is the recovery mechanism.

use crate::api::{
    find_redirect_ruleset, list_all_records, records_for_hostname, RedirectRule, RemoteRecord,
    ZoneApi,
};
use crate::definition::{fqdn, subdomain_from_path, ChangeStatus, ChangedFile, SubdomainDefinition};
use crate::payload::{build_payload, RecordPayload};
use crate::records::Record;
use crate::reserved::ReservedNameSet;
use crate::validate::validate;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Counts of remote operations issued in one run, for the summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records created
    pub created: usize,
    /// Records updated
    pub updated: usize,
    /// Records deleted
    pub deleted: usize,
    /// Ruleset replace calls issued
    pub ruleset_writes: usize,
}

/// Process one change feed, file by file, in reported order.
///
/// # Arguments
///
/// * `api` - Provider boundary
/// * `zone_name` - Parent zone name, e.g. `example.com`
/// * `repo_root` - Directory the change feed paths are relative to
/// * `changes` - Ordered (status, path) pairs
/// * `reserved` - Reserved-subdomain denylist for validation
///
/// # Errors
///
/// Fails on the first validation error or provider failure; nothing after
/// the failing file is processed.
pub async fn process_changes(
    api: &dyn ZoneApi,
    zone_name: &str,
    repo_root: &Path,
    changes: &[ChangedFile],
    reserved: &ReservedNameSet,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for change in changes {
        match change.status {
            ChangeStatus::Added | ChangeStatus::Modified => {
                let content = std::fs::read_to_string(repo_root.join(&change.path))
                    .with_context(|| format!("cannot read '{}'", change.path))?;
                let definition = validate(&change.path, &content, reserved)
                    .map_err(|e| anyhow!("{}: {e}", change.path))?;
                info!(
                    subdomain = %definition.subdomain,
                    records = definition.records.len(),
                    "Definition validated, converging"
                );
                sync_definition(api, zone_name, &definition, &mut summary).await?;
            }
            ChangeStatus::Deleted => {
                // The file is gone; the subdomain comes from the path alone.
                let subdomain = subdomain_from_path(&change.path)
                    .ok_or_else(|| anyhow!("{}: not a definition path", change.path))?;
                info!(subdomain = %subdomain, "Definition removed, tearing down");
                delete_subdomain(api, zone_name, &subdomain, &mut summary).await?;
            }
        }
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        ruleset_writes = summary.ruleset_writes,
        "Run complete"
    );
    Ok(summary)
}

/// Converge one subdomain's records and redirect rules to its definition.
///
/// # Errors
///
/// Propagates the first failed provider call.
pub async fn sync_definition(
    api: &dyn ZoneApi,
    zone_name: &str,
    definition: &SubdomainDefinition,
    summary: &mut RunSummary,
) -> Result<()> {
    let hostname = definition.hostname(zone_name);
    let all = list_all_records(api).await?;
    let scoped = records_for_hostname(&hostname, &all);
    debug!(
        hostname = %hostname,
        existing = scoped.len(),
        desired = definition.records.len(),
        "Computing record diff"
    );

    converge_records(api, zone_name, &definition.records, &scoped, summary).await?;

    let rules = desired_rules(definition, zone_name);
    sync_redirects(api, &hostname, rules, summary).await
}

/// Tear down everything remote for a subdomain: records, then its slice of
/// the shared ruleset. No desired-state comparison is involved.
///
/// # Errors
///
/// Propagates the first failed provider call.
pub async fn delete_subdomain(
    api: &dyn ZoneApi,
    zone_name: &str,
    subdomain: &str,
    summary: &mut RunSummary,
) -> Result<()> {
    let hostname = fqdn(subdomain, zone_name);
    let all = list_all_records(api).await?;
    let scoped = records_for_hostname(&hostname, &all);

    for record in &scoped {
        info!(
            record_type = %record.record_type,
            name = %record.name,
            "Deleting record"
        );
        api.delete_record(&record.id).await?;
        summary.deleted += 1;
    }

    sync_redirects(api, &hostname, Vec::new(), summary).await
}

/// Replace-by-match, prune-the-rest record convergence.
///
/// Each desired record is matched against the remote set by `(type, name)`,
/// first match wins. Matching is the sole key: two desired records with the
/// same type and name are indistinguishable here and converge onto the same
/// remote record; that ambiguity is inherited behavior, not a bug to fix
/// silently. Matched records are compared field-by-field restricted to the
/// payload's fields and updated only on a difference, so an unchanged
/// desired state issues zero calls. Remote records never matched are
/// deleted.
async fn converge_records(
    api: &dyn ZoneApi,
    zone_name: &str,
    desired: &[Record],
    existing: &[RemoteRecord],
    summary: &mut RunSummary,
) -> Result<()> {
    let mut kept = vec![false; existing.len()];

    for record in desired {
        let payload = build_payload(record, zone_name);
        let matched = existing
            .iter()
            .position(|r| r.record_type == payload.record_type && r.name == payload.name);

        match matched {
            Some(i) => {
                kept[i] = true;
                if payload_matches(&existing[i], &payload) {
                    debug!(
                        record_type = %payload.record_type,
                        name = %payload.name,
                        "Record already in sync"
                    );
                } else {
                    info!(
                        record_type = %payload.record_type,
                        name = %payload.name,
                        "Updating record"
                    );
                    api.update_record(&existing[i].id, &payload).await?;
                    summary.updated += 1;
                }
            }
            None => {
                info!(
                    record_type = %payload.record_type,
                    name = %payload.name,
                    "Creating record"
                );
                api.create_record(&payload).await?;
                summary.created += 1;
            }
        }
    }

    for (record, kept) in existing.iter().zip(&kept) {
        if !kept {
            info!(
                record_type = %record.record_type,
                name = %record.name,
                "Pruning record no longer in definition"
            );
            api.delete_record(&record.id).await?;
            summary.deleted += 1;
        }
    }

    Ok(())
}

/// Whether a remote record already carries everything the payload would set.
///
/// Comparison is restricted to fields present in the payload: simple
/// equality on content/proxied/priority/ttl and deep equality on the
/// structured data block.
fn payload_matches(remote: &RemoteRecord, payload: &RecordPayload) -> bool {
    if remote.ttl != Some(payload.ttl) {
        return false;
    }
    if let Some(content) = &payload.content {
        if remote.content.as_ref() != Some(content) {
            return false;
        }
    }
    if let Some(data) = &payload.data {
        if remote.data.as_ref() != Some(data) {
            return false;
        }
    }
    if payload.proxied.is_some() && remote.proxied != payload.proxied {
        return false;
    }
    if payload.priority.is_some() && remote.priority != payload.priority {
        return false;
    }
    true
}

/// The redirect rules a definition wants: one per URL record.
fn desired_rules(definition: &SubdomainDefinition, zone_name: &str) -> Vec<RedirectRule> {
    definition
        .records
        .iter()
        .filter_map(|record| match record {
            Record::Url { name, value } => {
                Some(RedirectRule::for_hostname(&fqdn(name, zone_name), value))
            }
            _ => None,
        })
        .collect()
}

/// Replace this hostname's slice of the shared ruleset.
///
/// Rules owned by other hostnames are kept verbatim; this hostname's current
/// rules are discarded and replaced by `new_rules` in a single replace call.
/// The write is skipped when there are no new rules and none were discarded,
/// so runs with no URL records touch the ruleset read-only. The ruleset
/// itself is created only when the first rule needs somewhere to live.
async fn sync_redirects(
    api: &dyn ZoneApi,
    hostname: &str,
    new_rules: Vec<RedirectRule>,
    summary: &mut RunSummary,
) -> Result<()> {
    let (ruleset_id, existing) = match find_redirect_ruleset(api).await? {
        Some(id) => {
            let ruleset = api.get_ruleset(&id).await?;
            (ruleset.id, ruleset.rules.unwrap_or_default())
        }
        None if new_rules.is_empty() => {
            debug!(hostname = %hostname, "No ruleset and no redirect rules to converge");
            return Ok(());
        }
        None => {
            let created = api.create_ruleset().await?;
            (created.id, created.rules.unwrap_or_default())
        }
    };

    let (mine, mut others): (Vec<_>, Vec<_>) =
        existing.into_iter().partition(|r| r.owned_by(hostname));

    if new_rules.is_empty() && mine.is_empty() {
        debug!(hostname = %hostname, "No redirect rules to converge");
        return Ok(());
    }

    info!(
        hostname = %hostname,
        replaced = mine.len(),
        new = new_rules.len(),
        "Replacing hostname's slice of the redirect ruleset"
    );
    others.extend(new_rules);
    api.replace_ruleset_rules(&ruleset_id, &others).await?;
    summary.ruleset_writes += 1;
    Ok(())
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Subzone - Declarative Subdomain Registry Reconciler
//!
//! Subzone lets many independent contributors claim a subdomain of a shared
//! parent domain by submitting one JSON file per subdomain into a
//! version-controlled repository. It validates each definition against a
//! strict schema and converges the provider's DNS zone and redirect ruleset
//! to match.
//!
//! ## Overview
//!
//! This library provides the core functionality for the subzone CLI:
//!
//! - Strict validation of subdomain definitions (eleven record kinds with
//!   per-type field contracts and cross-record invariants)
//! - A reconciliation loop computing and applying create/update/delete
//!   diffs against the remote zone
//! - Redirect-rule management for URL pseudo-records via the provider's
//!   rule engine
//!
//! ## Modules
//!
//! - [`definition`] - Domain model and change feed types
//! - [`records`] - Record kinds and per-type field contracts
//! - [`validate`] - The fail-fast definition validator
//! - [`reserved`] - Reserved-subdomain denylist
//! - [`payload`] - Mapping of domain records to provider bodies
//! - [`api`] - Provider API boundary (records and rulesets)
//! - [`reconcile`] - Per-changed-file convergence
//!
//! ## Example
//!
//! ```rust
//! use subzone::reserved::ReservedNameSet;
//! use subzone::validate::validate;
//!
//! let reserved = ReservedNameSet::from_names(["www"]);
//! let definition = validate(
//!     "domains/blog.json",
//!     r#"{
//!         "user": { "username": "alice" },
//!         "subdomain": "blog",
//!         "records": [
//!             { "type": "A", "name": "blog", "value": "203.0.113.5" }
//!         ]
//!     }"#,
//!     &reserved,
//! )
//! .expect("definition is valid");
//! assert_eq!(definition.subdomain, "blog");
//! ```

pub mod api;
pub mod constants;
pub mod definition;
pub mod errors;
pub mod payload;
pub mod reconcile;
pub mod records;
pub mod reserved;
pub mod validate;

#[cfg(test)]
mod payload_tests;
#[cfg(test)]
mod reconcile_tests;
#[cfg(test)]
mod reserved_tests;

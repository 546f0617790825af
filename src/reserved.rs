// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reserved-subdomain denylist.
//!
//! The side file maps category names to arrays of reserved subdomain strings,
//! for example:
//!
//! ```json
//! {
//!   "infrastructure": ["www", "mail", "ns1"],
//!   "abuse": ["admin", "login"]
//! }
//! ```
//!
//! All arrays are flattened into one case-normalized set. Loading is the one
//! recoverable failure in the system: a missing or malformed file degrades to
//! an empty set with a warning, so validation continues without the reserved
//! check rather than blocking every contributor.

use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Immutable denylist of subdomain names, constructed once at startup and
/// injected into the validator.
#[derive(Debug, Clone, Default)]
pub struct ReservedNameSet {
    names: HashSet<String>,
}

impl ReservedNameSet {
    /// Load the denylist from the side file, degrading to an empty set.
    ///
    /// Never fails: an unreadable file, invalid JSON, or an unexpected shape
    /// all produce an empty set and a warning.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read reserved-subdomain file; reserved-name check disabled"
                );
                return Self::default();
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Reserved-subdomain file is not valid JSON; reserved-name check disabled"
                );
                return Self::default();
            }
        };

        let Value::Object(categories) = value else {
            warn!(
                path = %path.display(),
                "Reserved-subdomain file is not a JSON object; reserved-name check disabled"
            );
            return Self::default();
        };

        let mut names = HashSet::new();
        for (category, entry) in categories {
            let Value::Array(values) = entry else {
                warn!(
                    category = %category,
                    "Reserved-subdomain category is not an array; skipping"
                );
                continue;
            };
            for value in values {
                if let Value::String(name) = value {
                    names.insert(name.to_lowercase());
                }
            }
        }

        debug!(count = names.len(), "Loaded reserved-subdomain denylist");
        Self { names }
    }

    /// Build a set from explicit names. Test and embedding convenience.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether a subdomain is reserved. Case-insensitive.
    #[must_use]
    pub fn contains(&self, subdomain: &str) -> bool {
        self.names.contains(&subdomain.to_lowercase())
    }

    /// Number of reserved names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty (e.g. after a degraded load).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

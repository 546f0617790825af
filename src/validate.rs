// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Subdomain definition validation.
//!
//! [`validate`] is a pure, fail-fast function of one definition file plus the
//! reserved-name set; no network, no filesystem. The first violated rule
//! aborts with a descriptive [`ValidationError`], so re-validating the same
//! input always yields the same verdict and the same message.
//!
//! Checks run in a fixed order: JSON well-formedness, top-level key set,
//! required top-level keys, user object shape, subdomain format, reserved
//! membership, filename/subdomain correspondence, records array shape, then
//! per-record checks, and finally the cross-record DS-requires-NS rule. The
//! order matters for reproducible failure messages, not for correctness.

use crate::constants::{ALLOWED_RECORD_KEYS, ALLOWED_TOP_LEVEL_KEYS, REQUIRED_TOP_LEVEL_KEYS};
use crate::definition::{definition_path, SubdomainDefinition, UserInfo};
use crate::errors::ValidationError;
use crate::records::{record_from_fields, Record, RecordKind};
use serde_json::{Map, Value};

/// Validate one subdomain definition file.
///
/// # Arguments
///
/// * `path` - Repository-relative path the file was submitted under
/// * `content` - Raw file content
/// * `reserved` - The reserved-subdomain denylist
///
/// # Errors
///
/// Returns the first violated rule; nothing about the definition is applied
/// partially on failure.
pub fn validate(
    path: &str,
    content: &str,
    reserved: &crate::reserved::ReservedNameSet,
) -> Result<SubdomainDefinition, ValidationError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ValidationError::MalformedJson {
            reason: e.to_string(),
        })?;
    let Value::Object(root) = value else {
        return Err(ValidationError::NotAnObject);
    };

    for key in root.keys() {
        if !ALLOWED_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(ValidationError::UnknownTopLevelKey { key: key.clone() });
        }
    }
    for key in REQUIRED_TOP_LEVEL_KEYS {
        if !root.contains_key(key) {
            return Err(ValidationError::MissingTopLevelKey { key });
        }
    }

    let user = validate_user(&root)?;
    let subdomain = validate_subdomain(&root, reserved)?;

    let expected = definition_path(&subdomain);
    if path != expected {
        return Err(ValidationError::FilenameMismatch {
            subdomain,
            path: path.to_string(),
            expected,
        });
    }

    let raw_records = match root.get("records") {
        Some(Value::Array(records)) => records,
        Some(_) => return Err(ValidationError::RecordsNotArray),
        // unreachable: required-key check ran above
        None => return Err(ValidationError::MissingTopLevelKey { key: "records" }),
    };
    if raw_records.is_empty() {
        return Err(ValidationError::NoRecords);
    }

    let mut records = Vec::with_capacity(raw_records.len());
    for (index, raw) in raw_records.iter().enumerate() {
        records.push(validate_record(index, raw, &subdomain)?);
    }

    let has_ds = records.iter().any(|r| r.kind() == RecordKind::Ds);
    let has_ns = records.iter().any(|r| r.kind() == RecordKind::Ns);
    if has_ds && !has_ns {
        return Err(ValidationError::DsRequiresNs);
    }

    let description = match root.get("description") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };

    Ok(SubdomainDefinition {
        user,
        description,
        subdomain,
        records,
    })
}

/// Check the `user` object and extract its username.
fn validate_user(root: &Map<String, Value>) -> Result<UserInfo, ValidationError> {
    let Some(Value::Object(user)) = root.get("user") else {
        return Err(ValidationError::InvalidUser {
            reason: "'user' must be an object".to_string(),
        });
    };
    match user.get("username") {
        Some(Value::String(username)) if !username.is_empty() => Ok(UserInfo {
            username: username.clone(),
        }),
        _ => Err(ValidationError::InvalidUser {
            reason: "'user.username' must be a non-empty string".to_string(),
        }),
    }
}

/// Check subdomain format and reserved-name membership.
fn validate_subdomain(
    root: &Map<String, Value>,
    reserved: &crate::reserved::ReservedNameSet,
) -> Result<String, ValidationError> {
    let Some(Value::String(subdomain)) = root.get("subdomain") else {
        return Err(ValidationError::SubdomainNotString);
    };
    let well_formed = !subdomain.is_empty()
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(ValidationError::InvalidSubdomain {
            subdomain: subdomain.clone(),
        });
    }
    if reserved.contains(subdomain) {
        return Err(ValidationError::ReservedSubdomain {
            subdomain: subdomain.clone(),
        });
    }
    Ok(subdomain.clone())
}

/// Run all per-record checks in order and build the typed record.
fn validate_record(
    index: usize,
    raw: &Value,
    subdomain: &str,
) -> Result<Record, ValidationError> {
    let Value::Object(fields) = raw else {
        return Err(ValidationError::RecordNotObject { index });
    };

    // Unknown keys fail before type-specific checks, regardless of type.
    for key in fields.keys() {
        if !ALLOWED_RECORD_KEYS.contains(&key.as_str()) {
            return Err(ValidationError::UnknownRecordKey {
                index,
                key: key.clone(),
            });
        }
    }

    let Some(Value::String(type_str)) = fields.get("type") else {
        return Err(ValidationError::MissingRecordType { index });
    };
    let Some(kind) = RecordKind::parse(type_str) else {
        return Err(ValidationError::UnknownRecordType {
            index,
            record_type: type_str.clone(),
        });
    };

    let Some(Value::String(name)) = fields.get("name") else {
        return Err(ValidationError::RecordNameNotString { index });
    };
    if name.contains('*') {
        return Err(ValidationError::WildcardRecordName {
            index,
            name: name.clone(),
        });
    }
    let in_scope = name == subdomain || name.ends_with(&format!(".{subdomain}"));
    if !in_scope {
        return Err(ValidationError::RecordOutsideSubdomain {
            index,
            name: name.clone(),
            subdomain: subdomain.to_string(),
        });
    }

    let proxied = match fields.get("proxied") {
        None => false,
        Some(Value::Bool(b)) => {
            if !kind.supports_proxy() {
                return Err(ValidationError::ProxiedNotAllowed {
                    index,
                    record_type: kind,
                });
            }
            *b
        }
        Some(_) => return Err(ValidationError::ProxiedNotBoolean { index }),
    };

    if kind.apex_only() && name != subdomain {
        return Err(ValidationError::ApexOnly {
            index,
            record_type: kind,
        });
    }

    record_from_fields(index, kind, name.clone(), proxied, fields)
}

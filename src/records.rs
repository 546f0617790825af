// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record kinds and per-type field contracts.
//!
//! A subdomain definition carries an array of records, each a tagged variant
//! over eleven kinds. [`RecordKind`] is the closed set of supported types and
//! [`Record`] the fully-checked domain model; both the validator and the
//! payload builder match exhaustively over them, so adding a kind forces
//! handling everywhere the compiler can see.
//!
//! Field contracts per kind:
//!
//! | Kind | Required fields | Constraints |
//! |------|-----------------|-------------|
//! | A | `value` | strict IPv4 dotted-quad |
//! | AAAA | `value` | IPv6 (full, compressed or mixed) |
//! | CNAME | `value` | — |
//! | TXT | `value` | — |
//! | URL | `value` | redirect target, not a DNS value |
//! | MX | `target`, `priority` | priority >= 0 |
//! | SRV | `priority`, `weight`, `port`, `target` | port > 0 |
//! | CAA | `flags`, `tag`, `value` | — |
//! | NS | `value` | name must equal the subdomain |
//! | DS | `key_tag`, `algorithm`, `digest_type`, `digest` | apex only, needs a sibling NS |
//! | TLSA | `usage`, `selector`, `matching_type`, `certificate` | — |

use crate::errors::ValidationError;
use serde_json::{Map, Value};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// The closed set of record types a definition may declare.
///
/// The `type` field of a record is matched case-insensitively against
/// these kinds; anything else is rejected up front by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name (alias) record
    Cname,
    /// Text record
    Txt,
    /// Pseudo-record implemented as a proxied placeholder plus a redirect rule
    Url,
    /// Mail exchange record
    Mx,
    /// Service location record
    Srv,
    /// Certificate authority authorization record
    Caa,
    /// Nameserver delegation record
    Ns,
    /// Delegation signer record
    Ds,
    /// TLSA certificate association record
    Tlsa,
}

impl RecordKind {
    /// Parse a record type string, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "AAAA" => Some(Self::Aaaa),
            "CNAME" => Some(Self::Cname),
            "TXT" => Some(Self::Txt),
            "URL" => Some(Self::Url),
            "MX" => Some(Self::Mx),
            "SRV" => Some(Self::Srv),
            "CAA" => Some(Self::Caa),
            "NS" => Some(Self::Ns),
            "DS" => Some(Self::Ds),
            "TLSA" => Some(Self::Tlsa),
            _ => None,
        }
    }

    /// Canonical uppercase name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Txt => "TXT",
            Self::Url => "URL",
            Self::Mx => "MX",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Ns => "NS",
            Self::Ds => "DS",
            Self::Tlsa => "TLSA",
        }
    }

    /// Whether the provider's proxy flag is legal for this kind.
    #[must_use]
    pub fn supports_proxy(self) -> bool {
        matches!(self, Self::A | Self::Aaaa | Self::Cname)
    }

    /// Whether this kind may only sit at the subdomain apex.
    #[must_use]
    pub fn apex_only(self) -> bool {
        matches!(self, Self::Ns | Self::Ds)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-validated record of a subdomain definition.
///
/// A record has no lifecycle of its own; it exists only inside its owning
/// definition's array. Order is irrelevant, and duplicates of the same
/// `(type, name)` are legal (the reconciler matches first-found).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A record: `value` is a dotted-quad IPv4 address
    A {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// IPv4 address
        value: String,
        /// Route through the provider's proxy
        proxied: bool,
    },
    /// AAAA record: `value` is an IPv6 address
    Aaaa {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// IPv6 address
        value: String,
        /// Route through the provider's proxy
        proxied: bool,
    },
    /// CNAME record
    Cname {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Alias target
        value: String,
        /// Route through the provider's proxy
        proxied: bool,
    },
    /// TXT record
    Txt {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Text content
        value: String,
    },
    /// URL pseudo-record; `value` is the redirect target
    Url {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Redirect target URL
        value: String,
    },
    /// MX record
    Mx {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Mail server hostname
        target: String,
        /// Preference value
        priority: u16,
    },
    /// SRV record; the name encodes service and protocol labels
    Srv {
        /// `_service._proto.<label>` form
        name: String,
        /// Priority of the target host
        priority: u16,
        /// Relative weight among same-priority targets
        weight: u16,
        /// Service port, non-zero
        port: u16,
        /// Target hostname
        target: String,
    },
    /// CAA record
    Caa {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Issuer-critical flags
        flags: u8,
        /// Property tag (issue, issuewild, iodef)
        tag: String,
        /// Property value
        value: String,
    },
    /// NS delegation record, apex only
    Ns {
        /// Must equal the subdomain
        name: String,
        /// Nameserver hostname
        value: String,
    },
    /// DS record, apex only, requires a sibling NS
    Ds {
        /// Must equal the subdomain
        name: String,
        /// Key tag of the referenced DNSKEY
        key_tag: u16,
        /// DNSSEC algorithm number
        algorithm: u8,
        /// Digest algorithm number
        digest_type: u8,
        /// Hex digest of the DNSKEY
        digest: String,
    },
    /// TLSA record
    Tlsa {
        /// Label, equal to the subdomain or a child of it
        name: String,
        /// Certificate usage
        usage: u8,
        /// Selector
        selector: u8,
        /// Matching type
        matching_type: u8,
        /// Certificate association data
        certificate: String,
    },
}

impl Record {
    /// Kind of this record.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::A { .. } => RecordKind::A,
            Self::Aaaa { .. } => RecordKind::Aaaa,
            Self::Cname { .. } => RecordKind::Cname,
            Self::Txt { .. } => RecordKind::Txt,
            Self::Url { .. } => RecordKind::Url,
            Self::Mx { .. } => RecordKind::Mx,
            Self::Srv { .. } => RecordKind::Srv,
            Self::Caa { .. } => RecordKind::Caa,
            Self::Ns { .. } => RecordKind::Ns,
            Self::Ds { .. } => RecordKind::Ds,
            Self::Tlsa { .. } => RecordKind::Tlsa,
        }
    }

    /// The record's label, relative to the parent zone.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::A { name, .. }
            | Self::Aaaa { name, .. }
            | Self::Cname { name, .. }
            | Self::Txt { name, .. }
            | Self::Url { name, .. }
            | Self::Mx { name, .. }
            | Self::Srv { name, .. }
            | Self::Caa { name, .. }
            | Self::Ns { name, .. }
            | Self::Ds { name, .. }
            | Self::Tlsa { name, .. } => name,
        }
    }
}

/// Check type-specific field contracts and build the typed record.
///
/// Global checks (key set, type membership, name scoping, proxied rules)
/// have already run by the time this is called; this function is only
/// concerned with the per-kind required fields, their JSON types, and
/// numeric ranges.
///
/// # Errors
///
/// Returns the first violated contract as a [`ValidationError`].
pub(crate) fn record_from_fields(
    index: usize,
    kind: RecordKind,
    name: String,
    proxied: bool,
    fields: &Map<String, Value>,
) -> Result<Record, ValidationError> {
    match kind {
        RecordKind::A => {
            let value = string_field(fields, "value", index, kind)?;
            if Ipv4Addr::from_str(&value).is_err() {
                return Err(ValidationError::InvalidIpv4 { index, value });
            }
            Ok(Record::A {
                name,
                value,
                proxied,
            })
        }
        RecordKind::Aaaa => {
            let value = string_field(fields, "value", index, kind)?;
            if Ipv6Addr::from_str(&value).is_err() {
                return Err(ValidationError::InvalidIpv6 { index, value });
            }
            Ok(Record::Aaaa {
                name,
                value,
                proxied,
            })
        }
        RecordKind::Cname => {
            let value = string_field(fields, "value", index, kind)?;
            Ok(Record::Cname {
                name,
                value,
                proxied,
            })
        }
        RecordKind::Txt => {
            let value = string_field(fields, "value", index, kind)?;
            Ok(Record::Txt { name, value })
        }
        RecordKind::Url => {
            let value = string_field(fields, "value", index, kind)?;
            Ok(Record::Url { name, value })
        }
        RecordKind::Mx => {
            let target = string_field(fields, "target", index, kind)?;
            let priority = u16_field(fields, "priority", index, kind)?;
            Ok(Record::Mx {
                name,
                target,
                priority,
            })
        }
        RecordKind::Srv => {
            let priority = u16_field(fields, "priority", index, kind)?;
            let weight = u16_field(fields, "weight", index, kind)?;
            let port = u16_field(fields, "port", index, kind)?;
            if port == 0 {
                return Err(ValidationError::FieldOutOfRange {
                    index,
                    record_type: kind,
                    field: "port",
                    reason: "must be greater than zero".to_string(),
                });
            }
            let target = string_field(fields, "target", index, kind)?;
            Ok(Record::Srv {
                name,
                priority,
                weight,
                port,
                target,
            })
        }
        RecordKind::Caa => {
            let flags = u8_field(fields, "flags", index, kind)?;
            let tag = string_field(fields, "tag", index, kind)?;
            let value = string_field(fields, "value", index, kind)?;
            Ok(Record::Caa {
                name,
                flags,
                tag,
                value,
            })
        }
        RecordKind::Ns => {
            let value = string_field(fields, "value", index, kind)?;
            Ok(Record::Ns { name, value })
        }
        RecordKind::Ds => {
            let key_tag = u16_field(fields, "key_tag", index, kind)?;
            let algorithm = u8_field(fields, "algorithm", index, kind)?;
            let digest_type = u8_field(fields, "digest_type", index, kind)?;
            let digest = string_field(fields, "digest", index, kind)?;
            Ok(Record::Ds {
                name,
                key_tag,
                algorithm,
                digest_type,
                digest,
            })
        }
        RecordKind::Tlsa => {
            let usage = u8_field(fields, "usage", index, kind)?;
            let selector = u8_field(fields, "selector", index, kind)?;
            let matching_type = u8_field(fields, "matching_type", index, kind)?;
            let certificate = string_field(fields, "certificate", index, kind)?;
            Ok(Record::Tlsa {
                name,
                usage,
                selector,
                matching_type,
                certificate,
            })
        }
    }
}

/// Fetch a required string field from a record object.
fn string_field(
    fields: &Map<String, Value>,
    field: &'static str,
    index: usize,
    record_type: RecordKind,
) -> Result<String, ValidationError> {
    match fields.get(field) {
        None => Err(ValidationError::MissingField {
            index,
            record_type,
            field,
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::InvalidFieldType {
            index,
            record_type,
            field,
            expected: "a string",
        }),
    }
}

/// Fetch a required non-negative integer field from a record object.
///
/// JSON numbers that are negative or fractional are rejected here; range
/// narrowing happens in the width-specific wrappers below.
fn integer_field(
    fields: &Map<String, Value>,
    field: &'static str,
    index: usize,
    record_type: RecordKind,
) -> Result<u64, ValidationError> {
    match fields.get(field) {
        None => Err(ValidationError::MissingField {
            index,
            record_type,
            field,
        }),
        Some(Value::Number(n)) => n.as_u64().ok_or(ValidationError::FieldOutOfRange {
            index,
            record_type,
            field,
            reason: "must be a non-negative integer".to_string(),
        }),
        Some(_) => Err(ValidationError::InvalidFieldType {
            index,
            record_type,
            field,
            expected: "a number",
        }),
    }
}

fn u16_field(
    fields: &Map<String, Value>,
    field: &'static str,
    index: usize,
    record_type: RecordKind,
) -> Result<u16, ValidationError> {
    let raw = integer_field(fields, field, index, record_type)?;
    u16::try_from(raw).map_err(|_| ValidationError::FieldOutOfRange {
        index,
        record_type,
        field,
        reason: format!("must be at most {}", u16::MAX),
    })
}

fn u8_field(
    fields: &Map<String, Value>,
    field: &'static str,
    index: usize,
    record_type: RecordKind,
) -> Result<u8, ValidationError> {
    let raw = integer_field(fields, field, index, record_type)?;
    u8::try_from(raw).map_err(|_| ValidationError::FieldOutOfRange {
        index,
        record_type,
        field,
        reason: format!("must be at most {}", u8::MAX),
    })
}

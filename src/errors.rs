// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Validation and provider API error types for subzone.
//!
//! This module provides specialized error types for:
//! - Schema and invariant violations in subdomain definition files
//! - Provider API failures (transport, HTTP status, unsuccessful envelopes)
//!
//! Validation is fail-fast: the first violated rule aborts the run for that
//! file, so every variant here carries enough context to stand alone as the
//! single diagnostic line the user sees.

use crate::records::RecordKind;
use thiserror::Error;

/// Errors raised while validating one subdomain definition file.
///
/// Variants are ordered roughly by the check order of the validator: file
/// shape, top-level schema, subdomain semantics, then per-record rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// File content is not parseable JSON
    #[error("file is not valid JSON: {reason}")]
    MalformedJson {
        /// Parser message describing the syntax problem
        reason: String,
    },

    /// File parses but the root value is not an object
    #[error("definition root must be a JSON object")]
    NotAnObject,

    /// A top-level key outside {user, description, subdomain, records}
    #[error("unexpected top-level key '{key}'")]
    UnknownTopLevelKey {
        /// The offending key
        key: String,
    },

    /// A required top-level key is absent
    #[error("missing required key '{key}'")]
    MissingTopLevelKey {
        /// The absent key
        key: &'static str,
    },

    /// The `user` object is missing, malformed, or has no usable username
    #[error("invalid 'user' object: {reason}")]
    InvalidUser {
        /// Explanation of what is wrong with the user object
        reason: String,
    },

    /// `subdomain` is present but not a string
    #[error("'subdomain' must be a string")]
    SubdomainNotString,

    /// `subdomain` contains characters outside `[a-z0-9-]` or is empty
    #[error("subdomain '{subdomain}' must contain only lowercase letters, digits and hyphens")]
    InvalidSubdomain {
        /// The rejected subdomain
        subdomain: String,
    },

    /// `subdomain` appears in the reserved-name denylist
    #[error("subdomain '{subdomain}' is reserved and cannot be registered")]
    ReservedSubdomain {
        /// The reserved subdomain
        subdomain: String,
    },

    /// The file path does not correspond to the subdomain it declares
    #[error("definition for '{subdomain}' must live at '{expected}', found at '{path}'")]
    FilenameMismatch {
        /// The declared subdomain
        subdomain: String,
        /// The path the file was actually submitted under
        path: String,
        /// The path derived from the subdomain
        expected: String,
    },

    /// `records` is present but not an array
    #[error("'records' must be an array")]
    RecordsNotArray,

    /// `records` is an empty array
    #[error("'records' must contain at least one record")]
    NoRecords,

    /// A records entry is not a JSON object
    #[error("record {index} is not a JSON object")]
    RecordNotObject {
        /// Zero-based position in the records array
        index: usize,
    },

    /// A record carries a key outside the global allowed-key set
    #[error("record {index} has unknown key '{key}'")]
    UnknownRecordKey {
        /// Zero-based position in the records array
        index: usize,
        /// The offending key
        key: String,
    },

    /// A record has no string `type` field
    #[error("record {index} is missing a string 'type' field")]
    MissingRecordType {
        /// Zero-based position in the records array
        index: usize,
    },

    /// A record's `type` is not one of the eleven supported kinds
    #[error("record {index} has unsupported type '{record_type}'")]
    UnknownRecordType {
        /// Zero-based position in the records array
        index: usize,
        /// The rejected type string as submitted
        record_type: String,
    },

    /// A record has no string `name` field
    #[error("record {index} is missing a string 'name' field")]
    RecordNameNotString {
        /// Zero-based position in the records array
        index: usize,
    },

    /// A record name contains a wildcard marker
    #[error("record {index} name '{name}' must not contain a wildcard")]
    WildcardRecordName {
        /// Zero-based position in the records array
        index: usize,
        /// The rejected name
        name: String,
    },

    /// A record name falls outside the subdomain's namespace
    #[error("record {index} name '{name}' is outside assigned subdomain '{subdomain}'")]
    RecordOutsideSubdomain {
        /// Zero-based position in the records array
        index: usize,
        /// The rejected name
        name: String,
        /// The subdomain the definition owns
        subdomain: String,
    },

    /// `proxied` is present but not a boolean
    #[error("record {index}: 'proxied' must be a boolean")]
    ProxiedNotBoolean {
        /// Zero-based position in the records array
        index: usize,
    },

    /// `proxied` set on a record kind that cannot be proxied
    #[error("record {index}: 'proxied' is only allowed for A, AAAA and CNAME records, not {record_type}")]
    ProxiedNotAllowed {
        /// Zero-based position in the records array
        index: usize,
        /// The record's kind
        record_type: RecordKind,
    },

    /// NS or DS record placed on a child label instead of the subdomain apex
    #[error("record {index}: {record_type} records must use the subdomain itself as name")]
    ApexOnly {
        /// Zero-based position in the records array
        index: usize,
        /// NS or DS
        record_type: RecordKind,
    },

    /// A DS record exists without any sibling NS record
    #[error("DS records require at least one NS record in the same definition")]
    DsRequiresNs,

    /// A type-specific required field is absent
    #[error("record {index} ({record_type}): missing required field '{field}'")]
    MissingField {
        /// Zero-based position in the records array
        index: usize,
        /// The record's kind
        record_type: RecordKind,
        /// The absent field
        field: &'static str,
    },

    /// A type-specific field has the wrong JSON type
    #[error("record {index} ({record_type}): field '{field}' must be {expected}")]
    InvalidFieldType {
        /// Zero-based position in the records array
        index: usize,
        /// The record's kind
        record_type: RecordKind,
        /// The offending field
        field: &'static str,
        /// Human-readable description of the expected type
        expected: &'static str,
    },

    /// A numeric field is outside its permitted range
    #[error("record {index} ({record_type}): field '{field}' {reason}")]
    FieldOutOfRange {
        /// Zero-based position in the records array
        index: usize,
        /// The record's kind
        record_type: RecordKind,
        /// The offending field
        field: &'static str,
        /// Explanation of the violated range
        reason: String,
    },

    /// An A record value that is not a strict dotted-quad IPv4 address
    #[error("record {index}: '{value}' is not a valid IPv4 address")]
    InvalidIpv4 {
        /// Zero-based position in the records array
        index: usize,
        /// The rejected value
        value: String,
    },

    /// An AAAA record value that is not a valid IPv6 address
    #[error("record {index}: '{value}' is not a valid IPv6 address")]
    InvalidIpv6 {
        /// Zero-based position in the records array
        index: usize,
        /// The rejected value
        value: String,
    },
}

/// Errors raised while talking to the provider API.
///
/// Any of these aborts the entire run; convergence is idempotent, so the
/// recovery mechanism is simply re-running against the same change set.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP request could not be sent or the response not read
    #[error("provider request {method} {url} failed: {source}")]
    Transport {
        /// HTTP method of the failed request
        method: &'static str,
        /// Full request URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success HTTP status
    #[error("provider returned HTTP {status} for {method} {url}: {body}")]
    Status {
        /// HTTP method of the failed request
        method: &'static str,
        /// Full request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body (truncated by the caller if huge)
        body: String,
    },

    /// The provider answered 2xx but the envelope reported failure
    #[error("provider reported failure for {method} {url}: {messages}")]
    Unsuccessful {
        /// HTTP method of the failed request
        method: &'static str,
        /// Full request URL
        url: String,
        /// Joined provider error messages
        messages: String,
    },

    /// The response body did not match the expected shape
    #[error("provider response for {method} {url} was not the expected shape: {reason}")]
    Decode {
        /// HTTP method of the failed request
        method: &'static str,
        /// Full request URL
        url: String,
        /// Decoder message
        reason: String,
    },
}

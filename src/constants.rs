// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for subzone.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Repository Layout Constants
// ============================================================================

/// Directory (relative to the repository root) holding one definition file per subdomain
pub const DOMAINS_DIR: &str = "domains";

/// File extension for subdomain definition files
pub const DOMAIN_FILE_EXT: &str = "json";

/// Default location of the reserved-subdomain side file
pub const DEFAULT_RESERVED_FILE: &str = "util/reserved-domains.json";

// ============================================================================
// Schema Constants
// ============================================================================

/// Keys a definition file may carry at the top level
pub const ALLOWED_TOP_LEVEL_KEYS: [&str; 4] = ["user", "description", "subdomain", "records"];

/// Keys a definition file must carry at the top level
pub const REQUIRED_TOP_LEVEL_KEYS: [&str; 3] = ["user", "subdomain", "records"];

/// Union of every key any record kind may carry.
///
/// Checked before type-specific validation so that an unknown key always
/// fails, regardless of the record's type.
pub const ALLOWED_RECORD_KEYS: [&str; 18] = [
    "type",
    "name",
    "value",
    "target",
    "priority",
    "weight",
    "port",
    "flags",
    "tag",
    "usage",
    "selector",
    "matching_type",
    "certificate",
    "key_tag",
    "algorithm",
    "digest_type",
    "digest",
    "proxied",
];

// ============================================================================
// Provider Constants
// ============================================================================

/// TTL sentinel meaning "automatic / minimum" on the provider side.
///
/// Subzone never manages custom TTLs; every payload carries this value.
pub const TTL_AUTOMATIC: u32 = 1;

/// Page size used when listing zone records; the provider gives no total
/// count up front, so listing continues until a short page comes back
pub const RECORDS_PAGE_SIZE: u32 = 100;

/// Placeholder AAAA content for URL records.
///
/// `100::` is the IPv6 discard prefix (RFC 6666). The record only exists to
/// pull traffic through the provider's proxy so a redirect rule can fire;
/// it is never meant to resolve to anything reachable.
pub const URL_SENTINEL_CONTENT: &str = "100::";

/// Phase of the single redirect ruleset managed by subzone
pub const RULESET_PHASE: &str = "http_request_dynamic_redirect";

/// Kind of the single redirect ruleset managed by subzone
pub const RULESET_KIND: &str = "zone";

/// Name given to the ruleset when subzone has to create it
pub const RULESET_NAME: &str = "subzone redirects";

/// HTTP status code used for URL-record redirects (permanent)
pub const REDIRECT_STATUS_CODE: u16 = 301;

// ============================================================================
// Environment Variables
// ============================================================================

/// Environment variable holding the provider API token
pub const ENV_API_TOKEN: &str = "SUBZONE_API_TOKEN";

/// Environment variable holding the provider zone id
pub const ENV_ZONE_ID: &str = "SUBZONE_ZONE_ID";

/// Environment variable holding the parent zone name (e.g. `example.com`)
pub const ENV_ZONE_NAME: &str = "SUBZONE_ZONE_NAME";

/// Environment variable holding the provider API base URL
pub const ENV_API_URL: &str = "SUBZONE_API_URL";

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Payload building: domain records to provider record bodies.
//!
//! [`build_payload`] is a deterministic, side-effect-free mapping from one
//! validated [`Record`] to the body the provider expects. TTL is always the
//! automatic/minimum sentinel; this system never manages custom TTLs.
//!
//! URL records get special treatment: DNS cannot express a redirect, so the
//! payload is a synthetic AAAA record pointing at the discard prefix with the
//! proxy forced on. That pulls traffic through the provider's edge, where a
//! separately-managed redirect rule intercepts it. The record itself is
//! never meant to resolve meaningfully.

use crate::constants::{TTL_AUTOMATIC, URL_SENTINEL_CONTENT};
use crate::definition::fqdn;
use crate::records::Record;
use serde::Serialize;
use serde_json::json;

/// Provider-side record body for create and update calls.
///
/// Optional fields are omitted from the wire body entirely when unset; the
/// diff in the reconciler compares only the fields present here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPayload {
    /// Record type, uppercase
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Simple content (address, hostname, text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Structured data block for SRV/CAA/DS/TLSA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Proxy flag, only ever set for A/AAAA/CNAME and URL placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// MX preference value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// Always [`TTL_AUTOMATIC`]
    pub ttl: u32,
}

impl RecordPayload {
    fn new(record_type: &str, name: String) -> Self {
        Self {
            record_type: record_type.to_string(),
            name,
            content: None,
            data: None,
            proxied: None,
            priority: None,
            ttl: TTL_AUTOMATIC,
        }
    }
}

/// Map one validated record to its provider payload.
///
/// # Arguments
///
/// * `record` - The validated domain record
/// * `zone_name` - Parent zone, used to qualify the record label
#[must_use]
pub fn build_payload(record: &Record, zone_name: &str) -> RecordPayload {
    match record {
        Record::A {
            name,
            value,
            proxied,
        } => {
            let mut p = RecordPayload::new("A", fqdn(name, zone_name));
            p.content = Some(value.clone());
            p.proxied = Some(*proxied);
            p
        }
        Record::Aaaa {
            name,
            value,
            proxied,
        } => {
            let mut p = RecordPayload::new("AAAA", fqdn(name, zone_name));
            p.content = Some(value.clone());
            p.proxied = Some(*proxied);
            p
        }
        Record::Cname {
            name,
            value,
            proxied,
        } => {
            let mut p = RecordPayload::new("CNAME", fqdn(name, zone_name));
            p.content = Some(value.clone());
            p.proxied = Some(*proxied);
            p
        }
        Record::Txt { name, value } => {
            let mut p = RecordPayload::new("TXT", fqdn(name, zone_name));
            p.content = Some(value.clone());
            p
        }
        // The redirect intercept trick: placeholder AAAA on the discard
        // prefix, proxied, so the edge sees the request and the redirect
        // rule for this hostname can fire.
        Record::Url { name, .. } => {
            let mut p = RecordPayload::new("AAAA", fqdn(name, zone_name));
            p.content = Some(URL_SENTINEL_CONTENT.to_string());
            p.proxied = Some(true);
            p
        }
        Record::Mx {
            name,
            target,
            priority,
        } => {
            let mut p = RecordPayload::new("MX", fqdn(name, zone_name));
            p.content = Some(target.clone());
            p.priority = Some(*priority);
            p
        }
        Record::Srv {
            name,
            priority,
            weight,
            port,
            target,
        } => {
            let (service, proto, rest) = split_srv_name(name);
            let mut p = RecordPayload::new("SRV", fqdn(name, zone_name));
            p.data = Some(json!({
                "service": service,
                "proto": proto,
                "name": fqdn(rest, zone_name),
                "priority": priority,
                "weight": weight,
                "port": port,
                "target": target,
            }));
            p
        }
        Record::Caa {
            name,
            flags,
            tag,
            value,
        } => {
            let mut p = RecordPayload::new("CAA", fqdn(name, zone_name));
            p.data = Some(json!({
                "flags": flags,
                "tag": tag,
                "value": value,
            }));
            p
        }
        Record::Ns { name, value } => {
            let mut p = RecordPayload::new("NS", fqdn(name, zone_name));
            p.content = Some(value.clone());
            p
        }
        Record::Ds {
            name,
            key_tag,
            algorithm,
            digest_type,
            digest,
        } => {
            let mut p = RecordPayload::new("DS", fqdn(name, zone_name));
            p.data = Some(json!({
                "key_tag": key_tag,
                "algorithm": algorithm,
                "digest_type": digest_type,
                "digest": digest,
            }));
            p
        }
        Record::Tlsa {
            name,
            usage,
            selector,
            matching_type,
            certificate,
        } => {
            let mut p = RecordPayload::new("TLSA", fqdn(name, zone_name));
            p.data = Some(json!({
                "usage": usage,
                "selector": selector,
                "matching_type": matching_type,
                "certificate": certificate,
            }));
            p
        }
    }
}

/// Split an SRV label of the form `_service._proto.<rest>` into its parts.
///
/// Missing trailing parts come back empty rather than failing; the provider
/// rejects malformed SRV bodies on its side.
fn split_srv_name(name: &str) -> (&str, &str, &str) {
    let mut parts = name.splitn(3, '.');
    let service = parts.next().unwrap_or("");
    let proto = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("");
    (service, proto, rest)
}

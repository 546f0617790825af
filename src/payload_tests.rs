// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `payload.rs`

use crate::constants::{TTL_AUTOMATIC, URL_SENTINEL_CONTENT};
use crate::payload::build_payload;
use crate::records::Record;
use serde_json::json;

const ZONE: &str = "example.com";

#[test]
fn test_a_record_payload() {
    let record = Record::A {
        name: "blog".into(),
        value: "203.0.113.5".into(),
        proxied: false,
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(payload.record_type, "A");
    assert_eq!(payload.name, "blog.example.com");
    assert_eq!(payload.content.as_deref(), Some("203.0.113.5"));
    assert_eq!(payload.proxied, Some(false));
    assert_eq!(payload.ttl, TTL_AUTOMATIC);
    assert!(payload.data.is_none());
    assert!(payload.priority.is_none());
}

#[test]
fn test_url_record_becomes_proxied_placeholder() {
    let record = Record::Url {
        name: "go".into(),
        value: "https://example.org/docs".into(),
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(payload.record_type, "AAAA");
    assert_eq!(payload.name, "go.example.com");
    assert_eq!(payload.content.as_deref(), Some(URL_SENTINEL_CONTENT));
    assert_eq!(payload.proxied, Some(true));
    assert_eq!(payload.ttl, TTL_AUTOMATIC);
}

#[test]
fn test_cname_payload_carries_proxied_flag() {
    let record = Record::Cname {
        name: "blog".into(),
        value: "alice.pages.dev".into(),
        proxied: true,
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(payload.record_type, "CNAME");
    assert_eq!(payload.content.as_deref(), Some("alice.pages.dev"));
    assert_eq!(payload.proxied, Some(true));
}

#[test]
fn test_txt_and_ns_have_no_proxied_flag() {
    let txt = build_payload(
        &Record::Txt {
            name: "blog".into(),
            value: "v=spf1 -all".into(),
        },
        ZONE,
    );
    assert_eq!(txt.content.as_deref(), Some("v=spf1 -all"));
    assert!(txt.proxied.is_none());

    let ns = build_payload(
        &Record::Ns {
            name: "blog".into(),
            value: "ns1.example.org".into(),
        },
        ZONE,
    );
    assert_eq!(ns.record_type, "NS");
    assert_eq!(ns.content.as_deref(), Some("ns1.example.org"));
    assert!(ns.proxied.is_none());
}

#[test]
fn test_mx_payload_carries_priority() {
    let record = Record::Mx {
        name: "blog".into(),
        target: "mail.example.org".into(),
        priority: 10,
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(payload.record_type, "MX");
    assert_eq!(payload.content.as_deref(), Some("mail.example.org"));
    assert_eq!(payload.priority, Some(10));
}

#[test]
fn test_srv_payload_splits_name() {
    let record = Record::Srv {
        name: "_sip._tcp.blog".into(),
        priority: 10,
        weight: 5,
        port: 5060,
        target: "sip.example.org".into(),
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(payload.record_type, "SRV");
    assert_eq!(payload.name, "_sip._tcp.blog.example.com");
    assert_eq!(
        payload.data,
        Some(json!({
            "service": "_sip",
            "proto": "_tcp",
            "name": "blog.example.com",
            "priority": 10,
            "weight": 5,
            "port": 5060,
            "target": "sip.example.org",
        }))
    );
}

#[test]
fn test_caa_payload_data_block() {
    let record = Record::Caa {
        name: "blog".into(),
        flags: 0,
        tag: "issue".into(),
        value: "letsencrypt.org".into(),
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(
        payload.data,
        Some(json!({ "flags": 0, "tag": "issue", "value": "letsencrypt.org" }))
    );
    assert!(payload.content.is_none());
}

#[test]
fn test_ds_payload_data_block() {
    let record = Record::Ds {
        name: "blog".into(),
        key_tag: 2371,
        algorithm: 13,
        digest_type: 2,
        digest: "1F987CC6".into(),
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(
        payload.data,
        Some(json!({
            "key_tag": 2371,
            "algorithm": 13,
            "digest_type": 2,
            "digest": "1F987CC6",
        }))
    );
}

#[test]
fn test_tlsa_payload_data_block() {
    let record = Record::Tlsa {
        name: "blog".into(),
        usage: 3,
        selector: 1,
        matching_type: 1,
        certificate: "abc123".into(),
    };
    let payload = build_payload(&record, ZONE);
    assert_eq!(
        payload.data,
        Some(json!({
            "usage": 3,
            "selector": 1,
            "matching_type": 1,
            "certificate": "abc123",
        }))
    );
}

#[test]
fn test_ttl_is_always_the_automatic_sentinel() {
    let records = [
        Record::Txt {
            name: "blog".into(),
            value: "x".into(),
        },
        Record::Url {
            name: "blog".into(),
            value: "https://example.org".into(),
        },
        Record::Mx {
            name: "blog".into(),
            target: "mail.example.org".into(),
            priority: 0,
        },
    ];
    for record in &records {
        assert_eq!(build_payload(record, ZONE).ttl, TTL_AUTOMATIC);
    }
}

#[test]
fn test_payload_is_deterministic() {
    let record = Record::A {
        name: "blog".into(),
        value: "203.0.113.5".into(),
        proxied: true,
    };
    assert_eq!(build_payload(&record, ZONE), build_payload(&record, ZONE));
}

#[test]
fn test_wire_body_omits_unset_fields() {
    let payload = build_payload(
        &Record::Txt {
            name: "blog".into(),
            value: "x".into(),
        },
        ZONE,
    );
    let body = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        body,
        json!({
            "type": "TXT",
            "name": "blog.example.com",
            "content": "x",
            "ttl": 1,
        })
    );
}

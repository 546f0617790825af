// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reconcile.rs`
//!
//! Uses an in-memory [`ZoneApi`] fake that records every mutating call, so
//! tests can assert on the exact operations a run issues (including the
//! idempotence property: a second run against unchanged desired state must
//! issue none).

use crate::api::{
    list_all_records, records_for_hostname, RedirectRule, RemoteRecord, Ruleset, RulesetSummary,
    ZoneApi,
};
use crate::constants::{RULESET_KIND, RULESET_PHASE, TTL_AUTOMATIC, URL_SENTINEL_CONTENT};
use crate::definition::{ChangeStatus, ChangedFile, SubdomainDefinition, UserInfo};
use crate::errors::ApiError;
use crate::payload::RecordPayload;
use crate::reconcile::{delete_subdomain, process_changes, sync_definition, RunSummary};
use crate::records::Record;
use crate::reserved::ReservedNameSet;
use async_trait::async_trait;
use std::sync::Mutex;

const ZONE: &str = "example.com";

#[derive(Default)]
struct FakeState {
    records: Vec<RemoteRecord>,
    rulesets: Vec<Ruleset>,
    next_id: usize,
    /// Mutating calls only, in issue order
    ops: Vec<String>,
}

#[derive(Default)]
struct FakeZoneApi {
    state: Mutex<FakeState>,
}

impl FakeZoneApi {
    fn with_records(records: Vec<RemoteRecord>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().records = records;
        api
    }

    fn with_ruleset(self, rules: Vec<RedirectRule>) -> Self {
        self.state.lock().unwrap().rulesets.push(Ruleset {
            id: "rs-1".into(),
            phase: RULESET_PHASE.into(),
            kind: RULESET_KIND.into(),
            rules: Some(rules),
        });
        self
    }

    fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    fn records(&self) -> Vec<RemoteRecord> {
        self.state.lock().unwrap().records.clone()
    }

    fn rules(&self) -> Vec<RedirectRule> {
        self.state
            .lock()
            .unwrap()
            .rulesets
            .first()
            .and_then(|r| r.rules.clone())
            .unwrap_or_default()
    }
}

fn record_from_payload(id: String, payload: &RecordPayload) -> RemoteRecord {
    RemoteRecord {
        id,
        record_type: payload.record_type.clone(),
        name: payload.name.clone(),
        content: payload.content.clone(),
        data: payload.data.clone(),
        proxied: payload.proxied,
        priority: payload.priority,
        ttl: Some(payload.ttl),
    }
}

#[async_trait]
impl ZoneApi for FakeZoneApi {
    async fn list_records(&self, page: u32, per_page: u32) -> Result<Vec<RemoteRecord>, ApiError> {
        let state = self.state.lock().unwrap();
        let start = ((page - 1) * per_page) as usize;
        let end = (start + per_page as usize).min(state.records.len());
        if start >= state.records.len() {
            return Ok(Vec::new());
        }
        Ok(state.records[start..end].to_vec())
    }

    async fn create_record(&self, payload: &RecordPayload) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("rec-{}", state.next_id);
        let record = record_from_payload(id, payload);
        state
            .ops
            .push(format!("create {} {}", payload.record_type, payload.name));
        state.records.push(record);
        Ok(())
    }

    async fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let record = record_from_payload(id.to_string(), payload);
        let slot = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .expect("update of unknown record id");
        *slot = record;
        state
            .ops
            .push(format!("update {} {}", payload.record_type, payload.name));
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .records
            .iter()
            .position(|r| r.id == id)
            .expect("delete of unknown record id");
        let removed = state.records.remove(position);
        state
            .ops
            .push(format!("delete {} {}", removed.record_type, removed.name));
        Ok(())
    }

    async fn list_rulesets(&self) -> Result<Vec<RulesetSummary>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rulesets
            .iter()
            .map(|r| RulesetSummary {
                id: r.id.clone(),
                name: None,
                phase: r.phase.clone(),
                kind: r.kind.clone(),
            })
            .collect())
    }

    async fn create_ruleset(&self) -> Result<Ruleset, ApiError> {
        let mut state = self.state.lock().unwrap();
        let ruleset = Ruleset {
            id: "rs-1".into(),
            phase: RULESET_PHASE.into(),
            kind: RULESET_KIND.into(),
            rules: Some(Vec::new()),
        };
        state.ops.push("create ruleset".into());
        state.rulesets.push(ruleset.clone());
        Ok(ruleset)
    }

    async fn get_ruleset(&self, id: &str) -> Result<Ruleset, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rulesets
            .iter()
            .find(|r| r.id == id)
            .expect("get of unknown ruleset id")
            .clone())
    }

    async fn replace_ruleset_rules(
        &self,
        id: &str,
        rules: &[RedirectRule],
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("replace rules ({})", rules.len()));
        let ruleset = state
            .rulesets
            .iter_mut()
            .find(|r| r.id == id)
            .expect("replace on unknown ruleset id");
        ruleset.rules = Some(rules.to_vec());
        Ok(())
    }
}

fn definition(subdomain: &str, records: Vec<Record>) -> SubdomainDefinition {
    SubdomainDefinition {
        user: UserInfo {
            username: "alice".into(),
        },
        description: None,
        subdomain: subdomain.into(),
        records,
    }
}

fn blog_definition() -> SubdomainDefinition {
    definition(
        "blog",
        vec![Record::A {
            name: "blog".into(),
            value: "203.0.113.5".into(),
            proxied: false,
        }],
    )
}

fn remote_a(id: &str, name: &str, content: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.into(),
        record_type: "A".into(),
        name: name.into(),
        content: Some(content.into()),
        data: None,
        proxied: Some(false),
        priority: None,
        ttl: Some(TTL_AUTOMATIC),
    }
}

#[tokio::test]
async fn test_fresh_sync_issues_exactly_one_create() {
    let api = FakeZoneApi::default();
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &blog_definition(), &mut summary)
        .await
        .unwrap();

    assert_eq!(api.ops(), vec!["create A blog.example.com"]);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.deleted, 0);
    assert_eq!(summary.ruleset_writes, 0);

    let records = api.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content.as_deref(), Some("203.0.113.5"));
    assert_eq!(records[0].ttl, Some(TTL_AUTOMATIC));
    assert_eq!(records[0].proxied, Some(false));
}

#[tokio::test]
async fn test_second_sync_is_idempotent() {
    let api = FakeZoneApi::default();
    let def = definition(
        "blog",
        vec![
            Record::A {
                name: "blog".into(),
                value: "203.0.113.5".into(),
                proxied: false,
            },
            Record::Mx {
                name: "blog".into(),
                target: "mail.example.org".into(),
                priority: 10,
            },
            Record::Ds {
                name: "blog".into(),
                key_tag: 2371,
                algorithm: 13,
                digest_type: 2,
                digest: "1F987CC6".into(),
            },
        ],
    );

    let mut summary = RunSummary::default();
    sync_definition(&api, ZONE, &def, &mut summary).await.unwrap();
    assert_eq!(summary.created, 3);

    api.clear_ops();
    let mut summary = RunSummary::default();
    sync_definition(&api, ZONE, &def, &mut summary).await.unwrap();

    assert_eq!(api.ops(), Vec::<String>::new());
    assert_eq!(summary, RunSummary::default());
}

#[tokio::test]
async fn test_changed_content_issues_exactly_one_update() {
    let api = FakeZoneApi::with_records(vec![remote_a("rec-1", "blog.example.com", "198.51.100.1")]);
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &blog_definition(), &mut summary)
        .await
        .unwrap();

    assert_eq!(api.ops(), vec!["update A blog.example.com"]);
    assert_eq!(summary.updated, 1);
    assert_eq!(api.records()[0].content.as_deref(), Some("203.0.113.5"));
}

#[tokio::test]
async fn test_unmatched_scoped_records_are_pruned() {
    let api = FakeZoneApi::with_records(vec![
        remote_a("rec-1", "blog.example.com", "203.0.113.5"),
        RemoteRecord {
            id: "rec-2".into(),
            record_type: "TXT".into(),
            name: "old.blog.example.com".into(),
            content: Some("stale".into()),
            data: None,
            proxied: None,
            priority: None,
            ttl: Some(TTL_AUTOMATIC),
        },
        // Different hostname scope, must stay untouched
        remote_a("rec-3", "other.example.com", "198.51.100.9"),
    ]);
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &blog_definition(), &mut summary)
        .await
        .unwrap();

    assert_eq!(api.ops(), vec!["delete TXT old.blog.example.com"]);
    assert_eq!(summary.deleted, 1);
    let names: Vec<_> = api.records().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["blog.example.com", "other.example.com"]);
}

#[tokio::test]
async fn test_duplicate_desired_records_converge_on_first_match() {
    // Two desired TXT records with the same (type, name) both match the one
    // remote record, first-found. The second wins the content race; this is
    // inherited behavior, not something the reconciler resolves.
    let api = FakeZoneApi::with_records(vec![RemoteRecord {
        id: "rec-1".into(),
        record_type: "TXT".into(),
        name: "blog.example.com".into(),
        content: Some("first".into()),
        data: None,
        proxied: None,
        priority: None,
        ttl: Some(TTL_AUTOMATIC),
    }]);
    let def = definition(
        "blog",
        vec![
            Record::Txt {
                name: "blog".into(),
                value: "first".into(),
            },
            Record::Txt {
                name: "blog".into(),
                value: "second".into(),
            },
        ],
    );
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &def, &mut summary).await.unwrap();

    assert_eq!(api.ops(), vec!["update TXT blog.example.com"]);
    assert_eq!(api.records().len(), 1);
    assert_eq!(api.records()[0].content.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_url_record_creates_placeholder_and_redirect_rule() {
    let foreign_rule = RedirectRule::for_hostname("other.example.com", "https://elsewhere.org");
    let api = FakeZoneApi::default().with_ruleset(vec![foreign_rule.clone()]);
    let def = definition(
        "go",
        vec![Record::Url {
            name: "go".into(),
            value: "https://example.org/docs".into(),
        }],
    );
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &def, &mut summary).await.unwrap();

    // Placeholder AAAA pulled through the proxy
    let records = api.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, "AAAA");
    assert_eq!(records[0].content.as_deref(), Some(URL_SENTINEL_CONTENT));
    assert_eq!(records[0].proxied, Some(true));

    // One rule for go.example.com appended; the foreign rule kept verbatim
    let rules = api.rules();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0], foreign_rule);
    assert_eq!(rules[1].expression, "http.host eq \"go.example.com\"");
    assert_eq!(
        rules[1].action_parameters.from_value.target_url.value,
        "https://example.org/docs"
    );
    assert_eq!(rules[1].action_parameters.from_value.status_code, 301);
    assert!(rules[1].action_parameters.from_value.preserve_query_string);
    assert_eq!(summary.ruleset_writes, 1);
}

#[tokio::test]
async fn test_url_record_creates_ruleset_when_absent() {
    let api = FakeZoneApi::default();
    let def = definition(
        "go",
        vec![Record::Url {
            name: "go".into(),
            value: "https://example.org".into(),
        }],
    );
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &def, &mut summary).await.unwrap();

    let ops = api.ops();
    assert!(ops.contains(&"create ruleset".to_string()));
    assert_eq!(api.rules().len(), 1);
}

#[tokio::test]
async fn test_sync_without_url_records_skips_ruleset_write() {
    let foreign_rule = RedirectRule::for_hostname("other.example.com", "https://elsewhere.org");
    let api = FakeZoneApi::default().with_ruleset(vec![foreign_rule]);
    let mut summary = RunSummary::default();

    sync_definition(&api, ZONE, &blog_definition(), &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.ruleset_writes, 0);
    assert_eq!(api.rules().len(), 1);
}

#[tokio::test]
async fn test_delete_subdomain_tears_down_records_and_rules() {
    let blog_rule = RedirectRule::for_hostname("blog.example.com", "https://example.org");
    let foreign_rule = RedirectRule::for_hostname("other.example.com", "https://elsewhere.org");
    let api = FakeZoneApi::with_records(vec![
        remote_a("rec-1", "blog.example.com", "203.0.113.5"),
        remote_a("rec-2", "www.blog.example.com", "203.0.113.6"),
        remote_a("rec-3", "other.example.com", "198.51.100.9"),
    ])
    .with_ruleset(vec![blog_rule, foreign_rule.clone()]);
    let mut summary = RunSummary::default();

    delete_subdomain(&api, ZONE, "blog", &mut summary).await.unwrap();

    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.ruleset_writes, 1);
    let names: Vec<_> = api.records().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["other.example.com"]);
    assert_eq!(api.rules(), vec![foreign_rule]);
}

#[tokio::test]
async fn test_delete_subdomain_without_rules_skips_ruleset_write() {
    let api = FakeZoneApi::with_records(vec![remote_a("rec-1", "blog.example.com", "203.0.113.5")])
        .with_ruleset(Vec::new());
    let mut summary = RunSummary::default();

    delete_subdomain(&api, ZONE, "blog", &mut summary).await.unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.ruleset_writes, 0);
}

#[test]
fn test_child_rule_ownership_covers_child_labels() {
    let child_rule = RedirectRule::for_hostname("www.blog.example.com", "https://example.org");
    assert!(child_rule.owned_by("blog.example.com"));

    // Strict-suffix hostname must not be claimed
    let other = RedirectRule::for_hostname("weblog.example.com", "https://example.org");
    assert!(!other.owned_by("blog.example.com"));
}

#[tokio::test]
async fn test_list_all_records_paginates_until_short_page() {
    let records: Vec<_> = (0..150)
        .map(|i| remote_a(&format!("rec-{i}"), &format!("r{i}.example.com"), "192.0.2.1"))
        .collect();
    let api = FakeZoneApi::with_records(records);

    let all = list_all_records(&api).await.unwrap();
    assert_eq!(all.len(), 150);
}

#[tokio::test]
async fn test_list_all_records_handles_exact_page_multiple() {
    let records: Vec<_> = (0..200)
        .map(|i| remote_a(&format!("rec-{i}"), &format!("r{i}.example.com"), "192.0.2.1"))
        .collect();
    let api = FakeZoneApi::with_records(records);

    let all = list_all_records(&api).await.unwrap();
    assert_eq!(all.len(), 200);
}

#[test]
fn test_records_for_hostname_scoping() {
    let all = vec![
        remote_a("1", "blog.example.com", "192.0.2.1"),
        remote_a("2", "www.blog.example.com", "192.0.2.2"),
        remote_a("3", "weblog.example.com", "192.0.2.3"),
        remote_a("4", "other.example.com", "192.0.2.4"),
    ];
    let scoped = records_for_hostname("blog.example.com", &all);
    let names: Vec<_> = scoped.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["blog.example.com", "www.blog.example.com"]);
}

#[tokio::test]
async fn test_process_changes_validates_before_any_network_effect() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("domains")).unwrap();
    std::fs::write(
        dir.path().join("domains/blog.json"),
        r#"{
            "user": { "username": "alice" },
            "subdomain": "blog",
            "records": [{ "type": "A", "name": "blog", "value": "999.1.1.1" }]
        }"#,
    )
    .unwrap();

    let api = FakeZoneApi::default();
    let changes = vec![ChangedFile {
        status: ChangeStatus::Added,
        path: "domains/blog.json".into(),
    }];
    let err = process_changes(&api, ZONE, dir.path(), &changes, &ReservedNameSet::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("domains/blog.json"));
    assert!(err.to_string().contains("IPv4"));
    assert_eq!(api.ops(), Vec::<String>::new());
    assert!(api.records().is_empty());
}

#[tokio::test]
async fn test_process_changes_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("domains")).unwrap();
    std::fs::write(
        dir.path().join("domains/blog.json"),
        r#"{
            "user": { "username": "alice" },
            "subdomain": "blog",
            "records": [{ "type": "A", "name": "blog", "value": "203.0.113.5" }]
        }"#,
    )
    .unwrap();

    let api = FakeZoneApi::with_records(vec![remote_a("rec-9", "old.example.com", "192.0.2.9")]);
    let changes = vec![
        ChangedFile {
            status: ChangeStatus::Added,
            path: "domains/blog.json".into(),
        },
        ChangedFile {
            status: ChangeStatus::Deleted,
            path: "domains/old.json".into(),
        },
    ];
    let summary = process_changes(&api, ZONE, dir.path(), &changes, &ReservedNameSet::default())
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.deleted, 1);
    let names: Vec<_> = api.records().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["blog.example.com"]);
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reserved.rs`

use crate::reserved::ReservedNameSet;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_load_flattens_all_categories() {
    let file = write_temp(
        r#"{
            "infrastructure": ["www", "mail", "NS1"],
            "abuse": ["admin", "login"]
        }"#,
    );
    let set = ReservedNameSet::load(file.path());
    assert_eq!(set.len(), 5);
    assert!(set.contains("www"));
    assert!(set.contains("admin"));
    // Case-normalized on both sides
    assert!(set.contains("ns1"));
    assert!(set.contains("NS1"));
    assert!(!set.contains("blog"));
}

#[test]
fn test_missing_file_degrades_to_empty_set() {
    let set = ReservedNameSet::load(std::path::Path::new("/nonexistent/reserved.json"));
    assert!(set.is_empty());
    assert!(!set.contains("www"));
}

#[test]
fn test_malformed_json_degrades_to_empty_set() {
    let file = write_temp("{not json at all");
    let set = ReservedNameSet::load(file.path());
    assert!(set.is_empty());
}

#[test]
fn test_non_object_root_degrades_to_empty_set() {
    let file = write_temp(r#"["www", "mail"]"#);
    let set = ReservedNameSet::load(file.path());
    assert!(set.is_empty());
}

#[test]
fn test_non_array_category_is_skipped() {
    let file = write_temp(
        r#"{
            "infrastructure": ["www"],
            "broken": "mail",
            "numbers": [1, 2, "api"]
        }"#,
    );
    let set = ReservedNameSet::load(file.path());
    assert!(set.contains("www"));
    assert!(set.contains("api"));
    assert!(!set.contains("mail"));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_from_names() {
    let set = ReservedNameSet::from_names(["WWW", "Mail"]);
    assert!(set.contains("www"));
    assert!(set.contains("mail"));
    assert_eq!(set.len(), 2);
}

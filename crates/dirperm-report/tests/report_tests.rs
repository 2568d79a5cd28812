use std::path::Path;

use dirperm_core::{
    AccessRule, FileSystemRights, NodeKind, NodeSecurity, PathMode, PermissionRecord,
    PermissionRecordSet,
};
use dirperm_report::{FormatConfig, LINE_ENDING, ReportFormatter};
use tokio_util::sync::CancellationToken;

fn record(path: &str, owner: &str, rules: Vec<AccessRule>) -> PermissionRecord {
    PermissionRecord::new(Path::new(path), NodeKind::Directory, NodeSecurity::new(owner, rules))
}

fn sample_set() -> PermissionRecordSet {
    [
        record(
            "/data",
            "root",
            vec![
                AccessRule::allow("root", FileSystemRights::FULL_CONTROL),
                AccessRule::allow("Staff", FileSystemRights::READ | FileSystemRights::EXECUTE),
                AccessRule::allow("Everyone", FileSystemRights::READ),
            ],
        ),
        record(
            "/data/projects/alpha",
            "alice",
            vec![
                AccessRule::allow("alice", FileSystemRights::FULL_CONTROL),
                AccessRule::deny("Everyone", FileSystemRights::WRITE),
            ],
        ),
    ]
    .into_iter()
    .collect()
}

fn data_rows(text: &str) -> Vec<Vec<String>> {
    text.split(LINE_ENDING)
        .filter(|line| !line.is_empty())
        .skip(1)
        .map(|line| {
            line.split(',')
                .map(|field| field.trim_matches('"').to_string())
                .collect()
        })
        .collect()
}

fn format(config: FormatConfig, set: &PermissionRecordSet) -> String {
    ReportFormatter::with_config(config)
        .format(set, set.max_depth(), &CancellationToken::new())
        .unwrap()
}

#[test]
fn test_split_rows_have_max_depth_path_columns() {
    let set = sample_set();
    let text = format(FormatConfig::default(), &set);
    let rows = data_rows(&text);

    assert_eq!(set.max_depth(), 3);
    assert_eq!(rows.len(), 5);
    for row in &rows {
        // "#" + 3 levels + 5 rule columns
        assert_eq!(row.len(), 1 + 3 + 5);
    }
    assert_eq!(rows[0][1..4], ["data", "", ""]);
    assert_eq!(rows[3][1..4], ["data", "projects", "alpha"]);
}

#[test]
fn test_row_numbers_count_emitted_rows() {
    let set = sample_set();
    let rows = data_rows(&format(FormatConfig::default(), &set));

    let numbers: Vec<_> = rows.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(numbers, vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_excluded_identity_is_removed_everywhere() {
    let set = sample_set();
    let config = FormatConfig::builder()
        .excluded_identities(vec!["everyone".to_string()])
        .build()
        .unwrap();
    let rows = data_rows(&format(config, &set));

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row[4] != "Everyone"));
    assert!(rows.iter().any(|row| row[4] == "Staff"));
    assert!(rows.iter().any(|row| row[4] == "alice"));
    assert_eq!(rows[2][0], "2");
}

#[test]
fn test_combined_and_split_agree_on_rule_values() {
    let set = sample_set();
    let split = data_rows(&format(FormatConfig::default(), &set));
    let combined = data_rows(&format(
        FormatConfig::builder()
            .path_mode(PathMode::Combined)
            .build()
            .unwrap(),
        &set,
    ));

    assert_eq!(split.len(), combined.len());
    for (s, c) in split.iter().zip(&combined) {
        assert_eq!(s[s.len() - 5..], c[c.len() - 5..]);
    }
    assert_eq!(combined[3][1], "/data/projects/alpha");
}

#[test]
fn test_row_cap_is_exact() {
    let set = sample_set();
    let config = FormatConfig::builder().max_rows(4usize).build().unwrap();
    let rows = data_rows(&format(config, &set));

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3][0], "3");
}

#[test]
fn test_record_without_rules_emits_nothing() {
    let set: PermissionRecordSet = [record("/empty", "", Vec::new())].into_iter().collect();
    let text = format(FormatConfig::default(), &set);

    assert!(data_rows(&text).is_empty());
    assert!(text.starts_with("\"#\",\"Level 0\",\"Identity\""));
}

#[test]
fn test_rights_and_flags_are_rendered_symbolically() {
    let set = sample_set();
    let rows = data_rows(&format(FormatConfig::default(), &set));

    let staff = &rows[1];
    assert_eq!(staff[5], "ReadAndExecute");
    assert_eq!(staff[6], "Allow");
    assert_eq!(staff[7], "False");
    assert_eq!(staff[8], "root");

    let deny = &rows[4];
    assert_eq!(deny[6], "Deny");
    assert_eq!(deny[8], "alice");
}

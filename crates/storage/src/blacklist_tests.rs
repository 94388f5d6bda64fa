// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use arx_core::blacklist::RuleKind;

fn rule(pattern: &str, kind: RuleKind) -> BlacklistRule {
    BlacklistRule::new(pattern, kind)
}

#[test]
fn rules_for_combines_global_and_target_sets() {
    let store = BlacklistStore::new(StorageHandle::connect());
    store
        .set_global_rules(vec![rule("10.0.0.0/8", RuleKind::Substring)])
        .unwrap();
    let target = TargetId::new("t1");
    store
        .set_target_rules(&target, vec![rule("internal.example.com", RuleKind::Suffix)])
        .unwrap();

    let rules = store.rules_for(&target).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].pattern, "10.0.0.0/8");
    assert_eq!(rules[1].pattern, "internal.example.com");
}

#[test]
fn other_targets_see_only_global_rules() {
    let store = BlacklistStore::new(StorageHandle::connect());
    store
        .set_target_rules(&TargetId::new("t1"), vec![rule("x", RuleKind::Exact)])
        .unwrap();
    assert!(store.rules_for(&TargetId::new("t2")).unwrap().is_empty());
}

#[test]
fn invalid_patterns_are_rejected_at_write_time() {
    let store = BlacklistStore::new(StorageHandle::connect());
    let err = store
        .set_global_rules(vec![rule("(unclosed", RuleKind::Regex)])
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

//! # Models Unit Tests / 模型单元测试
//!
//! Tests the persisted artifacts: the duration store file format, refreshing a
//! store with a fresh aggregation, merged report parsing and spec discovery.
//!
//! 测试持久化产物：时长存储文件格式、用新聚合结果刷新存储、合并报告解析以及 spec 发现。

mod common;

use serde_json::json;
use spec_orchestrator::aggregator;
use spec_orchestrator::config::BrowserSet;
use spec_orchestrator::infra::fs;
use spec_orchestrator::models::{DurationStore, MergedReport, Schedule, spec_key};

#[cfg(test)]
mod store_format_tests {
    use super::*;

    #[test]
    fn test_store_reads_the_array_of_records_format() {
        let content = r#"[
            {"specName": "login.spec.js", "data": [{"browser": "chrome", "duration": 1200}, {"browser": "firefox", "duration": 900}]},
            {"specName": "cart.spec.js", "data": [{"browser": "chrome", "duration": 30}]}
        ]"#;
        let store: DurationStore = serde_json::from_str(content).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("login.spec.js").unwrap().duration_for("firefox"), 900);
        assert_eq!(store.get("cart.spec.js").unwrap().duration_for("firefox"), 0);
        assert_eq!(store.position("cart.spec.js"), Some(1));
    }

    #[test]
    fn test_store_writes_camel_case_records_for_every_browser() {
        let mut store = DurationStore::new();
        store.ensure_record("a.spec.js", &BrowserSet::default()).add("firefox", 7);
        let value = serde_json::to_value(&store).unwrap();
        assert_eq!(
            value,
            json!([{
                "specName": "a.spec.js",
                "data": [
                    {"browser": "chrome", "duration": 0},
                    {"browser": "firefox", "duration": 7}
                ]
            }])
        );
    }

    #[test]
    fn test_save_then_load_through_the_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/store.json");
        let mut store = DurationStore::new();
        store.ensure_record("x.js", &BrowserSet::default()).add("chrome", 99);

        fs::save_duration_store(&path, &store).unwrap();
        assert_eq!(fs::load_duration_store(&path), Some(store));
    }

    #[test]
    fn test_missing_or_corrupt_store_means_no_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        assert_eq!(fs::load_duration_store(&path), None);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(fs::load_duration_store(&path), None);
    }
}

#[cfg(test)]
mod refresh_tests {
    use super::*;

    #[test]
    fn test_fresh_records_replace_stale_ones_in_place() {
        let set = BrowserSet::default();
        let mut existing = DurationStore::new();
        existing.ensure_record("a", &set).add("chrome", 100);
        existing.ensure_record("b", &set).add("chrome", 200);

        let report = common::report(&[
            ("b", "chrome", json!(5)),
            ("c", "firefox", json!(6)),
        ]);
        let fresh = aggregator::aggregate(&report, DurationStore::new(), &set);
        let refreshed = existing.refresh(fresh);

        let names: Vec<&str> = refreshed.records().iter().map(|r| r.spec_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(refreshed.get("a").unwrap().duration_for("chrome"), 100);
        assert_eq!(refreshed.get("b").unwrap().duration_for("chrome"), 5);
        assert_eq!(refreshed.get("c").unwrap().duration_for("firefox"), 6);
    }

    #[test]
    fn test_refreshing_with_the_same_report_twice_is_stable() {
        let set = BrowserSet::default();
        let report = common::report(&[("a", "chrome", json!("40"))]);
        let once = DurationStore::new().refresh(aggregator::aggregate(&report, DurationStore::new(), &set));
        let twice = once.clone().refresh(aggregator::aggregate(&report, DurationStore::new(), &set));
        assert_eq!(once, twice);
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_report_tolerates_missing_and_null_fields() {
        let report: MergedReport = serde_json::from_value(json!({
            "stats": { "passes": 3 },
            "results": [
                { "file": "a.spec.js", "suites": null },
                { "suites": [{ "title": "chrome" }] },
                { "file": "b.spec.js", "suites": [{ "title": "chrome", "duration": 3, "suites": null, "tests": [] }] }
            ]
        }))
        .unwrap();
        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].suites.is_empty());
        assert_eq!(report.results[1].file, "");

        let store = aggregator::aggregate(&report, DurationStore::new(), &BrowserSet::default());
        // The result without a file is skipped.
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b.spec.js").unwrap().duration_for("chrome"), 3);
    }

    #[test]
    fn test_missing_report_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fs::read_merged_report(&dir.path().join("none.json")).unwrap().is_none());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[").unwrap();
        assert!(fs::read_merged_report(&path).is_err());
    }

    #[test]
    fn test_spec_key_is_the_path_tail() {
        assert_eq!(spec_key("/x/y/login.spec.js"), "login.spec.js");
        assert_eq!(spec_key("C:\\e2e\\cart.spec.js"), "cart.spec.js");
        assert_eq!(spec_key("plain.js"), "plain.js");
    }
}

#[cfg(test)]
mod discovery_tests {
    use super::*;

    #[test]
    fn test_discovery_is_sorted_and_relative() {
        let project = common::setup_project();
        let home = project.path().join("specs");
        let found = fs::discover_specs(&home, &[".js".to_string(), ".ts".to_string()]).unwrap();
        assert_eq!(
            found,
            vec![
                "auth/login.spec.js",
                "auth/logout.spec.js",
                "cart/checkout.spec.js",
                "search.spec.ts"
            ]
        );
    }

    #[test]
    fn test_tag_filters() {
        let project = common::setup_project();
        let home = project.path().join("specs");
        let all = fs::discover_specs(&home, &[".js".to_string()]).unwrap();

        let smoke = fs::filter_by_tags(&home, all.clone(), &["@smoke".to_string()], &[]);
        assert_eq!(smoke, vec!["auth/login.spec.js"]);

        let not_slow = fs::filter_by_tags(&home, all, &[], &["@slow".to_string()]);
        assert_eq!(not_slow, vec!["auth/login.spec.js", "auth/logout.spec.js"]);
    }

    #[test]
    fn test_schedule_serializes_per_browser_slots() {
        let schedule: Schedule = serde_json::from_value(json!({
            "browsers": [{ "browser": "chrome", "slots": [["a.js", "c.js"], ["b.js"]] }]
        }))
        .unwrap();
        let slots: Vec<(&str, usize, usize)> = schedule
            .iter_slots()
            .map(|(browser, index, specs)| (browser, index, specs.len()))
            .collect();
        assert_eq!(slots, vec![("chrome", 0, 2), ("chrome", 1, 1)]);
        assert!(schedule.slots_for("firefox").is_empty());
    }
}

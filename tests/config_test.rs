//! Layered settings loading

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use syncmap::application::ApplicationError;
use syncmap::config::{local_config_path, Settings};
use syncmap::domain::{BlockingRule, DuplicateNamePolicy, ViewMode};
use syncmap::infrastructure::di::ServiceContainer;
use tempfile::TempDir;

#[ctor::ctor]
fn init() {
    syncmap::util::testing::init_test_setup();
}

fn dir_with_local_config(content: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(local_config_path(dir.path()), content).unwrap();
    dir
}

#[test]
fn given_local_config_when_loading_then_overrides_defaults() {
    let dir = dir_with_local_config(
        r#"
        view = "sowAndTech"
        blocking_rule = "syncCompletion"
        duplicate_names = "firstMatch"
        data_file = "sites.json"
        "#,
    );

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert_eq!(settings.view, ViewMode::SowAndTech);
    assert_eq!(settings.blocking_rule, BlockingRule::SyncCompletion);
    assert_eq!(settings.duplicate_names, DuplicateNamePolicy::FirstMatch);
    assert_eq!(settings.data_file, Some(PathBuf::from("sites.json")));
    assert_eq!(settings.root_name, "GPS");
}

#[test]
fn given_no_local_config_when_loading_then_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(Some(dir.path())).unwrap();
    assert_eq!(settings.view, ViewMode::BlockTypes);
    assert_eq!(settings.blocking_rule, BlockingRule::Doability);
}

#[rstest]
#[case("view = 3")]
#[case("blocking_rule = \"sometimes\"")]
#[case("not toml at all [")]
fn given_malformed_local_config_when_loading_then_config_error(#[case] content: &str) {
    let dir = dir_with_local_config(content);
    let result = Settings::load(Some(dir.path()));
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_explicit_file_when_load_file_then_only_that_layer_applies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "root_name = \"PTP-GM\"\n").unwrap();

    let settings = Settings::load_file(&path).unwrap();

    assert_eq!(settings.root_name, "PTP-GM");
    assert_eq!(settings.view, ViewMode::BlockTypes);
}

#[test]
fn given_template_when_parsed_then_equals_defaults() {
    let dir = dir_with_local_config(&Settings::template());
    let settings = Settings::load_file(&local_config_path(dir.path())).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn given_settings_when_serialized_then_round_trips_through_load_file() {
    let settings = Settings {
        view: ViewMode::SowAndTech,
        duplicate_names: DuplicateNamePolicy::FirstMatch,
        ..Default::default()
    };
    let dir = dir_with_local_config(&settings.to_toml().unwrap());

    let loaded = Settings::load_file(&local_config_path(dir.path())).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn given_data_file_in_settings_when_resolving_then_used_as_fallback() {
    let settings = Settings {
        data_file: Some(PathBuf::from("tests/resources/rollout.json")),
        ..Default::default()
    };
    let container = ServiceContainer::new(settings);

    let path = container.resolve_data_file(None).unwrap();
    assert_eq!(path, PathBuf::from("tests/resources/rollout.json"));

    let explicit = container
        .resolve_data_file(Some(PathBuf::from("other.yaml").as_path()))
        .unwrap();
    assert_eq!(explicit, PathBuf::from("other.yaml"));
}

#[test]
fn given_no_data_file_when_resolving_then_config_error() {
    let container = ServiceContainer::new(Settings::default());
    let result = container.resolve_data_file(None);
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("no data_file configured"));
}

#[test]
fn given_custom_root_name_when_loading_nested_document_then_attached_below_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.json");
    fs::write(&path, r#"{"name": "GPS", "children": [{"name": "A"}]}"#).unwrap();

    let settings = Settings {
        root_name: "PTP-GM".into(),
        ..Default::default()
    };
    let tree = ServiceContainer::new(settings).load_tree(&path).unwrap();

    assert_eq!(tree.root_name(), "PTP-GM");
    let gps = tree.find_by_name("GPS").unwrap();
    assert_eq!(tree.children(gps).len(), 1);
}

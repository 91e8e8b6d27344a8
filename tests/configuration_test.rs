//! Integration tests for loading, resolving and materializing configurations.

use std::fs;
use std::path::{Path, PathBuf};

use rstest::rstest;
use tempfile::TempDir;

use pathtree::configuration::{
    ConfigValue,
    Configuration,
    ConfigurationError,
    PathIndicator,
    PathIndicatorMatch,
    ResolutionOptions,
};

fn resolve_under_proj(document: &str) -> Configuration {
    Configuration::from_yaml_str(document, "/proj", ResolutionOptions::default())
        .expect("configuration resolves")
}

fn location_of(configuration: &Configuration, dotted_key_path: &str) -> PathBuf {
    configuration
        .lookup(dotted_key_path)
        .expect("key exists")
        .as_location()
        .expect("value is a location")
        .as_path()
        .to_path_buf()
}

// ============================================================
// Resolution
// ============================================================

#[cfg(unix)]
#[test]
fn given_data_block_with_root_when_resolved_then_children_are_under_root() {
    let configuration = resolve_under_proj(
        r#"
paths:
  data:
    root: "020_Daten"
    raw: "raw"
    clean: "clean"
"#,
    );

    assert_eq!(location_of(&configuration, "paths.data.root"), Path::new("/proj/020_Daten"));
    assert_eq!(location_of(&configuration, "paths.data.raw"), Path::new("/proj/020_Daten/raw"));
    assert_eq!(
        location_of(&configuration, "paths.data.clean"),
        Path::new("/proj/020_Daten/clean")
    );

    let data = configuration.paths().unwrap().path_block("data").unwrap();
    assert_eq!(data.anchor().unwrap().as_path(), Path::new("/proj/020_Daten"));
}

#[cfg(unix)]
#[rstest]
#[case("/abs/scripts", "/abs/scripts")]
#[case("/abs/./scripts/../scripts", "/abs/scripts")]
#[case("scripts", "/proj/scripts")]
#[case("../shared/scripts", "/shared/scripts")]
fn given_location_string_when_resolved_then_is_normalized(
    #[case] raw: &str,
    #[case] expected: &str,
) {
    let configuration = resolve_under_proj(&format!("paths:\n  scripts: \"{raw}\"\n"));

    assert_eq!(location_of(&configuration, "paths.scripts"), Path::new(expected));
}

#[cfg(unix)]
#[test]
fn given_absolute_location_inside_anchored_block_when_resolved_then_anchor_is_ignored() {
    let configuration = resolve_under_proj(
        r#"
paths:
  results:
    root: "040_Results"
    archive: "/mnt/archive"
"#,
    );

    assert_eq!(location_of(&configuration, "paths.results.archive"), Path::new("/mnt/archive"));
}

#[cfg(unix)]
#[test]
fn given_absolute_root_override_when_resolved_then_descendants_follow_override() {
    let configuration = resolve_under_proj(
        r#"
paths:
  results:
    root: "/volumes/fast/results"
    plots: "plots"
    figures:
      svg: "svg"
"#,
    );

    assert_eq!(
        location_of(&configuration, "paths.results.plots"),
        Path::new("/volumes/fast/results/plots")
    );
    assert_eq!(
        location_of(&configuration, "paths.results.figures.svg"),
        Path::new("/volumes/fast/results/svg")
    );
}

#[cfg(unix)]
#[test]
fn given_same_document_when_resolved_twice_then_trees_are_identical() {
    let document = "paths:\n  working: wd\n  results:\n    root: out\n    plots: plots\n";

    assert_eq!(resolve_under_proj(document).tree, resolve_under_proj(document).tree);
}

#[cfg(unix)]
#[test]
fn given_non_path_values_when_resolved_then_kept_verbatim() {
    let configuration = resolve_under_proj(
        r#"
analysis_name: "2023_Kronensicherung"
sample_rate: 100
filter:
  enabled: true
  cutoff: 2.5
channels: [x, y, z]
paths:
  working: "working_directory"
"#,
    );

    assert_eq!(configuration.string("analysis_name").unwrap(), "2023_Kronensicherung");
    assert_eq!(configuration.scalar("sample_rate").unwrap().as_i64(), Some(100));

    let filter = configuration.node("filter").unwrap();
    assert_eq!(filter.scalar("enabled").unwrap().as_bool(), Some(true));
    assert_eq!(filter.scalar("cutoff").unwrap().as_f64(), Some(2.5));

    assert!(matches!(configuration.get("channels").unwrap(), ConfigValue::Sequence(_)));
}

#[cfg(unix)]
#[test]
fn given_heuristic_indicator_when_resolved_then_path_like_keys_outside_paths_are_locations() {
    let configuration = Configuration::from_yaml_str(
        "export:\n  latex_dir: export_latex\n  title: Plesse\n",
        "/proj",
        ResolutionOptions::default().with_path_indicator(PathIndicator::heuristic()),
    )
    .unwrap();

    let export = configuration.node("export").unwrap();
    assert_eq!(export.location("latex_dir").unwrap().as_path(), Path::new("/proj/export_latex"));
    assert_eq!(export.string("title").unwrap(), "Plesse");
}

#[test]
fn given_blank_indicator_token_when_resolved_then_no_key_becomes_a_location() {
    let configuration = Configuration::from_yaml_str(
        "title: Plesse\n",
        "/proj",
        ResolutionOptions::default()
            .with_path_indicator(PathIndicator::new([""], PathIndicatorMatch::Substring)),
    )
    .unwrap();

    assert_eq!(configuration.string("title").unwrap(), "Plesse");
}

// ============================================================
// Errors and lookups
// ============================================================

#[test]
fn given_list_document_when_resolved_then_format_error() {
    let result = Configuration::from_yaml_str(
        "- paths\n- working\n",
        "/proj",
        ResolutionOptions::default(),
    );

    assert!(matches!(result, Err(ConfigurationError::Format { .. })));
}

#[test]
fn given_empty_document_when_resolved_then_format_error() {
    let result = Configuration::from_yaml_str("", "/proj", ResolutionOptions::default());

    assert!(matches!(result, Err(ConfigurationError::Format { .. })));
}

#[test]
fn given_list_under_paths_when_resolved_then_format_error_names_the_entry() {
    let result = Configuration::from_yaml_str(
        "paths:\n  results:\n    plots: [a, b]\n",
        "/proj",
        ResolutionOptions::default(),
    );

    match result {
        Err(ConfigurationError::Format { key_path, .. }) => {
            assert_eq!(key_path, "paths.results.plots");
        }
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn given_nul_byte_in_location_when_resolved_then_path_resolution_error() {
    let result = Configuration::from_yaml_str(
        "paths:\n  working: \"bad\\0dir\"\n",
        "/proj",
        ResolutionOptions::default(),
    );

    match result {
        Err(ConfigurationError::PathResolution { key_path, .. }) => {
            assert_eq!(key_path, "paths.working");
        }
        other => panic!("expected a path resolution error, got {other:?}"),
    }
}

#[test]
fn given_non_string_root_under_paths_when_resolved_then_format_error_names_the_anchor() {
    let result = Configuration::from_yaml_str(
        "paths:\n  data:\n    root: 5\n    raw: raw\n",
        "/proj",
        ResolutionOptions::default(),
    );

    match result {
        Err(ConfigurationError::Format { key_path, .. }) => {
            assert_eq!(key_path, "paths.data.root");
        }
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn given_missing_key_when_looked_up_then_key_not_found() {
    let configuration = resolve_under_proj("paths:\n  working: wd\n");

    match configuration.lookup("paths.results.plots") {
        Err(ConfigurationError::KeyNotFound { node_path, key }) => {
            assert_eq!(node_path, "paths");
            assert_eq!(key, "results");
        }
        other => panic!("expected key not found, got {other:?}"),
    }
}

#[test]
fn given_location_when_requested_as_node_then_unexpected_value_type() {
    let configuration = resolve_under_proj("paths:\n  working: wd\n");

    let error = configuration.paths().unwrap().node("working").unwrap_err();

    assert!(matches!(
        error,
        ConfigurationError::UnexpectedValueType { ref key_path, expected: "a node", .. }
            if key_path == "paths.working"
    ));
}

// ============================================================
// Materialization
// ============================================================

const RESULTS_DOCUMENT: &str = r#"
paths:
  working: "030_Analysen/working_directory"
  data:
    root: "020_Daten"
    raw: "raw"
  results:
    root: "040_Results"
    plots: "plots"
    tables: "tables"
"#;

#[test]
fn given_results_block_when_materialized_then_children_exist() {
    let project = TempDir::new().unwrap();
    let configuration =
        Configuration::from_yaml_str(RESULTS_DOCUMENT, project.path(), ResolutionOptions::default())
            .unwrap();

    configuration
        .paths()
        .unwrap()
        .path_block("results")
        .unwrap()
        .ensure_all_directories_exist()
        .unwrap();

    assert!(project.path().join("040_Results/plots").is_dir());
    assert!(project.path().join("040_Results/tables").is_dir());
    assert!(!project.path().join("020_Daten").exists());
    assert!(!project.path().join("030_Analysen").exists());
}

#[test]
fn given_root_only_block_when_materialized_then_root_is_not_created() {
    let project = TempDir::new().unwrap();
    let configuration = Configuration::from_yaml_str(
        "paths:\n  results:\n    root: \"040_Results\"\n",
        project.path(),
        ResolutionOptions::default(),
    )
    .unwrap();

    configuration
        .paths()
        .unwrap()
        .path_block("results")
        .unwrap()
        .ensure_all_directories_exist()
        .unwrap();

    assert!(!project.path().join("040_Results").exists());
}

#[test]
fn given_output_directories_when_ensured_twice_then_idempotent_and_non_destructive() {
    let project = TempDir::new().unwrap();
    let configuration =
        Configuration::from_yaml_str(RESULTS_DOCUMENT, project.path(), ResolutionOptions::default())
            .unwrap();

    configuration.ensure_output_directories().unwrap();

    let existing_plot = project.path().join("040_Results/plots/figure.png");
    fs::write(&existing_plot, "png bytes").unwrap();

    configuration.ensure_output_directories().unwrap();

    assert!(project.path().join("030_Analysen/working_directory").is_dir());
    assert!(project.path().join("040_Results/tables").is_dir());
    assert!(!project.path().join("020_Daten").exists());
    assert_eq!(fs::read_to_string(existing_plot).unwrap(), "png bytes");
}

#[test]
fn given_custom_targets_when_ensured_then_only_targets_are_created() {
    let project = TempDir::new().unwrap();
    let configuration = Configuration::from_yaml_str(
        RESULTS_DOCUMENT,
        project.path(),
        ResolutionOptions::default().with_output_directory_targets(["data", "missing"]),
    )
    .unwrap();

    configuration.ensure_output_directories().unwrap();

    assert!(project.path().join("020_Daten/raw").is_dir());
    assert!(!project.path().join("040_Results").exists());
    assert!(!project.path().join("030_Analysen").exists());
}

#[test]
fn given_anchor_key_as_target_when_ensured_then_anchor_is_not_created() {
    let project = TempDir::new().unwrap();
    let configuration = Configuration::from_yaml_str(
        "paths:\n  root: base\n  working: ../wd\n",
        project.path(),
        ResolutionOptions::default().with_output_directory_targets(["root", "working"]),
    )
    .unwrap();

    configuration.ensure_output_directories().unwrap();

    assert!(!project.path().join("base").exists());
    assert!(project.path().join("wd").is_dir());
}

#[test]
fn given_paths_key_naming_a_plain_node_when_ensured_then_format_error() {
    let project = TempDir::new().unwrap();
    let mut configuration = Configuration::from_yaml_str(
        "paths:\n  working: wd\nsettings:\n  level: 1\n",
        project.path(),
        ResolutionOptions::default(),
    )
    .unwrap();
    configuration.options.paths_key = "settings".to_string();

    match configuration.ensure_output_directories() {
        Err(ConfigurationError::Format { key_path, .. }) => assert_eq!(key_path, "settings"),
        other => panic!("expected a format error, got {other:?}"),
    }

    assert!(!project.path().join("wd").exists());
}

#[test]
fn given_file_in_place_of_directory_when_ensured_then_directory_creation_error() {
    let project = TempDir::new().unwrap();
    fs::create_dir_all(project.path().join("040_Results")).unwrap();
    fs::write(project.path().join("040_Results/plots"), "occupied").unwrap();

    let configuration =
        Configuration::from_yaml_str(RESULTS_DOCUMENT, project.path(), ResolutionOptions::default())
            .unwrap();

    match configuration.ensure_output_directories() {
        Err(ConfigurationError::DirectoryCreation { key_path, location, .. }) => {
            assert_eq!(key_path, "paths.results.plots");
            assert_eq!(location, project.path().join("040_Results/plots"));
        }
        other => panic!("expected a directory creation error, got {other:?}"),
    }

    assert_eq!(
        fs::read_to_string(project.path().join("040_Results/plots")).unwrap(),
        "occupied"
    );
}

// ============================================================
// Loading from disk
// ============================================================

#[test]
fn given_configuration_file_when_loaded_then_locations_are_anchored_to_its_directory() {
    let project = TempDir::new().unwrap();
    let configuration_file_path = project.path().join("config.yaml");
    fs::write(&configuration_file_path, RESULTS_DOCUMENT).unwrap();

    let configuration = Configuration::load_from_path(&configuration_file_path).unwrap();

    let project_root = dunce::canonicalize(project.path()).unwrap();
    assert_eq!(configuration.project_root.as_path(), project_root);
    assert_eq!(
        location_of(&configuration, "paths.results.plots"),
        project_root.join("040_Results").join("plots")
    );
    assert_eq!(
        configuration.file_path,
        Some(dunce::canonicalize(&configuration_file_path).unwrap())
    );
}

#[test]
fn given_explicit_project_root_when_loaded_then_it_overrides_file_directory() {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let configuration_file_path = project.path().join("config.yaml");
    fs::write(&configuration_file_path, "paths:\n  working: wd\n").unwrap();

    let configuration = Configuration::load_from_path_with_project_root(
        &configuration_file_path,
        elsewhere.path(),
        ResolutionOptions::default(),
    )
    .unwrap();

    assert_eq!(location_of(&configuration, "paths.working"), elsewhere.path().join("wd"));
}

#[test]
fn given_malformed_file_when_loaded_then_error_mentions_format() {
    let project = TempDir::new().unwrap();
    let configuration_file_path = project.path().join("config.yaml");
    fs::write(&configuration_file_path, "- just\n- a list\n").unwrap();

    let error = Configuration::load_from_path(&configuration_file_path).unwrap_err();

    assert!(error
        .chain()
        .any(|cause| cause.to_string().contains("expected a mapping at the document root")));
}

#[test]
fn given_missing_file_when_loaded_then_error() {
    let project = TempDir::new().unwrap();

    assert!(Configuration::load_from_path(project.path().join("missing.yaml")).is_err());
}

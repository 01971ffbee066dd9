use std::fs;

use serde::Deserialize;
use shared_config::{Application, Clients, ConfigError, load_dir};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceConfig {
    app: Application,
    #[serde(flatten)]
    clients: Clients,
}

#[test]
fn loads_and_merges_json_and_yaml_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("app.json"),
        r#"{"app": {"name": "orders", "port": 8080, "log_level": "info"}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("clients.yaml"),
        "clients:\n  billing:\n    url: http://billing:9000\n    health: /health\n    timeout: 2\n    headers:\n      X-Api-Key: [secret]\n",
    )
    .unwrap();

    let conf: ServiceConfig = load_dir(dir.path()).unwrap();
    assert_eq!(conf.app.name, "orders");
    assert_eq!(conf.app.port, 8080);
    assert_eq!(conf.app.log_level, "info");

    let billing = &conf.clients.clients["billing"];
    assert_eq!(billing.url, "http://billing:9000");
    assert_eq!(billing.health, "/health");
    assert_eq!(billing.timeout, 2);
    assert_eq!(billing.headers["X-Api-Key"], vec!["secret"]);
}

#[test]
fn later_files_override_earlier_ones() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("01-base.json"),
        r#"{"app": {"name": "orders", "log_level": "info"}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("02-local.yml"),
        "app:\n  log_level: debug\n",
    )
    .unwrap();

    let conf: ServiceConfig = load_dir(dir.path()).unwrap();
    assert_eq!(conf.app.name, "orders");
    assert_eq!(conf.app.log_level, "debug");
}

#[test]
fn other_extensions_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "not config").unwrap();
    fs::write(dir.path().join("app.json"), r#"{"app": {"port": 1}}"#).unwrap();

    let conf: ServiceConfig = load_dir(dir.path()).unwrap();
    assert_eq!(conf.app.port, 1);
}

#[test]
fn empty_directory_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let conf: ServiceConfig = load_dir(dir.path()).unwrap();
    assert_eq!(conf.app, Application::default());
    assert!(conf.clients.clients.is_empty());
}

#[test]
fn missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("configs");

    let err = load_dir::<ServiceConfig>(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref p) if *p == missing));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();

    let err = load_dir::<ServiceConfig>(dir.path()).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert!(path.ends_with("broken.json")),
        other => panic!("expected Parse, got: {other}"),
    }
}

#[test]
fn mismatched_shape_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.json"), r#"{"app": {"port": "eighty"}}"#).unwrap();

    let err = load_dir::<ServiceConfig>(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Decode(_)), "got: {err}");
}

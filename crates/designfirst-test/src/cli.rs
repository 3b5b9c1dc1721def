//! CLI regression tests for the `designfirst` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats, which the library tests can't catch.
//!
//! Run with: `cargo test -p designfirst-test`
//! Requires the `designfirst` binary to be built first (`cargo build -p designfirst`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `designfirst` binary.
fn designfirst() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("designfirst")
        .expect("designfirst binary not found, run `cargo build -p designfirst` first");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/designfirst-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let s = String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("stdout should be valid JSON")
}

// ---------------------------------------------------------------------------
// designfirst validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_definition_exits_zero() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stderr(contains("is valid"));
}

#[test]
fn validate_invalid_definition_exits_one() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1002"));
}

#[test]
fn validate_missing_file_exits_one() {
    designfirst()
        .args(["validate", "--definition", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1000"));
}

#[test]
fn validate_openapi3_exits_one() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("openapi3.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1004"));
}

#[test]
fn validate_missing_operation_id_exits_one() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("missing-operation-id.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1020"));
}

#[test]
fn validate_duplicate_route_is_a_warning() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("merge/users.yaml"))
        .arg(fixtures().join("merge/admin.yaml"))
        .assert()
        .success()
        .stderr(contains("E1010"))
        .stderr(contains("warning"));
}

#[test]
fn validate_duplicate_route_across_root_base_paths() {
    designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("basepath/root.yaml"))
        .arg(fixtures().join("basepath/bare.yaml"))
        .assert()
        .success()
        .stderr(contains("E1010"))
        .stderr(contains("route GET /pets is also declared in"));
}

#[test]
fn validate_json_format_outputs_valid_json() {
    let output = designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert!(v.get("results").is_some(), "JSON output missing 'results' key");
    assert_eq!(v["summary"]["valid"], 1);
}

#[test]
fn validate_json_format_invalid_definition_exits_one_with_json() {
    let output = designfirst()
        .args(["validate", "--definition"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .args(["--format", "json"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .clone();

    let v = stdout_json(&output);
    let results = v["results"].as_array().expect("results should be an array");
    assert!(!results.is_empty());
    assert_eq!(results[0]["valid"], false);
}

// ---------------------------------------------------------------------------
// designfirst compile
// ---------------------------------------------------------------------------

#[test]
fn compile_without_inputs_or_local_config_exits_one() {
    let tmp = TempDir::new().expect("temp dir");
    designfirst()
        .current_dir(tmp.path())
        .args(["compile"])
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(contains("no designfirst.yaml in the current directory"));
}

#[test]
fn compile_falls_back_to_local_config() {
    let output = designfirst()
        .current_dir(fixtures().join("project"))
        .args(["compile"])
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["routes"][0]["handler"], "PetController.list");
    assert_eq!(v["static_routes"][0]["path"], "/docs/definition");
}

#[test]
fn compile_petstore_to_stdout() {
    let output = designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stderr(contains("compiled 1 definition(s) (6 routes)"))
        .get_output()
        .clone();

    let v = stdout_json(&output);
    let routes = v["routes"].as_array().expect("routes should be an array");
    assert_eq!(routes.len(), 6);

    assert_eq!(routes[0]["method"], "POST");
    assert_eq!(routes[0]["path"], "/v2/pet");
    assert_eq!(routes[0]["handler"], "PetController.addPet");
    assert_eq!(
        routes[0]["policies"],
        serde_json::json!(["Authenticated", "CanManagePets"])
    );
    assert_eq!(
        routes[0]["validation"]["payload"]["required"],
        serde_json::json!(["name", "photoUrls"])
    );

    let inventory = &routes[5];
    assert_eq!(inventory["handler"], "getInventory");
    assert!(inventory.get("policies").is_none());

    assert_eq!(
        v["policies"]["PetController"]["updatePetWithForm"],
        serde_json::json!(["ApiKeyPolicy", "CanManagePets"])
    );
    assert_eq!(
        v["policies"]["AdminController"]["deletePet"],
        serde_json::json!(["ApiKeyPolicy"])
    );

    assert_eq!(v["static_routes"][0]["path"], "/swagger");
}

#[test]
fn compile_writes_output_file() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("api.json");

    designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).expect("output written");
    let v: serde_json::Value = serde_json::from_str(&content).expect("output is JSON");
    assert_eq!(v["routes"].as_array().map(Vec::len), Some(6));
}

#[test]
fn compile_is_deterministic() {
    let run = || {
        designfirst()
            .args(["compile", "--definition"])
            .arg(fixtures().join("petstore.yaml"))
            .arg(fixtures().join("merge/users.yaml"))
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn compile_merges_policies_in_input_order() {
    let output = designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("merge/users.yaml"))
        .arg(fixtures().join("merge/admin.yaml"))
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["routes"].as_array().map(Vec::len), Some(2));
    assert_eq!(
        v["policies"]["UserController"]["list"],
        serde_json::json!(["Authenticated", "IsAdmin"])
    );
}

#[test]
fn compile_invalid_definition_compiles_nothing() {
    designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .arg("nonexistent.yaml")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(contains("2 definition(s) failed validation"))
        .stderr(contains("invalid-parse-error.yaml"))
        .stderr(contains("nonexistent.yaml"));
}

#[test]
fn compile_missing_operation_id_exits_one() {
    designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("missing-operation-id.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1020"));
}

#[test]
fn compile_with_project_config() {
    let output = designfirst()
        .args(["compile", "--config"])
        .arg(fixtures().join("project/designfirst.yaml"))
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["routes"][0]["handler"], "PetController.list");

    let static_routes = v["static_routes"].as_array().expect("static routes");
    assert_eq!(static_routes.len(), 2);
    assert_eq!(static_routes[0]["path"], "/docs/definition");
    assert!(static_routes[0]["directories"][0]
        .as_str()
        .is_some_and(|d| d.ends_with("project/api")));
    assert_eq!(static_routes[1]["path"], "/docs");
    assert!(static_routes[1]["directories"][0]
        .as_str()
        .is_some_and(|d| d.ends_with("project/public/swagger-ui")));
}

#[test]
fn compile_definition_flag_replaces_config_list() {
    let output = designfirst()
        .args(["compile", "--config"])
        .arg(fixtures().join("project/designfirst.yaml"))
        .arg("--definition")
        .arg(fixtures().join("merge/users.yaml"))
        .assert()
        .success()
        .get_output()
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["routes"][0]["path"], "/api/users");
    assert_eq!(v["static_routes"][0]["path"], "/docs/definition");
}

#[test]
fn compile_invalid_config_exits_one() {
    let tmp = TempDir::new().expect("temp dir");
    let config = tmp.path().join("designfirst.yaml");
    std::fs::write(&config, "definitions: []\n").expect("write config");

    designfirst()
        .args(["compile", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("lists no definitions"));
}

#[test]
fn compile_schema_depth_flag_is_enforced() {
    designfirst()
        .args(["compile", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--max-schema-depth", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1051"));
}

#[test]
fn compile_with_json_logs_keeps_stdout_clean() {
    let output = designfirst()
        .args(["--log-level", "debug", "--log-format", "json"])
        .args(["compile", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stderr(contains("definition_loaded"))
        .get_output()
        .clone();

    stdout_json(&output);
}

#[test]
fn invalid_log_format_exits_two() {
    designfirst()
        .args(["--log-format", "xml", "routes", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .failure()
        .code(2);
}

// ---------------------------------------------------------------------------
// designfirst routes
// ---------------------------------------------------------------------------

#[test]
fn routes_prints_table() {
    designfirst()
        .args(["routes", "--definition"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stdout(contains("POST   /v2/pet"))
        .stdout(contains("-> PetController.addPet [Authenticated, CanManagePets]"))
        .stdout(contains("-> AdminController.deletePet [ApiKeyPolicy]"))
        .stdout(contains("-> getInventory\n"));
}

#[test]
fn routes_invalid_definition_exits_one() {
    designfirst()
        .args(["routes", "--definition"])
        .arg(fixtures().join("openapi3.yaml"))
        .assert()
        .failure()
        .code(1);
}

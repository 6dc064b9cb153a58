//! CLI integration tests for the `catena-codegen` subcommands.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to the example device models resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `catena-codegen` binary, rooted at workspace.
fn codegen() -> Command {
    let mut cmd = cargo_bin_cmd!("catena-codegen");
    cmd.current_dir(workspace_root());
    cmd
}

fn write_model(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

const MISSING_TEMPLATE: &str = r#"{
    "params": {
        "copy": {"type": "INT32", "template_oid": "/original"},
        "original": {"type": "INT32"}
    }
}"#;

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    codegen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Catena device model code generator",
        ));
}

#[test]
fn version_exits_0() {
    codegen()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catena-codegen"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    codegen().assert().failure();
}

// ──────────────────────────────────────────────
// 2. validate
// ──────────────────────────────────────────────

#[test]
fn validate_example_models_exits_0() {
    for model in [
        "example_device_models/device.use_structs.json",
        "example_device_models/device.use_variants.json",
        "example_device_models/device.use_templates.json",
        "example_device_models/device.use_constraints.yaml",
        "example_device_models/device.import_params.json",
    ] {
        codegen()
            .args(["validate", model])
            .assert()
            .success()
            .stdout(predicate::str::contains("valid"));
    }
}

#[test]
fn validate_json_output_names_the_namespace() {
    codegen()
        .args([
            "--output",
            "json",
            "validate",
            "example_device_models/device.use_variants.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("\"namespace\": \"use_variants\""));
}

#[test]
fn validate_schema_violation_exits_1() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(
        tmp.path(),
        "device.bad.json",
        r#"{"params": {"x": {"type": "INT64"}}}"#,
    );
    codegen()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid device model"));
}

#[test]
fn validate_schema_violation_json_output() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.bad.json", r#"{"slot": "one"}"#);
    codegen()
        .args(["--output", "json", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"valid\": false"))
        .stderr(predicate::str::contains("\"errors\""));
}

#[test]
fn validate_resolution_error_exits_1() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.forward.json", MISSING_TEMPLATE);
    codegen()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("/copy: missing template '/original'"));
}

#[test]
fn validate_resolution_error_json_output() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.forward.json", MISSING_TEMPLATE);
    codegen()
        .args(["--output", "json", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"kind\": \"missing_template\""))
        .stderr(predicate::str::contains("\"oid\": \"/copy\""));
}

#[test]
fn validate_quiet_suppresses_errors() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.forward.json", MISSING_TEMPLATE);
    codegen()
        .args(["--quiet", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

#[test]
fn validate_nonexistent_file_exits_1() {
    codegen()
        .args(["validate", "example_device_models/device.nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}

#[test]
fn validate_unsupported_extension_exits_1() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.thing.txt", "{}");
    codegen()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn validate_file_name_must_carry_a_namespace() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "model.json", r#"{"slot": 1}"#);
    codegen().arg("validate").arg(&path).assert().failure();
}

#[test]
fn validate_with_custom_schema() {
    let tmp = TempDir::new().unwrap();
    let schema = write_model(
        tmp.path(),
        "strict.json",
        r#"{"type": "object", "required": ["menu_groups"]}"#,
    );
    codegen()
        .args(["validate", "example_device_models/device.use_structs.json", "--schema"])
        .arg(&schema)
        .assert()
        .failure()
        .stderr(predicate::str::contains("menu_groups"));
}

// ──────────────────────────────────────────────
// 3. generate
// ──────────────────────────────────────────────

#[test]
fn generate_writes_header_and_body() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args(["generate", "example_device_models/device.use_structs.json", "--out"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("device.use_structs.json.h"))
        .stdout(predicate::str::contains("device.use_structs.json.cpp"));

    let header = fs::read_to_string(tmp.path().join("device.use_structs.json.h")).unwrap();
    let body = fs::read_to_string(tmp.path().join("device.use_structs.json.cpp")).unwrap();
    assert!(header.contains("namespace use_structs {"));
    assert!(header.contains("struct Location {"));
    assert!(body.contains("#include \"device.use_structs.json.h\""));
    assert!(body.contains("use_structs::Location location = "));
}

#[test]
fn generate_json_output_lists_paths() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args([
            "--output",
            "json",
            "generate",
            "example_device_models/device.use_constraints.yaml",
            "--out",
        ])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"header\""))
        .stdout(predicate::str::contains("\"body\""));
    assert!(tmp.path().join("device.use_constraints.yaml.cpp").is_file());
}

#[test]
fn generate_follows_imports() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args(["generate", "example_device_models/device.import_params.json", "--out"])
        .arg(tmp.path())
        .assert()
        .success();
    let header = fs::read_to_string(tmp.path().join("device.import_params.json.h")).unwrap();
    assert!(header.contains("struct City {"));
    assert!(header.contains("struct Location {"));
}

#[test]
fn generate_namespace_override() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args([
            "generate",
            "example_device_models/device.use_templates.json",
            "--namespace",
            "studio",
            "--out",
        ])
        .arg(tmp.path())
        .assert()
        .success();
    let header = fs::read_to_string(tmp.path().join("device.use_templates.json.h")).unwrap();
    assert!(header.contains("namespace studio {"));
    assert!(!header.contains("namespace use_templates {"));
}

#[test]
fn generate_rejects_invalid_namespace() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args([
            "generate",
            "example_device_models/device.use_templates.json",
            "--namespace",
            "not-valid",
            "--out",
        ])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid identifier"));
}

#[test]
fn generate_rejects_unknown_language() {
    let tmp = TempDir::new().unwrap();
    codegen()
        .args([
            "generate",
            "example_device_models/device.use_structs.json",
            "--language",
            "rust",
            "--out",
        ])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported target language 'rust'"));
    assert!(!tmp.path().join("device.use_structs.json.h").exists());
}

#[test]
fn generate_resolution_error_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.forward.json", MISSING_TEMPLATE);
    let out = tmp.path().join("out");
    codegen()
        .arg("generate")
        .arg(&path)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing template"));
    assert!(!out.exists());
}

#[test]
fn generate_skip_schema_bypasses_validation() {
    let tmp = TempDir::new().unwrap();
    // unknown top-level keys fail the schema but are ignored by the resolver
    let path = write_model(
        tmp.path(),
        "device.extra.json",
        r#"{"comment": "bench unit", "params": {"x": {"type": "INT32"}}}"#,
    );
    let out = tmp.path().join("out");

    codegen()
        .arg("generate")
        .arg(&path)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid device model"));

    codegen()
        .arg("generate")
        .arg(&path)
        .arg("--skip-schema")
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    assert!(out.join("device.extra.json.h").is_file());
}

#[test]
fn generate_reads_config_file() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("from-config");
    let config = tmp.path().join("codegen.toml");
    fs::write(
        &config,
        format!(
            "[generate]\nout = {:?}\nnamespace = \"configured\"\n",
            out.display().to_string()
        ),
    )
    .unwrap();

    codegen()
        .args(["generate", "example_device_models/device.use_variants.json", "--config"])
        .arg(&config)
        .assert()
        .success();
    let header = fs::read_to_string(out.join("device.use_variants.json.h")).unwrap();
    assert!(header.contains("namespace configured {"));
}

#[test]
fn generate_flags_win_over_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("codegen.toml");
    fs::write(&config, "[generate]\nnamespace = \"configured\"\n").unwrap();

    codegen()
        .args([
            "generate",
            "example_device_models/device.use_variants.json",
            "--namespace",
            "flagged",
            "--config",
        ])
        .arg(&config)
        .arg("--out")
        .arg(tmp.path())
        .assert()
        .success();
    let header = fs::read_to_string(tmp.path().join("device.use_variants.json.h")).unwrap();
    assert!(header.contains("namespace flagged {"));
}

#[test]
fn generate_picks_up_default_config_in_working_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("catena-codegen.toml"),
        "[generate]\nout = \"generated\"\n",
    )
    .unwrap();
    let model = workspace_root().join("example_device_models/device.use_structs.json");

    let mut cmd = cargo_bin_cmd!("catena-codegen");
    cmd.current_dir(tmp.path())
        .arg("generate")
        .arg(&model)
        .assert()
        .success();
    assert!(tmp
        .path()
        .join("generated/device.use_structs.json.h")
        .is_file());
}

#[test]
fn generate_bad_config_exits_1() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("codegen.toml");
    fs::write(&config, "[generate]\nout = 3\n").unwrap();
    codegen()
        .args(["generate", "example_device_models/device.use_structs.json", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

// ──────────────────────────────────────────────
// 4. inspect
// ──────────────────────────────────────────────

#[test]
fn inspect_prints_resolved_summary() {
    let output = codegen()
        .args(["inspect", "example_device_models/device.use_templates.json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["namespace"], "use_templates");
    let params = summary["params"].as_array().unwrap();
    let low = params.iter().find(|p| p["oid"] == "/low_band").unwrap();
    assert_eq!(low["template"], "/eq_band");
    let eq = params.iter().find(|p| p["oid"] == "/eq").unwrap();
    assert_eq!(eq["type"], "STRUCT_ARRAY");
}

#[test]
fn inspect_reports_shared_constraints() {
    codegen()
        .args(["inspect", "example_device_models/device.use_constraints.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"percent\""))
        .stdout(predicate::str::contains("\"shared\": true"));
}

#[test]
fn inspect_resolution_error_exits_1() {
    let tmp = TempDir::new().unwrap();
    let path = write_model(tmp.path(), "device.forward.json", MISSING_TEMPLATE);
    codegen()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .code(1);
}

//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with an isolated home directory and no config override
fn costsim(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_costsim"))
        .args(args)
        .env("HOME", home)
        .env_remove("COSTSIM_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Two services over one minute, one sample without a service id
fn write_raw_metrics(dir: &Path) -> std::path::PathBuf {
    let mut collected = serde_json::Map::new();
    for i in 0..6 {
        let ts = format!("2024-01-01T12:00:{:02}", i * 10);
        collected.insert(
            format!("{ts}-api-gateway"),
            serde_json::json!({
                "service": "api-gateway",
                "cpu_percent": 50.0,
                "cpu_cores": 1.0,
                "memory_used_gb": 0.5,
                "memory_limit_gb": 1.0
            }),
        );
        collected.insert(
            format!("{ts}-worker"),
            serde_json::json!({
                "service": "worker",
                "cpu_percent": 10.0,
                "cpu_cores": 0.5,
                "memory_used_gb": 0.25,
                "memory_limit_gb": 1.0
            }),
        );
    }
    collected.insert(
        "2024-01-01T12:00:00-orphan".to_string(),
        serde_json::json!({ "cpu_percent": 99.0 }),
    );

    let doc = serde_json::json!({
        "duration_seconds": 60,
        "interval_seconds": 10,
        "start_time": "2024-01-01T12:00:00",
        "end_time": "2024-01-01T12:01:00",
        "collected_metrics": collected
    });

    let path = dir.join("raw-metrics.json");
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = costsim(home.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("parse-metrics"), "Should show parse-metrics command");
    assert!(stdout.contains("compare"), "Should show compare command");
    assert!(stdout.contains("price"), "Should show price command");
    assert!(stdout.contains("project"), "Should show project command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = costsim(home.path(), &["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("costsim"), "Should show binary name");
}

/// Test the parse-metrics then compare pipeline through files
#[test]
fn test_parse_then_compare() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let comparison = dir.path().join("comparison.json");

    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(
        output.status.success(),
        "parse-metrics failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed_doc = read_json(&parsed);
    let services = parsed_doc["services"].as_object().unwrap();
    assert_eq!(services.len(), 2, "orphan sample should be dropped");
    assert_eq!(services["api-gateway"]["num_samples"], 6);
    assert_eq!(services["api-gateway"]["vcpu_seconds"].as_f64(), Some(30.0));

    let output = costsim(
        dir.path(),
        &[
            "compare",
            parsed.to_str().unwrap(),
            "3600",
            comparison.to_str().unwrap(),
        ],
    );
    assert!(
        output.status.success(),
        "compare failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc = read_json(&comparison);
    assert_eq!(doc["test_duration_seconds"].as_f64(), Some(3600.0));
    assert_eq!(doc["test_duration_hours"].as_f64(), Some(1.0));
    let platforms = doc["platforms"].as_object().unwrap();
    for key in ["aca", "aci", "aks_spot", "aks_ondemand"] {
        assert!(platforms.contains_key(key), "missing platform {key}");
    }
    assert_eq!(doc["summary"]["total_services"], 2);
    assert!(doc["comparison"]["cheapest_platform"].is_string());
    assert_eq!(
        doc["comparison"]["savings"]
            .as_object()
            .unwrap()
            .len(),
        4
    );
}

/// Test that JSON format prints the document to stdout
#[test]
fn test_project_json_output() {
    let home = TempDir::new().unwrap();
    let output = costsim(home.path(), &["--format", "json", "project", "1"]);

    assert!(output.status.success(), "project should succeed");
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let monthly = doc["projected_monthly_cost"].as_f64().unwrap();
    let annual = doc["projected_annual_cost"].as_f64().unwrap();
    assert!((monthly - 960.0).abs() < 1e-6);
    assert!((annual - 11520.0).abs() < 1e-6);
    assert_eq!(doc["peak_hours_per_day"], 8);
}

/// Test that project honors traffic overrides
#[test]
fn test_project_overrides() {
    let home = TempDir::new().unwrap();
    let output = costsim(
        home.path(),
        &[
            "--format",
            "json",
            "project",
            "0.5",
            "--peak-hours",
            "0",
            "--off-peak-hours",
            "24",
            "--days",
            "10",
        ],
    );

    assert!(output.status.success(), "project should succeed");
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let monthly = doc["projected_monthly_cost"].as_f64().unwrap();
    assert!((monthly - 120.0).abs() < 1e-6);
}

/// Test that an unknown platform exits with an error
#[test]
fn test_price_unknown_platform() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = costsim(
        dir.path(),
        &["price", parsed.to_str().unwrap(), "gke"],
    );

    assert!(!output.status.success(), "unknown platform should fail");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gke"), "error should name the platform: {stderr}");
}

/// Test pricing a single platform writes its cost document
#[test]
fn test_price_single_platform() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let cost = dir.path().join("aci.json");
    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = costsim(
        dir.path(),
        &[
            "price",
            parsed.to_str().unwrap(),
            "aci",
            "60",
            cost.to_str().unwrap(),
        ],
    );
    assert!(
        output.status.success(),
        "price failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc = read_json(&cost);
    assert_eq!(doc["service_costs"].as_array().unwrap().len(), 2);
    assert!(doc["total_cost"].as_f64().unwrap() > 0.0);
    assert!(doc["monthly_projection"].is_object());
}

/// Test that a zero-length window is rejected
#[test]
fn test_compare_zero_duration_fails() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = costsim(
        dir.path(),
        &[
            "compare",
            parsed.to_str().unwrap(),
            "0",
            dir.path().join("out.json").to_str().unwrap(),
        ],
    );

    assert!(!output.status.success(), "zero duration should fail");
    assert!(!dir.path().join("out.json").exists());
}

/// Test that metrics are exported after a run
#[test]
fn test_metrics_file_export() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let metrics = dir.path().join("metrics.prom");

    let output = costsim(
        dir.path(),
        &[
            "--metrics-file",
            metrics.to_str().unwrap(),
            "parse-metrics",
            raw.to_str().unwrap(),
            parsed.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let text = std::fs::read_to_string(&metrics).unwrap();
    assert!(text.contains("costsim_samples_aggregated_total 13"));
    assert!(text.contains("costsim_samples_dropped_total 1"));
}

/// Test that a missing input file reports an error
#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = costsim(
        dir.path(),
        &["parse-metrics", dir.path().join("missing.json").to_str().unwrap()],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.json"));
}

/// Test that a discount on a platform without discounted capacity is reported
#[test]
fn test_price_discount_ignored_warning() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let cost = dir.path().join("aca.json");
    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = costsim(
        dir.path(),
        &[
            "--format",
            "json",
            "price",
            parsed.to_str().unwrap(),
            "aca",
            "60",
            cost.to_str().unwrap(),
            "--discount",
            "0.5",
        ],
    );

    assert!(output.status.success(), "price should still succeed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--discount 0.5 ignored"), "{stderr}");
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(doc["total_cost"].is_number());
}

/// Test that a window shorter than the measured activity is rejected
#[test]
fn test_compare_window_shorter_than_measurement_fails() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw_metrics(dir.path());
    let parsed = dir.path().join("parsed.json");
    let out = dir.path().join("out.json");
    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), parsed.to_str().unwrap()],
    );
    assert!(output.status.success());

    let output = costsim(
        dir.path(),
        &["compare", parsed.to_str().unwrap(), "30", out.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("longer than the 30 second window"), "{stderr}");
    assert!(!out.exists());
}

/// Test that numbers too large to total exit cleanly with an error
#[test]
fn test_oversized_samples_exit_with_error() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw.json");
    std::fs::write(
        &raw,
        r#"{
            "duration_seconds": 60,
            "interval_seconds": 1000000000000000,
            "collected_metrics": {
                "t0": {"service": "api", "cpu_percent": 100, "cpu_cores": 100000000000000}
            }
        }"#,
    )
    .unwrap();

    let output = costsim(
        dir.path(),
        &["parse-metrics", raw.to_str().unwrap(), dir.path().join("out.json").to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exceeds the supported numeric range"), "{stderr}");
}

/// Test that an hourly cost too large to project exits cleanly with an error
#[test]
fn test_project_overflow_exits_with_error() {
    let home = TempDir::new().unwrap();
    let output = costsim(home.path(), &["project", "79228162514264337593543950335"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exceeds the supported numeric range"), "{stderr}");
}

use std::{fs, path::PathBuf, process::Command};

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn samgen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_samgen"))
}

#[test]
fn generate_writes_fixtures_from_the_demo_profile() {
    let out = tempfile::tempdir().expect("temp dir");
    let summary = out.path().join("summary.json");

    let output = samgen()
        .arg("generate")
        .arg("--profile")
        .arg(demos().join("profile.toml"))
        .arg("--reference-dir")
        .arg(demos().join("reference"))
        .arg("--output-dir")
        .arg(out.path())
        .arg("--summary")
        .arg(&summary)
        .args(["--seed", "11", "--captured-at", "2024-11-05 08:00:00"])
        .current_dir(out.path())
        .output()
        .expect("run samgen");
    assert!(
        output.status.success(),
        "samgen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let usage = fs::read_to_string(out.path().join("concurrent_records.xml")).expect("usage");
    assert!(usage.starts_with("<?xml"));
    assert!(usage.contains("<unload unload_date=\"2024-11-05 08:00:00\">"));
    assert!(out.path().join("denial_records.xml").is_file());
    assert!(out.path().join("license_records.xml").is_file());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(summary).expect("summary")).expect("json");
    assert_eq!(json["peak"], 100);
    assert_eq!(json["days"], 91);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("seed 11"));
}

#[test]
fn same_seed_writes_identical_fixtures() {
    let run = |dir: &std::path::Path| {
        let status = samgen()
            .arg("generate")
            .arg("--profile")
            .arg(demos().join("profile.toml"))
            .arg("--reference-dir")
            .arg(demos().join("reference"))
            .arg("--output-dir")
            .arg(dir)
            .args(["--seed", "4", "--captured-at", "2024-01-01 00:00:00"])
            .current_dir(dir)
            .status()
            .expect("run samgen");
        assert!(status.success());
        fs::read_to_string(dir.join("concurrent_records.xml")).expect("usage")
    };

    let first = tempfile::tempdir().expect("temp dir");
    let second = tempfile::tempdir().expect("temp dir");
    assert_eq!(run(first.path()), run(second.path()));
}

#[test]
fn missing_profile_fails_with_context() {
    let output = samgen()
        .args(["generate", "--profile", "does-not-exist.toml"])
        .output()
        .expect("run samgen");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read profile"));
}

#[test]
fn wave_prints_dated_levels() {
    let output = samgen()
        .args([
            "wave",
            "--length",
            "30",
            "--cycles",
            "2",
            "--peak",
            "50",
            "--seed",
            "3",
            "--start",
            "2024-02-01",
        ])
        .output()
        .expect("run samgen");
    assert!(output.status.success());

    let levels: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let levels = levels.as_array().expect("array");
    assert_eq!(levels.len(), 30);
    assert_eq!(levels[0]["date"], "2024-02-01");
    assert!(levels
        .iter()
        .all(|level| level["level"].as_u64().is_some_and(|value| value <= 50)));
}

#[test]
fn wave_rejects_out_of_range_randomness() {
    let output = samgen()
        .args(["wave", "--randomness", "11"])
        .output()
        .expect("run samgen");
    assert!(!output.status.success());
}

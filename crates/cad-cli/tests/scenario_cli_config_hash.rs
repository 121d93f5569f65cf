use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

/// `cad-cli config-hash` prints a 64-hex hash and canonical (sorted) JSON,
/// and overlay order is visible in the merged result.
#[test]
fn config_hash_prints_hash_and_canonical_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("base.yaml");
    let stress = dir.path().join("stress.yaml");
    fs::write(
        &base,
        "portfolio:\n  target_cet1_ratio: 0.125\n  counterparty_count: 5\n",
    )?;
    fs::write(&stress, "portfolio:\n  target_cet1_ratio: 0.16\n")?;

    let out = Command::cargo_bin("cad-cli")?
        .arg("config-hash")
        .arg(&base)
        .arg(&stress)
        .output()?;
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout)?;
    let mut lines = stdout.lines();
    let hash_line = lines.next().unwrap_or_default();
    let hash = hash_line.strip_prefix("config_hash=").expect("config_hash= prefix");
    assert_eq!(hash.len(), 64);

    let json: serde_json::Value = serde_json::from_str(lines.next().unwrap_or_default())?;
    assert_eq!(json["portfolio"]["target_cet1_ratio"], 0.16);
    assert_eq!(json["portfolio"]["counterparty_count"], 5);
    Ok(())
}

#[test]
fn config_hash_requires_paths() -> anyhow::Result<()> {
    Command::cargo_bin("cad-cli")?
        .arg("config-hash")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn config_hash_reports_missing_file() -> anyhow::Result<()> {
    Command::cargo_bin("cad-cli")?
        .args(["config-hash", "does/not/exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read yaml path"));
    Ok(())
}

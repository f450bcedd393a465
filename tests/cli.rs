// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn llmflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("llmflow").unwrap();
    cmd.arg("-C")
        .arg(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("LLMFLOW_MODEL")
        .env_remove("LLMFLOW_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_graph_chart_lists_steps_in_order() {
    let dir = TempDir::new().unwrap();

    llmflow(&dir)
        .args(["graph", "chart"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. summarize_schema"))
        .stdout(predicate::str::contains("4. build_vega"))
        .stdout(predicate::str::contains("[depends: parse_request]"));
}

#[test]
fn test_graph_roadmap_mermaid() {
    let dir = TempDir::new().unwrap();

    llmflow(&dir)
        .args(["graph", "roadmap", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("calculate --> advise"))
        .stdout(predicate::str::contains("retrieve_context --> write"));
}

#[test]
fn test_config_redacts_api_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("llmflow.toml"), "[llm]\nmodel = \"test-model\"\n").unwrap();

    llmflow(&dir)
        .arg("config")
        .env("OPENAI_API_KEY", "sk-very-secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("model = \"test-model\""))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("sk-very-secret").not());
}

#[test]
fn test_chart_missing_data_is_bad_input() {
    let dir = TempDir::new().unwrap();

    llmflow(&dir)
        .args(["chart", "missing.json", "bar chart of sales"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad input"));
}

#[test]
fn test_roadmap_offline() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("energy.json"),
        r#"[{"kwh": 1000, "renewable_kwh": 200}, {"kwh": 500, "renewable_kwh": 100}]"#,
    )
    .unwrap();

    llmflow(&dir)
        .args(["roadmap", "energy.json", "--no-llm", "--grid-intensity", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# NetZero Roadmap"))
        .stdout(predicate::str::contains("**600 kg CO₂**"))
        .stdout(predicate::str::contains("Renewable share of electricity: **20.0%**"));
}

#[test]
fn test_roadmap_reads_csv() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("energy.csv"),
        "kwh,renewable_kwh\n1000,200\n500,100\n",
    )
    .unwrap();

    llmflow(&dir)
        .args(["roadmap", "energy.csv", "--no-llm", "--grid-intensity", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**600 kg CO₂**"));
}

#[test]
fn test_ask_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("notes.txt"),
        "The notice period is thirty days.",
    )
    .unwrap();

    llmflow(&dir)
        .args(["ask", "notes.txt", "What is the notice period?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key"));
}

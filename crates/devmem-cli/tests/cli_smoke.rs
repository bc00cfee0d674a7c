use assert_cmd::Command;
use predicates::prelude::*;

const TINY: [&str; 8] =
    ["--threads", "2", "--elements-per-thread", "16", "--repetitions", "2", "--passes", "1"];

fn devmem() -> Command {
    let mut cmd = Command::cargo_bin("devmem").unwrap();
    for key in [
        "DEVMEM_THREAD_COUNT",
        "DEVMEM_ELEMENTS_PER_THREAD",
        "DEVMEM_REPETITIONS",
        "DEVMEM_WRITE_BASE_VALUE",
        "DEVMEM_MEMORY_LIMIT",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn help_works() {
    devmem()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--passes").and(predicate::str::contains("--config")));
}

#[test]
fn version_works() {
    devmem().arg("--version").assert().success();
}

#[test]
fn tiny_run_prints_summary_table() {
    devmem()
        .args(TINY)
        .assert()
        .success()
        .stdout(predicate::str::contains("readGlobalMemoryCoalesced"))
        .stdout(predicate::str::contains("writeGlobalMemoryCoalesced"))
        .stdout(predicate::str::contains("TextureRepeatedRandomAccess"))
        .stdout(predicate::str::contains("N/A"));
}

#[test]
fn json_output_is_parseable() {
    let out = devmem().args(TINY).args(["--format", "json"]).assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["report"]["passes_completed"], 1);
    assert_eq!(value["results"]["records"].as_array().unwrap().len(), 7);
}

#[test]
fn csv_goes_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    devmem()
        .args(TINY)
        .args(["--format", "csv", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.starts_with("test,atts,units,median,mean,stddev,min,max\n"));
    assert_eq!(csv.lines().count(), 8);
}

#[test]
fn print_config_emits_toml() {
    devmem()
        .args(["--threads", "3", "--print-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("thread_count = 3"));
}

#[test]
fn zero_passes_is_a_configuration_error() {
    devmem()
        .args(["--threads", "2", "--elements-per-thread", "16", "--repetitions", "2", "--passes", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("passes"));
}

#[test]
fn invalid_constants_are_a_configuration_error() {
    devmem().args(["--threads", "0"]).assert().code(2);
}

#[test]
fn memory_limit_below_buffer_size_is_rejected() {
    devmem()
        .args(TINY)
        .args(["--memory-limit", "64"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("memory_limit_bytes"));
}

#[test]
fn missing_config_file_fails() {
    devmem().args(["--config", "/nonexistent/devmem.toml"]).assert().code(2);
}

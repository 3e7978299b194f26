use std::path::Path;
use std::process::Command;

const PATH: &str = env!("CARGO_BIN_EXE_autoalgo");

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let cfg = dir.join("autoalgo.toml");
    let content = format!(
        r#"
[config]
report_dir = "{0}/reports"
experiments_dir = "{0}/experiments"
seed = 3

[profile]
scales = [10, 20]
repetitions = 1

{1}
"#,
        dir.display(),
        extra
    );
    std::fs::write(&cfg, content).unwrap();
    cfg
}

fn read_json(dir: &Path, batch: &str, name: &str) -> serde_json::Value {
    let p = dir.join("reports").join(batch).join(name);
    let s = std::fs::read_to_string(p).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn test_run_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = write_config(tmp.path(), "");
    let out = Command::new(PATH)
        .arg("run")
        .arg("b1")
        .arg("--etc")
        .arg(&cfg)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let r = read_json(tmp.path(), "b1", "results.json");
    assert_eq!(r["experiment_id"], "b1");
    let meta = &r["metadata"];
    assert_eq!(meta["seed"], 3);
    assert_eq!(meta["os"], std::env::consts::OS);
    assert!(meta["problem"].as_str().unwrap().contains("minimum-cost path"));
    assert!(meta["timestamp_utc"].as_str().unwrap().ends_with('Z'));
    assert_eq!(&read_json(tmp.path(), "b1", "metadata.json"), meta);
    let cands = r["candidates"].as_array().unwrap();
    assert_eq!(cands.len(), 4);

    // The Dijkstra variants fail the negative weight case.
    for c in cands {
        let id = c["id"].as_str().unwrap();
        let expect = if id.starts_with("dijkstra") { 0.0 } else { 1.0 };
        assert_eq!(c["correctness"], expect, "{}", id);
        if expect == 0.0 {
            assert_eq!(c["failure"], "correctness_failure");
            assert!(c["avg_runtime_ms"].is_null());
        }
    }
    let winner = r["winner"].as_str().unwrap();
    assert!(winner == "bellman_ford" || winner == "spfa", "{}", winner);
    assert_eq!(cands[0]["id"], winner);

    let csv = std::fs::read_to_string(tmp.path().join("reports/b1/results.csv")).unwrap();
    let rows = csv.lines().collect::<Vec<_>>();
    assert_eq!(rows.len(), 5);
    assert!(rows[0].starts_with("rank,id,correctness,"), "{}", rows[0]);
    assert!(rows[1].starts_with(&format!("1,{},1,", winner)), "{}", rows[1]);

    let art = tmp.path().join("experiments/b1/spfa");
    assert!(art.join("solution.rs").exists());
    assert!(art.join("prompt.txt").exists());
    assert!(tmp.path().join("experiments/b1/dijkstra_heap/error.log").exists());
    assert!(tmp.path().join("reports/b1/autoalgo.log").exists());
}

#[test]
fn test_run_dir_dry() {
    let tmp = tempfile::tempdir().unwrap();
    let props = tmp.path().join("proposals");
    std::fs::create_dir(&props).unwrap();
    std::fs::write(props.join("a.rs"), "// a").unwrap();
    std::fs::write(props.join("a.toml"), "entry = \"spfa\"\nsrc = \"a.rs\"\n").unwrap();
    std::fs::write(props.join("b.toml"), "entry = \"missing\"\nsrc = \"a.rs\"\n").unwrap();

    let cfg = write_config(tmp.path(), "");
    let out = Command::new(PATH)
        .args(["run", "b2", "--data-source", "dir", "--dry", "true"])
        .arg("--proposal-dir")
        .arg(&props)
        .arg("--etc")
        .arg(&cfg)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("CandidateLoad"), "{}", stdout);
    for name in ["results.json", "results.csv", "metadata.json"] {
        assert!(!tmp.path().join("reports/b2").join(name).exists(), "{}", name);
    }
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("experiments/b2/a/solution.rs")).unwrap(),
        "// a"
    );
}

#[test]
fn test_missing_config() {
    let tmp = tempfile::tempdir().unwrap();
    let out = Command::new(PATH)
        .args(["run", "--etc"])
        .arg(tmp.path().join("nope.toml"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
}

use std::process::Command;

use tempfile::tempdir;

fn run(args: &[&str], extra: &[&std::path::Path]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ahp"));
    cmd.args(args);
    for path in extra {
        cmd.arg(path);
    }
    cmd.output().unwrap()
}

#[test]
fn cli_compare_writes_report() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("fuel.json");
    let out = dir.path().join("report.json");
    std::fs::write(
        &input,
        r#"{
            "name": "Fuel Economy",
            "judgments": {"measured": [["civic", 34], ["saturn", 27], ["escort", 24], ["clio", 28]]}
        }"#,
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_ahp"))
        .args(["compare", "--verbose", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["name"], "Fuel Economy");
    assert_eq!(report["weights"]["local"]["civic"], 0.3009);
    assert_eq!(report["consistency_ratio"], 0.0);
    assert_eq!(report["comparisons"]["count"], 4);
    assert_eq!(report["elements"]["names"][3], "clio");
}

#[test]
fn cli_compose_reports_whole_hierarchy() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("model.json");
    let out = dir.path().join("report.json");
    std::fs::write(
        &input,
        r#"{
            "comparisons": [
                {"name": "a", "judgments": {"ratio": [["b", "c", 1]]}},
                {"name": "b", "judgments": {"ratio": [["d", "e", 4]]}},
                {"name": "c", "judgments": {"measured": [["x", 2], ["y", 4], ["z", 4]]}},
                {"name": "d", "judgments": {"ratio": [["f", "g", 2]]}},
                {"name": "e", "judgments": {"measured": [["x", 1], ["y", 2], ["z", 3]]}},
                {"name": "f", "judgments": {"measured": [["x", 2], ["y", 4], ["z", 4]]}},
                {"name": "g", "judgments": {"measured": [["x", 1], ["y", 2], ["z", 3]]}}
            ],
            "hierarchy": [
                {"parent": "a", "children": ["b", "c"]},
                {"parent": "b", "children": ["d", "e"]},
                {"parent": "d", "children": ["f", "g"]}
            ]
        }"#,
    )
    .unwrap();

    let output = run(&["compose", "--input"], &[input.as_path()]);
    assert!(!output.status.success(), "--out is required");

    let status = Command::new(env!("CARGO_BIN_EXE_ahp"))
        .args(["compose", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());

    let reports: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(reports.len(), 7);
    assert_eq!(reports[0]["name"], "a");
    assert_eq!(reports[0]["weights"]["target"]["z"], 0.4233);
    assert_eq!(reports[6]["name"], "c");
    assert_eq!(reports[6]["weight"], 0.5);
}

#[test]
fn cli_random_index_prints_value() {
    let output = run(&["random-index", "--scheme", "saaty", "--size", "4"], &[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0.89");

    let output = run(&["random-index", "--scheme", "saaty", "--size", "16"], &[]);
    assert!(!output.status.success());
}

#[test]
fn cli_compare_rejects_invalid_judgments() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.json");
    let out = dir.path().join("report.json");
    std::fs::write(
        &input,
        r#"{"name": "bad", "judgments": {"ratio": [["a", "b", 0]]}}"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ahp"))
        .args(["compare", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("greater than zero"));
    assert!(!out.exists());
}

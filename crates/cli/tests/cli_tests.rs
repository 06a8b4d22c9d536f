//! End-to-end tests for the `nadlan` binary: exit codes, JSON contract,
//! and human output routing (data on stdout, commentary on stderr).

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn nadlan(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nadlan"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run nadlan binary")
}

fn madlan_sale_csv() -> String {
    let mut csv = String::from("h0,h1,h2,h3,h4,h5,h6,h7,h8,h9,h10,h11\n");
    let rows = [
        ("1", "הרצל 5, תל אביב", "2 חדרים", "קומה 1", "70 מ\"ר", "1,000,000 ₪"),
        ("2", "הרצל 12, תל אביב", "3 חדרים", "קומה 2", "100 מ\"ר", "2,000,000 ₪"),
        ("3", "ביאליק 7, רמת גן", "4 חדרים", "קומה 3", "100 מ\"ר", "3,000,000 ₪"),
    ];
    for (i, (n, addr, rooms, floor, size, price)) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "https://madlan.co.il/listings/{n},https://cdn/img{n}.jpg,\"{addr}\",{rooms},{floor},sub{i},{size},{i},\"{price}\",https://madlan.co.il/developers/{n},https://cdn/dev{n}.jpg,בלעדי{i}\n"
        ));
    }
    csv
}

/// Write a data file plus a config pointing at it; returns the tempdir.
fn fixture(csv: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("listings.csv"), csv).unwrap();
    fs::write(
        dir.path().join("run.toml"),
        r#"
name = "tel-aviv-sale"
file = "listings.csv"
source = "madlan"
kind = "sale"
"#,
    )
    .unwrap();
    dir
}

#[test]
fn run_json_emits_full_report() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["run", "run.toml", "--json"], dir.path());
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["meta"]["name"], "tel-aviv-sale");
    assert_eq!(report["meta"]["metric"], "price_per_meter");
    assert_eq!(report["stats"]["listings"], 3);
    assert_eq!(report["below_average"]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(report["same_street"].as_array().unwrap().len(), 2);
}

#[test]
fn run_writes_config_driven_exports() {
    let dir = fixture(&madlan_sale_csv());
    fs::write(
        dir.path().join("run.toml"),
        r#"
name = "tel-aviv-sale"
file = "listings.csv"
source = "madlan"
kind = "sale"

[output]
csv = "clean.csv"
json = "report.json"
"#,
    )
    .unwrap();

    let out = nadlan(&["run", "run.toml"], dir.path());
    assert!(out.status.success());

    let csv = fs::read_to_string(dir.path().join("clean.csv")).unwrap();
    assert!(csv.contains("לינק"));
    assert!(csv.lines().count() >= 4); // header + 3 listings

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report["stats"]["listings"], 3);
}

#[test]
fn unrecognized_schema_exits_3() {
    let dir = fixture("h0,h1\na,b\nc,d\n");
    let out = nadlan(&["run", "run.toml"], dir.path());
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("hint:"));
}

#[test]
fn missing_data_file_exits_4() {
    let dir = fixture(&madlan_sale_csv());
    fs::remove_file(dir.path().join("listings.csv")).unwrap();
    let out = nadlan(&["run", "run.toml"], dir.path());
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn invalid_config_exits_2() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("run.toml"), "name = \"x\"\n").unwrap();
    let out = nadlan(&["validate", "run.toml"], dir.path());
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn validate_accepts_good_config() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["validate", "run.toml"], dir.path());
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("tel-aviv-sale"));
    assert!(stderr.contains("price_per_meter"));
}

#[test]
fn normalize_prints_labeled_csv_to_stdout() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["normalize", "run.toml"], dir.path());
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let header = stdout.lines().next().unwrap();
    assert!(header.contains("לינק"));
    assert!(header.contains("כתובת"));
    assert_eq!(stdout.lines().count(), 4);
}

#[test]
fn normalize_json_keys_rows_by_field_name() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["normalize", "run.toml", "--json"], dir.path());
    assert!(out.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0]["link"].as_str().unwrap().contains("madlan.co.il"));
    assert!(rows[0].get("price_per_meter").is_some());
}

#[test]
fn classify_lists_canonical_column_names() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["classify", "run.toml"], dir.path());
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("link"));
    assert!(stdout.contains("address"));
    assert_eq!(stdout.lines().count(), 12);
}

#[test]
fn cheaper_json_ranks_ascending() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["cheaper", "run.toml", "--json"], dir.path());
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let first = rows[0]["value"].as_f64().unwrap();
    let second = rows[1]["value"].as_f64().unwrap();
    assert!(first <= second);
    assert!(rows[0]["percentage"].as_str().unwrap().ends_with('%'));
}

#[test]
fn duplicates_by_street_groups_shared_streets() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["duplicates", "run.toml", "--by", "street", "--json"], dir.path());
    assert!(out.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row["street"], "הרצל , תל אביב");
    }
}

#[test]
fn duplicates_by_address_empty_when_all_distinct() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["duplicates", "run.toml", "--by", "address", "--json"], dir.path());
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(rows.as_array().unwrap().is_empty());
}

#[test]
fn stats_reports_metric_aggregates() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(&["stats", "run.toml", "--json"], dir.path());
    assert!(out.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stats["listings"], 3);
    assert_eq!(stats["price_changes"], 0);
    assert!(stats["min"].as_f64().unwrap() < stats["max"].as_f64().unwrap());
}

#[test]
fn configless_flags_run_without_a_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("listings.csv"), madlan_sale_csv()).unwrap();
    let out = nadlan(
        &[
            "stats",
            "--file",
            "listings.csv",
            "--source",
            "madlan",
            "--kind",
            "sale",
            "--json",
        ],
        dir.path(),
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stats["listings"], 3);
}

#[test]
fn config_path_conflicts_with_flags() {
    let dir = fixture(&madlan_sale_csv());
    let out = nadlan(
        &[
            "run",
            "run.toml",
            "--file",
            "listings.csv",
            "--source",
            "madlan",
            "--kind",
            "sale",
        ],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn no_arguments_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let out = nadlan(&[], dir.path());
    assert_eq!(out.status.code(), Some(2));
}

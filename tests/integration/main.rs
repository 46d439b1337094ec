//! Integration tests for Cohort
//!
//! These tests run the binary against small on-disk repositories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn create_repo(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in structure {
        let full_path = temp_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }
    temp_dir
}

fn shop_repo() -> TempDir {
    create_repo(&[
        (
            "src/main.ts",
            "import { renderCart } from './cart/view';\nimport { api } from '@/api/client';\n",
        ),
        (
            "src/cart/view.ts",
            "import { Cart } from './model';\nexport function renderCart() {}\n",
        ),
        (
            "src/cart/model.ts",
            "import { renderCart } from './view';\nexport class Cart {}\n",
        ),
        ("src/api/client.ts", "export const api = {};\n"),
        ("scripts/build.py", "from .helpers import run\n"),
        ("scripts/helpers.py", "def run():\n    pass\n"),
        ("node_modules/left-pad/index.js", "module.exports = 1;\n"),
    ])
}

fn cohort(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cohort"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cohort")
}

fn json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "cohort failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_cohort"))
        .arg("--help")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dependency-aware file clustering and batching"));
    assert!(stdout.contains("subdivide"));
}

#[test]
fn test_cycles_command() {
    let repo = shop_repo();
    let groups = json(&cohort(repo.path(), &["cycles"]));

    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        strings(&groups[0]["files"]),
        vec!["src/cart/model.ts", "src/cart/view.ts"]
    );
}

#[test]
fn test_clusters_cover_inventory() {
    let repo = shop_repo();
    let clusters = json(&cohort(repo.path(), &["clusters"]));

    let clusters = clusters.as_array().unwrap();
    assert_eq!(clusters.len(), 2);
    // Largest first
    assert_eq!(clusters[0]["files"].as_array().unwrap().len(), 4);
    assert_eq!(
        strings(&clusters[1]["files"]),
        vec!["scripts/build.py", "scripts/helpers.py"]
    );

    let all: Vec<String> = clusters.iter().flat_map(|c| strings(&c["files"])).collect();
    assert!(!all.iter().any(|f| f.contains("node_modules")));
}

#[test]
fn test_batch_respects_budget() {
    let repo = shop_repo();
    let plan = json(&cohort(repo.path(), &["batch", "--budget", "20"]));

    let batches = plan["batches"].as_array().unwrap();
    let mut covered: Vec<String> = Vec::new();
    for batch in batches {
        let files = strings(&batch["files"]);
        let total = batch["totalSize"].as_u64().unwrap();
        assert!(files.len() == 1 || total <= 20, "batch over budget: {batch}");
        covered.extend(files);
    }
    covered.sort();
    assert_eq!(covered.len(), 6);
    covered.dedup();
    assert_eq!(covered.len(), 6);
    assert_eq!(plan["stats"]["fileCount"], 6);
}

#[test]
fn test_batch_reads_settings_file() {
    let repo = shop_repo();
    fs::write(
        repo.path().join("cohort.toml"),
        "[batch]\nbudget = 100000\n\n[inventory]\nexclude = [\"scripts/**\", \"**/node_modules/**\"]\n",
    )
    .unwrap();

    let plan = json(&cohort(repo.path(), &["batch"]));
    assert_eq!(plan["stats"]["fileCount"], 4);
    assert_eq!(plan["batches"].as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_settings_fail() {
    let repo = shop_repo();
    fs::write(repo.path().join("cohort.toml"), "[batch]\nbudget = 0\n").unwrap();

    let output = cohort(repo.path(), &["batch"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("budget"));
}

#[test]
fn test_order_puts_dependencies_first() {
    let repo = create_repo(&[
        ("a.js", "import './b';\n"),
        ("b.js", "import './c';\n"),
        ("c.js", ""),
    ]);
    let ordered = json(&cohort(repo.path(), &["order"]));
    assert_eq!(strings(&ordered), vec!["c.js", "b.js", "a.js"]);

    let ordered = json(&cohort(repo.path(), &["order", "a.js", "b.js"]));
    assert_eq!(strings(&ordered), vec!["b.js", "a.js"]);
}

#[test]
fn test_subdivide_command() {
    let repo = create_repo(&[
        ("shop/cart/page.ts", "import { Cart } from './model';\n"),
        ("shop/cart/model.ts", "import { price } from '../pricing/rules';\n"),
        ("shop/pricing/rules.ts", "export const price = 1;\n"),
        ("shop/orders/page.ts", "import { price } from '../pricing/rules';\n"),
        ("shop/readme.ts", "export {};\n"),
        ("other/tool.ts", "import '../shop/cart/page';\n"),
    ]);
    let candidates = repo.path().join("candidates.json");
    fs::write(
        &candidates,
        r#"[
  {"name": "Cart", "entryFiles": ["shop/cart/page.ts"]},
  {"name": "Orders", "entryFiles": ["shop/orders/page.ts"]}
]"#,
    )
    .unwrap();

    let plan = json(&cohort(
        repo.path(),
        &[
            "subdivide",
            "--candidates",
            candidates.to_str().unwrap(),
            "--scope",
            "shop/",
        ],
    ));

    let cart = &plan["candidates"][0];
    assert_eq!(
        strings(&cart["assignedFiles"]),
        vec!["shop/pricing/rules.ts", "shop/cart/model.ts", "shop/cart/page.ts"]
    );
    let orders = &plan["candidates"][1];
    assert_eq!(strings(&orders["assignedFiles"]), vec!["shop/orders/page.ts"]);
    assert_eq!(strings(&orders["sharedDependencies"]), vec!["shop/pricing/rules.ts"]);
    assert_eq!(strings(&plan["parentFiles"]), vec!["shop/readme.ts"]);
}

#[test]
fn test_subdivide_rejects_bad_candidates() {
    let repo = shop_repo();
    let candidates = repo.path().join("candidates.json");
    fs::write(&candidates, "{\"not\": \"a list\"}").unwrap();

    let output = cohort(
        repo.path(),
        &["subdivide", "--candidates", candidates.to_str().unwrap()],
    );
    assert!(!output.status.success());
}

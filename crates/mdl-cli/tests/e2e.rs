//! End-to-end tests for the mdl-index CLI.
//!
//! Tests invoke the `mdl-index` binary as a subprocess and verify JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SHOP: &str = r#"{
    "models": [
        {"name": "orders", "primaryKey": "id", "columns": [
            {"name": "id", "type": "int"},
            {"name": "customer_id", "type": "int"},
            {"name": "customer", "type": "customers", "relationship": "orders_customers"}
        ]},
        {"name": "customers", "primaryKey": "id", "columns": [{"name": "id", "type": "int"}]}
    ],
    "relationships": [
        {"name": "orders_customers", "models": ["orders", "customers"],
         "joinType": "MANY_TO_ONE", "condition": "orders.customer_id = customers.id"}
    ],
    "views": [
        {"name": "big_orders", "statement": "select * from orders where total > 100",
         "properties": {"question": "Which orders are large?"}}
    ]
}"#;

fn mdl_index_in(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mdl-index"));
    cmd.current_dir(dir);
    cmd.env_remove("MDL_INDEX_DATASET");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn success_json(output: Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn e2e_compile_prints_ddl_documents() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);

    let docs = success_json(
        mdl_index_in(dir.path())
            .args(["compile", "mdl.json"])
            .output()
            .unwrap(),
    );
    let docs = docs.as_array().unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0]["id"], "0");
    assert_eq!(
        docs[0]["content"],
        "CREATE TABLE orders (\n  id int PRIMARY KEY,\n  customer_id int,\n  \
         FOREIGN KEY (customer_id) REFERENCES customers(id)\n);"
    );
    assert_eq!(docs[2]["id"], "2");
    assert!(docs[2]["content"]
        .as_str()
        .unwrap()
        .contains("CREATE VIEW big_orders"));
}

#[test]
fn e2e_compile_single_model() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "mdl.json",
        r#"{"models": [{"name": "customers", "primaryKey": "id", "columns": [{"name": "id", "type": "int"}]}]}"#,
    );

    let docs = success_json(
        mdl_index_in(dir.path())
            .args(["compile", "mdl.json"])
            .output()
            .unwrap(),
    );
    assert_eq!(
        docs,
        serde_json::json!([{"id": "0", "content": "CREATE TABLE customers (\n  id int PRIMARY KEY\n);"}])
    );
}

#[test]
fn e2e_views_prints_question_records() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);

    let docs = success_json(
        mdl_index_in(dir.path())
            .args(["views", "mdl.json"])
            .output()
            .unwrap(),
    );
    let record: serde_json::Value =
        serde_json::from_str(docs[0]["content"].as_str().unwrap()).unwrap();
    assert_eq!(record["question"], "Which orders are large?");
    assert_eq!(record["description"], "");
    assert_eq!(record["statement"], "select * from orders where total > 100");
}

#[test]
fn e2e_index_then_count() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);

    let report = success_json(
        mdl_index_in(dir.path())
            .args(["index", "mdl.json"])
            .output()
            .unwrap(),
    );
    assert_eq!(report["ddl_documents"], 3);
    assert_eq!(report["view_documents"], 1);
    assert_eq!(report["sync_mode"], "clear_then_write");
    assert!(dir.path().join(".mdl").join("index.db").exists());

    // A second run replaces rather than accumulates.
    success_json(
        mdl_index_in(dir.path())
            .args(["index", "mdl.json"])
            .output()
            .unwrap(),
    );

    let counts = success_json(mdl_index_in(dir.path()).arg("count").output().unwrap());
    assert_eq!(counts["ddl_collection"], "Document");
    assert_eq!(counts["ddl_documents"], 3);
    assert_eq!(counts["view_collection"], "view_questions");
    assert_eq!(counts["view_documents"], 1);
}

#[test]
fn e2e_index_honours_config_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);
    write(
        dir.path(),
        "custom.toml",
        "[store]\npath = \"data/custom.db\"\nddl_collection = \"schema\"\n\n[sync]\nmode = \"staged\"\n",
    );

    let report = success_json(
        mdl_index_in(dir.path())
            .args(["index", "mdl.json", "--config", "custom.toml"])
            .output()
            .unwrap(),
    );
    assert_eq!(report["sync_mode"], "staged");
    assert!(dir.path().join("data").join("custom.db").exists());

    let counts = success_json(
        mdl_index_in(dir.path())
            .args(["count", "--config", "custom.toml"])
            .output()
            .unwrap(),
    );
    assert_eq!(counts["ddl_collection"], "schema");
    assert_eq!(counts["ddl_documents"], 3);
}

#[test]
fn e2e_dataset_env_overrides_collection() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);

    success_json(
        mdl_index_in(dir.path())
            .env("MDL_INDEX_DATASET", "tenant_a")
            .args(["index", "mdl.json"])
            .output()
            .unwrap(),
    );
    let counts = success_json(
        mdl_index_in(dir.path())
            .env("MDL_INDEX_DATASET", "tenant_a")
            .arg("count")
            .output()
            .unwrap(),
    );
    assert_eq!(counts["ddl_collection"], "tenant_a");
    assert_eq!(counts["ddl_documents"], 3);
}

#[test]
fn e2e_dataset_env_cannot_reuse_the_view_collection() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);

    let output = mdl_index_in(dir.path())
        .env("MDL_INDEX_DATASET", "view_questions")
        .args(["index", "mdl.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config error"));
    assert!(!dir.path().join(".mdl").join("index.db").exists());
}

#[test]
fn e2e_malformed_input_fails_without_touching_the_index() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);
    write(dir.path(), "broken.json", "{\"models\": [");

    success_json(
        mdl_index_in(dir.path())
            .args(["index", "mdl.json"])
            .output()
            .unwrap(),
    );

    let output = mdl_index_in(dir.path())
        .args(["index", "broken.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed input"));

    let counts = success_json(mdl_index_in(dir.path()).arg("count").output().unwrap());
    assert_eq!(counts["ddl_documents"], 3);
}

#[test]
fn e2e_dangling_relationship_fails() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "mdl.json",
        r#"{
            "models": [{"name": "orders", "columns": [{"name": "ghost_id", "type": "int"}]}],
            "relationships": [{"name": "orders_ghosts", "models": ["orders", "ghosts"],
                               "joinType": "MANY_TO_ONE", "condition": "orders.ghost_id = ghosts.id"}]
        }"#,
    );

    let output = mdl_index_in(dir.path())
        .args(["compile", "mdl.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("orders_ghosts"));
    assert!(stderr.contains("ghosts"));
}

#[test]
fn e2e_describe_applies_recorded_reply() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mdl.json", SHOP);
    write(
        dir.path(),
        "reply.json",
        r#"{"models": [{"name": "orders",
            "columns": [{"name": "id", "properties": {"description": "Order number"}}],
            "properties": {"description": "Purchases"}}]}"#,
    );

    let mdl = success_json(
        mdl_index_in(dir.path())
            .args([
                "describe",
                "mdl.json",
                "--models",
                "orders,customers",
                "--reply",
                "reply.json",
                "--prompt",
                "an online shop",
            ])
            .output()
            .unwrap(),
    );
    assert_eq!(mdl["models"][0]["properties"]["description"], "Purchases");
    assert_eq!(
        mdl["models"][0]["columns"][0]["properties"]["description"],
        "Order number"
    );
    assert!(mdl["models"][1].get("properties").is_none());
    assert_eq!(mdl["relationships"][0]["joinType"], "MANY_TO_ONE");
}

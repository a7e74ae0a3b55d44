use norns_edit::tooling::cli::{CliContext, Commands};
use std::fs;
use tempfile::TempDir;

fn dust_workspace() -> (TempDir, CliContext) {
    let temp_dir = TempDir::new().unwrap();
    let dust = temp_dir.path().join("dust");
    fs::create_dir_all(dust.join("code/awake/lib")).unwrap();
    fs::create_dir_all(dust.join("data/awake")).unwrap();
    fs::write(dust.join("code/awake/awake.lua"), "-- awake").unwrap();
    fs::write(dust.join("code/awake/lib/notes.lua"), "return {}").unwrap();
    fs::write(dust.join("data/awake/pset-01.pset"), "bpm: 98").unwrap();
    fs::write(
        temp_dir.path().join("norns-edit.toml"),
        "[host]\nroot = \"dust\"\n\n[explorer]\npreload = [\"scripts\", \"data\"]\n",
    )
    .unwrap();
    let cli = CliContext::new(temp_dir.path().to_path_buf(), None, None).unwrap();
    (temp_dir, cli)
}

#[test]
fn list_json_contract_has_annotation_fields() {
    let (_temp_dir, cli) = dust_workspace();
    let output = cli
        .execute(&Commands::List {
            category: None,
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let roots = parsed.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["category"], "scripts");
    assert_eq!(roots[1]["category"], "data");

    let awake = &roots[0]["nodes"][0];
    assert_eq!(awake["key"], "/scripts/awake");
    assert!(awake.get("children").and_then(|v| v.as_array()).is_some());
    let script = &awake["children"][0];
    for field in ["active", "toggled", "loaded", "modified"] {
        assert!(script.get(field).and_then(|v| v.as_bool()).is_some(), "{}", field);
    }
    assert!(script.get("children").is_none());
}

#[test]
fn new_dup_rm_round_out_the_directory() {
    let (temp_dir, cli) = dust_workspace();
    let code = temp_dir.path().join("dust/code/awake");

    let created = cli
        .execute(&Commands::New {
            sibling: "/scripts/awake/awake.lua".to_string(),
            from: None,
        })
        .unwrap();
    assert_eq!(created, "Created /scripts/awake/untitled.lua");
    assert!(code.join("untitled.lua").exists());

    let duplicated = cli
        .execute(&Commands::Dup {
            key: "/scripts/awake/awake.lua".to_string(),
        })
        .unwrap();
    assert!(duplicated.ends_with("/scripts/awake/awake-copy.lua"));
    assert_eq!(
        fs::read_to_string(code.join("awake-copy.lua")).unwrap(),
        "-- awake"
    );

    cli.execute(&Commands::Rm {
        key: "/scripts/awake/lib".to_string(),
    })
    .unwrap();
    assert!(!code.join("lib").exists());
}

#[test]
fn run_prints_acknowledgement() {
    let (_temp_dir, cli) = dust_workspace();
    let output = cli
        .execute(&Commands::Run {
            key: "/scripts/awake/awake.lua".to_string(),
        })
        .unwrap();
    assert_eq!(output, "Sent run request for /scripts/awake/awake.lua");
}

#[test]
fn catalog_json_and_text() {
    let (temp_dir, cli) = dust_workspace();
    let path = temp_dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"{"file_info":{"version":1,"kind":"script_catalog"},"entries":{"awake":{"origin":"lines","project_name":"awake","author":"tehn","url":"https://github.com/tehn/awake"}}}"#,
    )
    .unwrap();

    let json = cli
        .execute(&Commands::Catalog {
            file: path.clone(),
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["file_info"]["kind"], "script_catalog");
    assert_eq!(parsed["entries"]["awake"]["author"], "tehn");

    let text = cli
        .execute(&Commands::Catalog {
            file: path,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(text.contains("awake"));

    let missing = cli.execute(&Commands::Catalog {
        file: temp_dir.path().join("nope.json"),
        format: "text".to_string(),
    });
    assert!(missing.is_err());
}

#[test]
fn unknown_category_is_an_error() {
    let (_temp_dir, cli) = dust_workspace();
    let err = cli
        .execute(&Commands::List {
            category: Some("tape".to_string()),
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("tape"));
}

//! Tests for loading contract descriptors from artifact files

use std::fs;
use std::path::Path;

use serde_json::json;

use contract_mapper::{select, ArtifactLoader, MapperError};

fn write_json(path: &Path, value: &serde_json::Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn token_artifact() -> serde_json::Value {
    json!({
        "contractName": "Token",
        "abi": [
            {"type": "function", "name": "name", "inputs": [], "outputs": [{"name": "", "type": "string"}], "stateMutability": "view"},
            {"type": "function", "name": "transfer", "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}], "outputs": [{"name": "", "type": "bool"}], "stateMutability": "nonpayable"}
        ],
        "bytecode": "0x"
    })
}

#[test]
fn test_load_directory_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_json(&dir.path().join("build/contracts/Token.json"), &token_artifact());
    write_json(
        &dir.path().join("build/contracts/Vault.json"),
        &json!([
            {"type": "function", "name": "owner", "inputs": [], "outputs": [{"name": "", "type": "address"}], "constant": true}
        ]),
    );
    // no ABI, silently skipped
    write_json(&dir.path().join("build/contracts/meta.json"), &json!({"version": 1}));
    // ignored directory
    write_json(&dir.path().join("build/contracts/node_modules/Dep.json"), &token_artifact());

    let contracts = ArtifactLoader::load(dir.path(), &["build/contracts".to_string()]).unwrap();

    assert_eq!(contracts.names(), vec!["Token", "Vault"]);
    let token = contracts.get("Token").unwrap();
    let accessors: Vec<&str> = select(token).iter().map(|e| e.name.as_str()).collect();
    assert_eq!(accessors, vec!["name"]);
    assert_eq!(select(contracts.get("Vault").unwrap()).len(), 1);
}

#[test]
fn test_load_wildcard_and_single_file() {
    let dir = tempfile::tempdir().unwrap();
    write_json(&dir.path().join("out/Token.json"), &token_artifact());
    write_json(
        &dir.path().join("out/Staking.json"),
        &json!({"abi": [{"type": "function", "name": "rate", "inputs": [], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"}]}),
    );

    let wildcard = ArtifactLoader::load(dir.path(), &["out/Stak*.json".to_string()]).unwrap();
    assert_eq!(wildcard.names(), vec!["Staking"]);

    let single = ArtifactLoader::load(dir.path(), &["out/Token.json".to_string()]).unwrap();
    assert_eq!(single.names(), vec!["Token"]);
}

#[test]
fn test_invalid_artifact_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_json(&dir.path().join("abi/Token.json"), &token_artifact());
    fs::write(dir.path().join("abi/Broken.json"), "{ not json").unwrap();
    write_json(&dir.path().join("abi/BadAbi.json"), &json!({"abi": [{"type": "function", "name": 5}]}));

    let contracts = ArtifactLoader::load(dir.path(), &["abi".to_string()]).unwrap();
    assert_eq!(contracts.names(), vec!["Token"]);
}

#[test]
fn test_load_recursive_and_directory_globs() {
    let dir = tempfile::tempdir().unwrap();
    write_json(&dir.path().join("build/a/Token.json"), &token_artifact());
    write_json(
        &dir.path().join("build/b/nested/Vault.json"),
        &json!([
            {"type": "function", "name": "owner", "inputs": [], "outputs": [{"name": "", "type": "address"}], "stateMutability": "view"}
        ]),
    );
    write_json(&dir.path().join("build/node_modules/Dep.json"), &json!({"contractName": "Dep", "abi": []}));

    let recursive = ArtifactLoader::load(dir.path(), &["build/**/*.json".to_string()]).unwrap();
    assert_eq!(recursive.names(), vec!["Token", "Vault"]);

    let segment = ArtifactLoader::load(dir.path(), &["build/*/Token.json".to_string()]).unwrap();
    assert_eq!(segment.names(), vec!["Token"]);
}

#[test]
fn test_unmatched_pattern_is_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();

    let missing = ArtifactLoader::load(dir.path(), &["missing.json".to_string()]);
    assert!(matches!(missing, Err(MapperError::Io { .. })));

    let no_match = ArtifactLoader::load(dir.path(), &["nowhere/*.json".to_string()]);
    assert!(matches!(no_match, Err(MapperError::Load(_))));

    let empty = ArtifactLoader::load(dir.path(), &["empty".to_string()]);
    assert!(matches!(empty, Err(MapperError::Load(_))));
}

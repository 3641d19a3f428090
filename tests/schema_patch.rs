//! Integration tests for the country facet schema patch.

use std::fs;
use std::path::Path;

use dfid_transition::patch::{CountryRegister, PatchError, SchemaPatch, load_register};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn schema_with_facets() -> Value {
    json!({
        "base_path": "/dfid-research-outputs",
        "document_type": "dfid_research_output",
        "facets": [
            {"key": "dfid_document_type", "name": "Document type", "type": "text"},
            {"key": "country", "name": "Country", "type": "text", "allowed_values": []}
        ]
    })
}

fn register() -> CountryRegister {
    serde_json::from_value(json!({
        "VE": {"country": "VE", "name": "Venezuela", "start-date": "1811-07-05"},
        "GB": {"country": "GB", "name": "United Kingdom"},
        "AF": {"country": "AF", "name": "Afghanistan"},
        "CZ": {"country": "CZ", "name": "Czechia"},
        "CS": {"country": "CS", "name": "Czechoslovakia", "end-date": "1992-12-31"},
        "DD": {"country": "DD", "name": "East Germany", "end-date": "1990-10-02"}
    }))
    .unwrap()
}

fn country_facet(schema: &Value) -> &Value {
    schema["facets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|facet| facet["key"] == "country")
        .unwrap()
}

#[test]
fn test_run_patches_all_extant_countries() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("dfid_research_outputs.json");
    write_json(&location, &schema_with_facets());

    let patch = SchemaPatch::new(Some(location.clone())).unwrap();
    let count = patch.run(&register()).unwrap();
    assert_eq!(count, 4);

    let patched: Value = serde_json::from_str(&fs::read_to_string(&location).unwrap()).unwrap();
    let allowed = country_facet(&patched)["allowed_values"].as_array().unwrap();
    assert_eq!(allowed.len(), 4);
    assert!(allowed.contains(&json!({"label": "Venezuela", "value": "VE"})));
    assert!(!allowed.iter().any(|value| value["value"] == "CS"));
}

#[test]
fn test_run_sorts_countries_alphabetically_by_label() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("schema.json");
    write_json(&location, &schema_with_facets());

    SchemaPatch::new(Some(location.clone()))
        .unwrap()
        .run(&register())
        .unwrap();

    let patched: Value = serde_json::from_str(&fs::read_to_string(&location).unwrap()).unwrap();
    let labels: Vec<&str> = country_facet(&patched)["allowed_values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|value| value["label"].as_str().unwrap())
        .collect();
    let mut sorted = labels.clone();
    sorted.sort_unstable();
    assert_eq!(labels, sorted, "country labels are not sorted");
    assert_eq!(labels.first(), Some(&"Afghanistan"));
}

#[test]
fn test_run_keeps_other_facets_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("schema.json");
    write_json(&location, &schema_with_facets());

    SchemaPatch::new(Some(location.clone()))
        .unwrap()
        .run(&register())
        .unwrap();

    let patched: Value = serde_json::from_str(&fs::read_to_string(&location).unwrap()).unwrap();
    assert_eq!(patched["facets"][0], schema_with_facets()["facets"][0]);
    assert_eq!(patched["document_type"], "dfid_research_output");
}

#[test]
fn test_run_without_country_facet_fails_informatively() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("no_facets.json");
    let original = json!({"base_path": "/dfid-research-outputs", "facets": []});
    write_json(&location, &original);

    let err = SchemaPatch::new(Some(location.clone()))
        .unwrap()
        .run(&register())
        .unwrap_err();
    assert!(matches!(err, PatchError::MissingFacet { .. }));
    assert!(err.to_string().contains("No country facet found"));

    let untouched: Value = serde_json::from_str(&fs::read_to_string(&location).unwrap()).unwrap();
    assert_eq!(untouched, original);
}

#[test]
fn test_run_warns_when_schema_is_missing() {
    let temp_dir = TempDir::new().unwrap();
    let location = temp_dir.path().join("absent.json");

    let patch = SchemaPatch::new(Some(location.clone())).unwrap();
    assert_eq!(patch.location(), location);
    let err = patch.run(&register()).unwrap_err();
    assert!(matches!(err, PatchError::SchemaNotFound { .. }));
}

#[test]
fn test_default_location_is_next_to_working_directory() {
    let patch = SchemaPatch::new(None).unwrap();
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(
        patch.location(),
        cwd.parent()
            .unwrap()
            .join("specialist-publisher-rebuild/lib/documents/schemas/dfid_research_outputs.json")
    );
}

#[test]
fn test_load_register_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("countries.json");
    write_json(
        &path,
        &json!({"AZ": {"country": "AZ", "name": "Azerbaijan", "citizen-names": "Azerbaijani"}}),
    );

    let register = load_register(&path).unwrap();
    assert_eq!(register["AZ"].name, "Azerbaijan");
    assert!(register["AZ"].end_date.is_none());
}

#[test]
fn test_load_register_rejects_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("countries.json");
    fs::write(&path, "not json").unwrap();

    let err = load_register(&path).unwrap_err();
    assert!(matches!(err, PatchError::Json { .. }));
}

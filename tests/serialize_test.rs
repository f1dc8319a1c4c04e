//! Integration tests for the JSON and YAML exports.

mod common;

use pdf_atomizer::render::{self, slugify, JsonFormat, SlugCollision, YamlOptions};
use pdf_atomizer::explode_bytes;
use pretty_assertions::assert_eq;
use serde_yaml::Mapping;

use common::{offer_pdf, INIT_SCRIPT};

#[test]
fn test_json_dump_of_offer() {
    let atoms = explode_bytes(&offer_pdf()).unwrap();
    let json = render::to_json(&atoms, JsonFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let pages = value["pages"].as_object().unwrap();
    assert_eq!(pages.keys().cloned().collect::<Vec<_>>(), vec!["0", "1", "2"]);

    let span = &value["pages"]["0"]["text"][0];
    assert_eq!(span["text"], "Max Mustermann!");
    assert_eq!(span["x"], 72.0);
    assert_eq!(span["y"], 709.6);

    assert_eq!(value["js"]["init"], INIT_SCRIPT);
    assert_eq!(value["catalog"]["Type"], "/Catalog");
    assert!(value["trailer"]["Root"].as_str().unwrap().ends_with(" 0 R"));
    assert_eq!(value["pages"]["1"]["images"][0]["sha"].as_str().unwrap().len(), 64);
}

#[test]
fn test_json_is_stable_across_runs() {
    let data = offer_pdf();
    let first = explode_bytes(&data).unwrap().without_volatile();
    let second = explode_bytes(&data).unwrap().without_volatile();

    assert_eq!(
        render::to_json(&first, JsonFormat::Compact).unwrap(),
        render::to_json(&second, JsonFormat::Compact).unwrap()
    );
}

#[test]
fn test_yaml_coordinate_map() {
    let atoms = explode_bytes(&offer_pdf()).unwrap();
    let yaml = render::to_yaml(&atoms, &YamlOptions::default()).unwrap();
    let parsed: Mapping = serde_yaml::from_str(&yaml).unwrap();

    let keys: Vec<&str> = parsed.keys().filter_map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["01", "02", "03"]);

    let first = parsed["01"].as_mapping().unwrap();
    let point = first["max_mustermann"].as_sequence().unwrap();
    assert_eq!(point[0].as_f64(), Some(72.0));
    assert_eq!(point[1].as_f64(), Some(709.6));

    assert!(parsed["02"].as_mapping().unwrap().contains_key("total_1_234_00_eur"));
}

#[test]
fn test_slug_is_deterministic() {
    assert_eq!(slugify("Max Mustermann!").unwrap(), "max_mustermann");
    assert_eq!(slugify("Max Mustermann!").unwrap(), slugify("max   mustermann").unwrap());
}

#[test]
fn test_yaml_collision_policies() {
    let mut atoms = explode_bytes(&offer_pdf()).unwrap();
    let page = atoms.pages.get_mut(&0).unwrap();
    let mut duplicate = page.text[0].clone();
    duplicate.y = 650.0;
    page.text.push(duplicate);

    let suffixed = render::to_yaml_mapping(&atoms, &YamlOptions::default()).unwrap();
    let first = suffixed["01"].as_mapping().unwrap();
    assert_eq!(first["max_mustermann"][1].as_f64(), Some(709.6));
    assert_eq!(first["max_mustermann_2"][1].as_f64(), Some(650.0));

    let options = YamlOptions::new().with_collision(SlugCollision::Overwrite);
    let overwritten = render::to_yaml_mapping(&atoms, &options).unwrap();
    let first = overwritten["01"].as_mapping().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first["max_mustermann"][1].as_f64(), Some(650.0));
}

#[test]
fn test_write_exports() {
    let dir = tempfile::tempdir().unwrap();
    let atoms = explode_bytes(&offer_pdf()).unwrap();
    let json_path = dir.path().join("offer.json");
    let yaml_path = dir.path().join("offer.yaml");

    render::write_json(&atoms, &json_path, JsonFormat::Compact).unwrap();
    render::write_yaml(&atoms, &yaml_path, &YamlOptions::default()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["header"]["version"], "1.7");
    assert!(std::fs::read_to_string(&yaml_path).unwrap().contains("max_mustermann"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.


use compass::config::QueryConfig;
use compass::error::{CompassError, ConfigError};
use compass::{Recommender, Schema, TableSchema};
use std::fs;
use tempfile::TempDir;

const SCHEMA_JSON: &str = r#"{
    "fields": [
        {"field": "price", "type": "quantitative", "primitiveType": "number", "stats": {"distinct": 120}},
        {"field": "region", "type": "nominal", "primitiveType": "string", "stats": {"distinct": 4}}
    ]
}"#;
const SCHEMA_YAML: &str = "- field: day\n  type: temporal\n  primitiveType: date\n  stats:\n    distinct: 365\n- field: size\n  type: ordinal\n  primitiveType: string\n  stats:\n    distinct: 3\n";
#[test]
fn test_schema_from_json_and_yaml_files() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let json_path = dir.path().join("schema.json");
    fs::write(&json_path, SCHEMA_JSON)?;
    let schema = TableSchema::from_file(&json_path)?;
    assert_eq!(schema.field_names(), vec!["price".to_string(), "region".to_string()]);
    assert_eq!(schema.field_index("region"), Some(1));
    let yaml_path = dir.path().join("schema.yml");
    fs::write(&yaml_path, SCHEMA_YAML)?;
    let schema = TableSchema::from_file(&yaml_path)?;
    assert_eq!(schema.fields().len(), 2);
    assert_eq!(schema.field_type("day"), Some(compass::FieldType::Temporal));
    Ok(())
}
#[test]
fn test_schema_file_errors() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    assert!(TableSchema::from_file(dir.path().join("missing.json")).is_err());
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"fields\": [")?;
    assert!(TableSchema::from_file(&broken).is_err());
    let empty = dir.path().join("empty.json");
    fs::write(&empty, "[]")?;
    assert!(TableSchema::from_file(&empty).is_err(), "a schema needs at least one field");
    Ok(())
}
#[test]
fn test_partial_config_file_takes_defaults() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.yaml");
    fs::write(&path, "autoAddCount: true\nmaxResults: 5\n")?;
    let config = QueryConfig::from_file(&path)?;
    assert!(config.auto_add_count);
    assert_eq!(config.max_results, Some(5));
    assert_eq!(config.marks, QueryConfig::default().marks);
    let json = dir.path().join("config.json");
    fs::write(&json, r#"{"omitRaw": true, "minCardinalityForBin": 30}"#)?;
    let config = QueryConfig::from_file(&json)?;
    assert!(config.omit_raw);
    assert_eq!(config.min_cardinality_for_bin, 30);
    Ok(())
}
#[test]
fn test_config_file_is_validated() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.yaml");
    fs::write(&path, "marks: []\n")?;
    assert!(QueryConfig::from_file(&path).is_err());
    let toml = dir.path().join("config.toml");
    fs::write(&toml, "marks = []\n")?;
    let err = QueryConfig::from_file(&toml).expect_err("unsupported extension");
    assert!(matches!(err, CompassError::Config(ConfigError::UnsupportedFormat { .. })), "got {err}");
    Ok(())
}
#[test]
fn test_recommender_from_files() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let schema_path = dir.path().join("schema.json");
    fs::write(&schema_path, SCHEMA_JSON)?;
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{"maxResults": 3}"#)?;
    let recommender = Recommender::from_files(&schema_path, Some(config_path.as_path()))?;
    assert_eq!(recommender.config().max_results, Some(3));
    let result = recommender.recommend_shorthand("?|?:region,n|?:price,q", &[])?;
    let models = result.result.models();
    assert!(!models.is_empty());
    assert!(models.len() <= 3);
    Ok(())
}

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

//! Field statistics consumed by constraints and rankings.
//!
//! Profiling a dataset is someone else's job; this module only stores the
//! results and answers cardinality questions about encodings.

use crate::error::{SchemaError, SchemaResult};
use crate::query::FieldQuery;
use crate::vocabulary::{FieldType, PrimitiveType, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_MAX_BINS: u32 = 10;
/// Read-only view of the dataset a query runs against.
pub trait Schema: Send + Sync {
    /// Field names in schema order.
    fn field_names(&self) -> Vec<String>;
    fn field_index(&self, field: &str) -> Option<usize>;
    fn field_type(&self, field: &str) -> Option<FieldType>;
    fn primitive_type(&self, field: &str) -> Option<PrimitiveType>;
    /// Distinct values the encoded field takes after its bin or time unit is applied.
    fn cardinality(&self, query: &FieldQuery) -> SchemaResult<u64>;
}
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldStats {
    pub distinct: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub primitive_type: PrimitiveType,
    pub stats: FieldStats,
    /// Keyed by maxbins.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bin_stats: BTreeMap<u32, FieldStats>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub time_stats: BTreeMap<TimeUnit, FieldStats>,
}
impl FieldSchema {
    pub fn new(field: impl Into<String>, field_type: FieldType, primitive_type: PrimitiveType, distinct: u64) -> Self {
        Self {
            field: field.into(),
            field_type,
            primitive_type,
            stats: FieldStats {
                distinct,
                min: None,
                max: None,
            },
            bin_stats: BTreeMap::new(),
            time_stats: BTreeMap::new(),
        }
    }
    pub fn with_bin_stats(mut self, maxbins: u32, distinct: u64) -> Self {
        self.bin_stats.insert(
            maxbins,
            FieldStats {
                distinct,
                ..FieldStats::default()
            },
        );
        self
    }
    pub fn with_time_stats(mut self, unit: TimeUnit, distinct: u64) -> Self {
        self.time_stats.insert(
            unit,
            FieldStats {
                distinct,
                ..FieldStats::default()
            },
        );
        self
    }
}
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Wrapped { fields: Vec<FieldSchema> },
    Bare(Vec<FieldSchema>),
}
/// In-memory schema backed by per-field statistics.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    fields: Vec<FieldSchema>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}
impl TableSchema {
    pub fn new(fields: Vec<FieldSchema>) -> SchemaResult<Self> {
        if fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.field.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    name: field.field.clone(),
                });
            }
        }
        debug!(field_count = fields.len(), "schema built");
        Ok(Self { fields, index })
    }
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }
    /// Accepts `{"fields": [..]}` or a bare field list.
    pub fn from_json_str(raw: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_json::from_str(raw).map_err(|e| SchemaError::ParseError {
            reason: e.to_string(),
        })?;
        Self::from_document(document)
    }
    pub fn from_yaml_str(raw: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_yaml::from_str(raw).map_err(|e| SchemaError::ParseError {
            reason: e.to_string(),
        })?;
        Self::from_document(document)
    }
    pub fn from_json_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        Self::from_json_str(&read_schema_file(path.as_ref())?)
    }
    pub fn from_yaml_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        Self::from_yaml_str(&read_schema_file(path.as_ref())?)
    }
    /// Picks the parser from the file extension; anything but yaml/yml is read as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_json_file(path),
        }
    }
    fn from_document(document: SchemaDocument) -> SchemaResult<Self> {
        match document {
            SchemaDocument::Wrapped { fields } | SchemaDocument::Bare(fields) => Self::new(fields),
        }
    }
    fn require(&self, name: &str) -> SchemaResult<&FieldSchema> {
        self.field(name).ok_or_else(|| SchemaError::FieldNotFound {
            field: name.to_string(),
        })
    }
}
fn read_schema_file(path: &Path) -> SchemaResult<String> {
    std::fs::read_to_string(path).map_err(|source| SchemaError::SchemaFileError {
        path: path.display().to_string(),
        source,
    })
}
impl Schema for TableSchema {
    fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.field.clone()).collect()
    }
    fn field_index(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }
    fn field_type(&self, field: &str) -> Option<FieldType> {
        self.field(field).map(|f| f.field_type)
    }
    fn primitive_type(&self, field: &str) -> Option<PrimitiveType> {
        self.field(field).map(|f| f.primitive_type)
    }
    fn cardinality(&self, query: &FieldQuery) -> SchemaResult<u64> {
        let Some(name) = query.field.value() else {
            return Err(SchemaError::ParseError {
                reason: "cardinality of an unresolved field".to_string(),
            });
        };
        if name == "*" {
            return Ok(1);
        }
        let field = self.require(name)?;
        if query.is_binned() {
            let maxbins = query
                .bin
                .as_ref()
                .and_then(|b| b.inner())
                .and_then(|b| b.maxbins.as_ref())
                .and_then(|m| m.value().copied())
                .unwrap_or(DEFAULT_MAX_BINS);
            return Ok(match field.bin_stats.get(&maxbins) {
                Some(stats) => stats.distinct,
                None => field.stats.distinct.min(u64::from(maxbins)),
            });
        }
        if let Some(unit) = query.concrete_time_unit() {
            if let Some(stats) = field.time_stats.get(&unit) {
                return Ok(stats.distinct);
            }
            if let Some(fixed) = unit.fixed_cardinality() {
                return Ok(u64::from(fixed));
            }
        }
        Ok(field.stats.distinct)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::BinQuery;
    use crate::vocabulary::Channel;
    use crate::wildcard::{Nested, Spec};
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            FieldSchema::new("q", FieldType::Quantitative, PrimitiveType::Number, 100).with_bin_stats(5, 4),
            FieldSchema::new("t", FieldType::Temporal, PrimitiveType::Date, 400),
        ])
        .expect("schema")
    }
    #[test]
    fn test_duplicate_fields_rejected() {
        let err = TableSchema::new(vec![
            FieldSchema::new("a", FieldType::Nominal, PrimitiveType::String, 3),
            FieldSchema::new("a", FieldType::Nominal, PrimitiveType::String, 3),
        ])
        .expect_err("duplicate");
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
        assert!(matches!(TableSchema::new(vec![]), Err(SchemaError::EmptySchema)));
    }
    #[test]
    fn test_cardinality_respects_bin_and_time_unit() {
        let schema = schema();
        let raw = FieldQuery::new(Channel::X, "q", FieldType::Quantitative);
        assert_eq!(schema.cardinality(&raw).expect("raw"), 100);
        let binned = raw.clone().with_bin(Nested::Enabled(BinQuery {
            maxbins: Some(Spec::Value(5)),
            ..BinQuery::default()
        }));
        assert_eq!(schema.cardinality(&binned).expect("binned"), 4);
        let default_bins = raw.with_bin(Nested::enabled());
        assert_eq!(schema.cardinality(&default_bins).expect("default bins"), 10);
        let month = FieldQuery::new(Channel::X, "t", FieldType::Temporal).with_time_unit(TimeUnit::Month);
        assert_eq!(schema.cardinality(&month).expect("month"), 12);
        let missing = FieldQuery::new(Channel::X, "nope", FieldType::Nominal);
        assert!(matches!(
            schema.cardinality(&missing),
            Err(SchemaError::FieldNotFound { .. })
        ));
    }
}

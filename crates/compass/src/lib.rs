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

//! Chart recommendation by constraint-pruned enumeration.
//!
//! A [`SpecQuery`] names a mark and encodings in which any property may be
//! left open as a wildcard. [`generate`] expands the wildcards one property at
//! a time and prunes with the design rules in [`constraint`], [`ranking`]
//! scores the survivors and [`nest`] groups them into a [`ResultTree`].

pub mod config;
pub mod constraint;
pub mod enumerator;
pub mod error;
pub mod generate;
pub mod logging;
pub mod model;
pub mod nest;
pub mod property;
pub mod query;
pub mod ranking;
pub mod recommend;
pub mod schema;
pub mod stylize;
pub mod vocabulary;
pub mod wildcard;

pub use config::QueryConfig;
pub use error::{CompassError, ErrorReporter, Result};
pub use generate::generate;
pub use model::SpecQueryModel;
pub use nest::{get_top, nest, GroupBy, Nest, ResultItem, ResultTree};
pub use property::Property;
pub use query::{shorthand, ChartSpec, EncodingQuery, FieldQuery, SpecQuery};
pub use ranking::{FeatureScore, RankingScore};
pub use recommend::{recommend, Query, RecommendResult};
pub use schema::{FieldSchema, Schema, TableSchema};
pub use vocabulary::{AggregateOp, Channel, FieldType, Mark, ScaleType, TimeUnit};
pub use wildcard::{Nested, Spec, Wildcard};

use std::path::Path;
use tracing::info;

/// A schema and configuration bound together for repeated queries.
pub struct Recommender {
    schema: TableSchema,
    config: QueryConfig,
}
impl Recommender {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            config: QueryConfig::default(),
        }
    }
    pub fn with_config(schema: TableSchema, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { schema, config })
    }
    pub fn from_files(schema_path: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self> {
        let schema = TableSchema::from_file(schema_path)?;
        let config = match config_path {
            Some(path) => QueryConfig::from_file(path)?,
            None => QueryConfig::default(),
        };
        info!(fields = schema.fields().len(), "recommender ready");
        Self::with_config(schema, config)
    }
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }
    /// Runs `query`, falling back to this recommender's configuration when the query has none.
    pub fn recommend(&self, query: &Query) -> Result<RecommendResult> {
        if query.config.is_some() {
            return recommend(query, &self.schema);
        }
        let query = query.clone().with_config(self.config.clone());
        recommend(&query, &self.schema)
    }
    pub fn recommend_shorthand(&self, shorthand: &str, group_by: &[GroupBy]) -> Result<RecommendResult> {
        let spec = query::shorthand::parse(shorthand)?;
        let mut query = Query::new(spec);
        query.nest = group_by.iter().cloned().map(Nest::new).collect();
        self.recommend(&query)
    }
    pub fn generate(&self, spec: &SpecQuery) -> Result<Vec<SpecQueryModel>> {
        generate(spec, &self.schema, &self.config)
    }
}

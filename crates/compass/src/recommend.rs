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

use crate::config::QueryConfig;
use crate::config_error;
use crate::error::{CompassError, Result};
use crate::generate::generate;
use crate::logging::log_performance_metric;
use crate::model::SpecQueryModel;
use crate::nest::{nest, GroupBy, Nest, ResultItem, ResultTree};
use crate::query::SpecQuery;
use crate::ranking::{self, OVERALL};
use crate::schema::Schema;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// A spec query plus instructions for ranking and grouping its candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub spec: SpecQuery,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nest: Vec<Nest>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choose_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<QueryConfig>,
}
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}
impl Query {
    pub fn new(spec: SpecQuery) -> Self {
        Self {
            spec,
            nest: Vec::new(),
            order_by: Vec::new(),
            choose_by: None,
            config: None,
        }
    }
    pub fn with_nest(mut self, group_by: GroupBy) -> Self {
        self.nest.push(Nest::new(group_by));
        self
    }
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = Some(config);
        self
    }
    /// Reads either a full query or a bare spec query from JSON or YAML.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_yaml::from_str(raw)?;
        if value.get("spec").is_some() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(Query::new(serde_json::from_value(value)?))
        }
    }
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Query::parse(&raw)
    }
    /// Rankings that order candidates, `overall` when none are named.
    pub fn order_by(&self) -> Vec<String> {
        if self.order_by.is_empty() {
            vec![OVERALL.to_string()]
        } else {
            self.order_by.clone()
        }
    }
    fn ranking_names(&self) -> Vec<String> {
        let mut names = self.order_by();
        let extra = self
            .choose_by
            .iter()
            .chain(self.nest.iter().filter_map(|n| n.order_group_by.as_ref()));
        for name in extra {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
    fn validate_nest(&self) -> Result<()> {
        for level in &self.nest {
            if level.group_by.parse().is_none() {
                return Err(CompassError::Config(config_error!(
                    "nest",
                    "has unknown groupBy {:?}",
                    level.group_by
                )));
            }
        }
        Ok(())
    }
}
#[derive(Debug, Clone, Serialize)]
pub struct RecommendResult {
    pub query: Query,
    pub result: ResultTree,
}
impl RecommendResult {
    pub fn top(&self) -> Option<&SpecQueryModel> {
        self.result.top()
    }
}
/// Generates, scores, ranks and groups every candidate for `query`.
#[instrument(level = "debug", skip_all)]
pub fn recommend(query: &Query, schema: &dyn Schema) -> Result<RecommendResult> {
    let start = Instant::now();
    let config = query.config.clone().unwrap_or_default();
    config.validate()?;
    query.validate_nest()?;
    let order_by = query.order_by();
    let mut answer_set = generate(&query.spec, schema, &config)?;
    let generated = answer_set.len();
    ranking::score_all(&mut answer_set, &query.ranking_names(), schema, &config)?;
    ranking::rank(&mut answer_set, &order_by);
    if let Some(max) = config.max_results {
        answer_set.truncate(max);
    }
    let mut result = nest(answer_set, &query.nest);
    if !query.nest.is_empty() {
        order_groups(&mut result, &query.nest, query.choose_by.as_deref());
    }
    info!(
        generated = generated,
        kept = result.models().len(),
        groups = result.items.len(),
        "Recommendation complete"
    );
    log_performance_metric("recommend", start.elapsed().as_secs_f64() * 1000.0, "ms");
    let mut echoed = query.clone();
    echoed.config = Some(config);
    Ok(RecommendResult {
        query: echoed,
        result,
    })
}
fn order_by_ranking(a: Option<&SpecQueryModel>, b: Option<&SpecQueryModel>, name: &[String]) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => ranking::compare(a, b, name),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
/// Leaf groups keep only their `choose_by` winner; sibling groups sort by their top candidate.
fn order_groups(tree: &mut ResultTree, nests: &[Nest], choose_by: Option<&str>) {
    let Some((level, rest)) = nests.split_first() else {
        if let Some(name) = choose_by {
            let name = [name.to_string()];
            tree.items.sort_by(|a, b| order_by_ranking(item_top(a), item_top(b), &name));
            tree.items.truncate(1);
        }
        return;
    };
    for item in &mut tree.items {
        if let ResultItem::Group(group) = item {
            order_groups(group, rest, choose_by);
        }
    }
    if let Some(name) = level.order_group_by.as_deref().or(choose_by) {
        let name = [name.to_string()];
        tree.items.sort_by(|a, b| order_by_ranking(item_top(a), item_top(b), &name));
    }
}
fn item_top(item: &ResultItem) -> Option<&SpecQueryModel> {
    match item {
        ResultItem::Group(group) => group.top(),
        ResultItem::Model(model) => Some(model),
    }
}

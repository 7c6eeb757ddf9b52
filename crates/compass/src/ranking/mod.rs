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

//! Named scoring functions over complete candidates.
//!
//! Every ranking is a pure function of the candidate, the schema and the
//! configuration. Scores are stored on the candidate under the ranking name
//! so that sorting and grouping can read them back without recomputing.

pub mod aggregation;
pub mod effectiveness;
pub mod field_order;

use crate::config::QueryConfig;
use crate::config_error;
use crate::error::ConfigResult;
use crate::logging::log_ranking;
use crate::model::SpecQueryModel;
use crate::schema::Schema;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const OVERALL: &str = "overall";
/// One named contribution to a ranking, with a readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub score: f64,
    #[serde(rename = "type")]
    pub feature_type: String,
    pub feature: String,
}
impl FeatureScore {
    pub fn new(feature_type: &str, feature: impl Into<String>, score: f64) -> Self {
        Self {
            score,
            feature_type: feature_type.to_string(),
            feature: feature.into(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingScore {
    pub score: f64,
    pub features: Vec<FeatureScore>,
}
impl RankingScore {
    pub fn from_features(features: Vec<FeatureScore>) -> Self {
        Self {
            score: features.iter().map(|f| f.score).sum(),
            features,
        }
    }
}
pub type RankingFn = fn(&SpecQueryModel, &dyn Schema, &QueryConfig) -> RankingScore;
static RANKINGS: Lazy<IndexMap<&'static str, RankingFn>> = Lazy::new(|| {
    let mut rankings: IndexMap<&'static str, RankingFn> = IndexMap::new();
    rankings.insert(aggregation::NAME, aggregation::score);
    rankings.insert(effectiveness::NAME, effectiveness::score);
    rankings.insert(field_order::NAME, field_order::score);
    rankings.insert(OVERALL, score);
    rankings
});
pub fn ranking_names() -> impl Iterator<Item = &'static str> {
    RANKINGS.keys().copied()
}
pub fn get(name: &str) -> Option<RankingFn> {
    RANKINGS.get(name).copied()
}
/// Sum of every individual ranking; the default order for recommendations.
pub fn score(model: &SpecQueryModel, schema: &dyn Schema, config: &QueryConfig) -> RankingScore {
    let features = [aggregation::score, effectiveness::score, field_order::score]
        .into_iter()
        .flat_map(|ranking| ranking(model, schema, config).features)
        .collect();
    RankingScore::from_features(features)
}
/// Stores the score of each named ranking on every candidate, in parallel.
pub fn score_all(
    models: &mut [SpecQueryModel],
    names: &[String],
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConfigResult<()> {
    let rankings = names
        .iter()
        .map(|name| {
            get(name)
                .map(|ranking| (name.as_str(), ranking))
                .ok_or_else(|| config_error!("orderBy", "names unknown ranking '{name}'"))
        })
        .collect::<ConfigResult<Vec<_>>>()?;
    models.par_iter_mut().for_each(|model| {
        for (name, ranking) in &rankings {
            let score = ranking(model, schema, config);
            model.set_ranking_score(*name, score);
        }
    });
    Ok(())
}
fn score_of(model: &SpecQueryModel, name: &str) -> f64 {
    model.ranking_score(name).map_or(0.0, |s| s.score)
}
/// Descending by the first ranking, later rankings break ties. Equal candidates keep their order.
pub fn compare(a: &SpecQueryModel, b: &SpecQueryModel, order_by: &[String]) -> Ordering {
    for name in order_by {
        match score_of(b, name).partial_cmp(&score_of(a, name)).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            ordering => return ordering,
        }
    }
    Ordering::Equal
}
pub fn rank(models: &mut [SpecQueryModel], order_by: &[String]) {
    models.sort_by(|a, b| compare(a, b, order_by));
    if let Some(first) = order_by.first() {
        log_ranking(first, models.len(), models.first().map(|m| score_of(m, first)));
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_ranking_score_sums_features() {
        let score = RankingScore::from_features(vec![
            FeatureScore::new("a", "one", 1.0),
            FeatureScore::new("b", "two", -0.25),
        ]);
        assert!((score.score - 0.75).abs() < 1e-9);
        assert_eq!(score.features.len(), 2);
    }
    #[test]
    fn test_registry_knows_every_named_ranking() {
        let names: Vec<_> = ranking_names().collect();
        assert_eq!(names, vec!["aggregationQuality", "effectiveness", "fieldOrder", "overall"]);
        assert!(get("nope").is_none());
    }
}

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

use super::{FeatureScore, RankingScore};
use crate::config::QueryConfig;
use crate::model::SpecQueryModel;
use crate::query::EncodingQuery;
use crate::schema::Schema;
use crate::vocabulary::{AggregateOp, FieldType};

pub const NAME: &str = "aggregationQuality";
pub fn score(model: &SpecQueryModel, _schema: &dyn Schema, _config: &QueryConfig) -> RankingScore {
    let (score, feature) = aggregation_quality(model);
    RankingScore::from_features(vec![FeatureScore::new(NAME, feature, score)])
}
/// Quantitative without bin or aggregate, or temporal without a time unit.
fn is_raw_continuous(enc: &EncodingQuery) -> bool {
    let EncodingQuery::Field(q) = enc else {
        return false;
    };
    (q.field_type.is(&FieldType::Quantitative) && !q.is_binned() && q.concrete_aggregate().is_none())
        || (q.field_type.is(&FieldType::Temporal) && q.concrete_time_unit().is_none())
}
/// An explicit count aggregate; an added auto count does not qualify.
fn is_count(enc: &EncodingQuery) -> bool {
    enc.as_field()
        .is_some_and(|q| q.concrete_aggregate() == Some(AggregateOp::Count))
}
fn aggregation_quality(model: &SpecQueryModel) -> (f64, &'static str) {
    if !model.is_aggregate() {
        if model.encodings().any(EncodingQuery::is_measure) {
            return (1.0, "Raw with measure");
        }
        return (0.2, "Raw without measure");
    }
    if model.encodings().any(is_raw_continuous) {
        return (0.1, "Aggregate with raw continuous");
    }
    if model.encodings().any(EncodingQuery::is_dimension) {
        if model.encodings().any(is_count) {
            return (0.8, "Aggregate with count");
        }
        return (0.9, "Aggregate without count");
    }
    (0.3, "Aggregate without dimension")
}

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
use crate::property::Property;
use crate::query::EncodingQuery;
use crate::schema::Schema;

pub const NAME: &str = "fieldOrder";
/// Favors low schema indices in the earliest field wildcards.
///
/// Each slot is weighted by a power of the field count, so the first open
/// field slot decides and later slots only break its ties.
pub fn score(model: &SpecQueryModel, schema: &dyn Schema, _config: &QueryConfig) -> RankingScore {
    let indices = model.wildcard_index().encoding_indices(Property::Field);
    if indices.is_empty() {
        return RankingScore::default();
    }
    let field_count = schema.field_names().len().max(1) as f64;
    let mut base = 1.0;
    let mut features = Vec::with_capacity(indices.len());
    for &index in indices.iter().rev() {
        let Some(EncodingQuery::Field(q)) = model.encoding(index) else {
            continue;
        };
        if let Some(field) = q.field.value() {
            let position = schema.field_index(field).unwrap_or(0);
            let name = model
                .wildcard_index()
                .encoding_wildcard(index, Property::Field)
                .and_then(|w| w.name.as_deref())
                .unwrap_or("?");
            features.push(FeatureScore::new(
                NAME,
                format!("field {name} is {field} (#{position} in the schema)"),
                -(position as f64) * base,
            ));
        }
        base *= field_count;
    }
    RankingScore::from_features(features)
}

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

//! Perceptual effectiveness of the channels a candidate uses.
//!
//! Scores follow the Cleveland and Mackinlay orderings: position beats
//! size, color and shape for continuous data, while discrete data tolerates
//! facets and shapes. The small preferred-axis and preferred-facet scores
//! only break ties between otherwise equal layouts.

use super::{FeatureScore, RankingScore};
use crate::config::QueryConfig;
use crate::error::VocabularyError;
use crate::model::SpecQueryModel;
use crate::query::shorthand;
use crate::query::EncodingQuery;
use crate::schema::Schema;
use crate::vocabulary::{vocabulary_enum, Channel, FieldType, Mark};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const NAME: &str = "effectiveness";
pub const TYPE_CHANNEL: &str = "typeChannel";
pub const PREFERRED_AXIS: &str = "preferredAxis";
pub const PREFERRED_FACET: &str = "preferredFacet";
pub const MARK_CHANNEL: &str = "markChannel";
pub const DIMENSION: &str = "dimension";
const TERRIBLE: f64 = -10.0;
const NON_PREFERRED: f64 = -0.01;
vocabulary_enum!(
    /// Field type refined by the function applied to it.
    ExtendedType, "extended type" {
        Quantitative => "quantitative",
        BinQuantitative => "bin_quantitative",
        Temporal => "temporal",
        TimeUnitTemporal => "timeUnit_time",
        TimeUnitOrdinal => "timeUnit_ordinal",
        Ordinal => "ordinal",
        Nominal => "nominal",
    }
);
impl ExtendedType {
    pub fn of(enc: &EncodingQuery) -> Option<Self> {
        let q = match enc {
            EncodingQuery::Field(q) => q,
            EncodingQuery::AutoCount(_) => return Some(ExtendedType::Quantitative),
            EncodingQuery::Value(_) => return None,
        };
        if q.is_binned() {
            return Some(ExtendedType::BinQuantitative);
        }
        if let Some(unit) = q.concrete_time_unit() {
            return Some(if unit.is_discrete_by_default() {
                ExtendedType::TimeUnitOrdinal
            } else {
                ExtendedType::TimeUnitTemporal
            });
        }
        Some(match q.field_type.value()? {
            FieldType::Quantitative => ExtendedType::Quantitative,
            FieldType::Temporal => ExtendedType::Temporal,
            FieldType::Ordinal => ExtendedType::Ordinal,
            FieldType::Nominal => ExtendedType::Nominal,
        })
    }
}
pub fn type_channel_score(extended: ExtendedType, channel: Channel) -> f64 {
    use ExtendedType::*;
    match extended {
        Quantitative | Temporal | TimeUnitTemporal => match channel {
            Channel::X | Channel::Y => 0.0,
            Channel::Size => -0.575,
            Channel::Color => -0.725,
            Channel::Text => -2.0,
            Channel::Opacity => -3.0,
            Channel::Shape | Channel::Row | Channel::Column => TERRIBLE,
            Channel::Detail => 2.0 * TERRIBLE,
        },
        BinQuantitative | TimeUnitOrdinal | Ordinal => match channel {
            Channel::X | Channel::Y => 0.0,
            Channel::Size => -0.575,
            Channel::Color => -0.725,
            Channel::Opacity => -3.0,
            Channel::Row | Channel::Column => -0.75,
            Channel::Shape => -3.1,
            Channel::Text => -3.2,
            Channel::Detail => -4.0,
        },
        Nominal => match channel {
            Channel::X | Channel::Y => 0.0,
            Channel::Color => -0.6,
            Channel::Shape => -0.65,
            Channel::Row | Channel::Column => -0.7,
            Channel::Text => -0.8,
            Channel::Detail => -2.0,
            Channel::Size => -3.0,
            Channel::Opacity => -3.1,
        },
    }
}
fn featurize(extended: ExtendedType, channel: Channel) -> String {
    format!("{extended}_{channel}")
}
fn typed_channels(model: &SpecQueryModel) -> impl Iterator<Item = (&EncodingQuery, ExtendedType, Channel)> + '_ {
    model.encodings().filter_map(|enc| {
        let extended = ExtendedType::of(enc)?;
        let channel = enc.concrete_channel()?;
        Some((enc, extended, channel))
    })
}
/// Best channel per field; extra mappings of one field add nothing.
pub fn type_channel_features(model: &SpecQueryModel) -> Vec<FeatureScore> {
    let none = shorthand::Replacers::new();
    let mut best: IndexMap<String, FeatureScore> = IndexMap::new();
    for (enc, extended, channel) in typed_channels(model) {
        let key = shorthand::field_def(enc, &shorthand::INCLUDE_ALL, &none);
        let feature = FeatureScore::new(
            TYPE_CHANNEL,
            featurize(extended, channel),
            type_channel_score(extended, channel),
        );
        match best.get(&key) {
            Some(current) if current.score >= feature.score => {}
            _ => {
                best.insert(key, feature);
            }
        }
    }
    best.into_values().collect()
}
pub fn preferred_axis_features(model: &SpecQueryModel, config: &QueryConfig) -> Vec<FeatureScore> {
    typed_channels(model)
        .filter_map(|(_, extended, channel)| {
            let preferred = match extended {
                ExtendedType::BinQuantitative => config.preferred_bin_axis,
                ExtendedType::Temporal | ExtendedType::TimeUnitTemporal | ExtendedType::TimeUnitOrdinal => {
                    config.preferred_temporal_axis
                }
                ExtendedType::Ordinal => config.preferred_ordinal_axis,
                ExtendedType::Nominal => config.preferred_nominal_axis,
                ExtendedType::Quantitative => return None,
            };
            let other = match preferred {
                Channel::X => Channel::Y,
                Channel::Y => Channel::X,
                _ => return None,
            };
            (channel == other)
                .then(|| FeatureScore::new(PREFERRED_AXIS, featurize(extended, channel), NON_PREFERRED))
        })
        .collect()
}
pub fn preferred_facet_features(model: &SpecQueryModel, config: &QueryConfig) -> Vec<FeatureScore> {
    let other = match config.preferred_facet {
        Channel::Row => Channel::Column,
        Channel::Column => Channel::Row,
        _ => return Vec::new(),
    };
    model
        .encodings()
        .filter(|enc| enc.channel().is(&other))
        .map(|_| FeatureScore::new(PREFERRED_FACET, other.as_str(), NON_PREFERRED))
        .collect()
}
fn mark_channel_score(mark: Mark, channel: Channel) -> Option<f64> {
    match (mark, channel) {
        (Mark::Bar | Mark::Tick, Channel::Size) => Some(-2.0),
        _ => None,
    }
}
pub fn mark_channel_features(model: &SpecQueryModel) -> Vec<FeatureScore> {
    let Some(&mark) = model.mark().value() else {
        return Vec::new();
    };
    model
        .encodings()
        .filter_map(|enc| {
            let channel = enc.concrete_channel()?;
            let score = mark_channel_score(mark, channel)?;
            Some(FeatureScore::new(MARK_CHANNEL, format!("{mark}_{channel}"), score))
        })
        .collect()
}
fn dimension_score(channel: Channel) -> f64 {
    match channel {
        Channel::Row | Channel::Column => -2.0,
        _ => 0.0,
    }
}
/// Aggregate plots need a dimension, preferably off the facets.
pub fn dimension_features(model: &SpecQueryModel) -> Vec<FeatureScore> {
    if !model.is_aggregate() {
        return Vec::new();
    }
    let mut best = FeatureScore::new(DIMENSION, "No Dimension", -5.0);
    for enc in model.encodings() {
        let EncodingQuery::Field(q) = enc else {
            continue;
        };
        if q.concrete_aggregate().is_some() {
            continue;
        }
        let Some(channel) = enc.concrete_channel() else {
            continue;
        };
        let score = dimension_score(channel);
        if score > best.score {
            best = FeatureScore::new(DIMENSION, channel.as_str(), score);
        }
    }
    vec![best]
}
pub fn score(model: &SpecQueryModel, _schema: &dyn Schema, config: &QueryConfig) -> RankingScore {
    let mut features = type_channel_features(model);
    features.extend(preferred_axis_features(model, config));
    features.extend(preferred_facet_features(model, config));
    features.extend(mark_channel_features(model));
    features.extend(dimension_features(model));
    RankingScore::from_features(features)
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_position_beats_retinal_channels_for_continuous_data() {
        let q = ExtendedType::Quantitative;
        assert!(type_channel_score(q, Channel::X) > type_channel_score(q, Channel::Size));
        assert!(type_channel_score(q, Channel::Size) > type_channel_score(q, Channel::Color));
        assert!(type_channel_score(q, Channel::Color) > type_channel_score(q, Channel::Row));
        assert_eq!(type_channel_score(q, Channel::Detail), -20.0);
    }
    #[test]
    fn test_nominal_prefers_color_over_size() {
        let n = ExtendedType::Nominal;
        assert!(type_channel_score(n, Channel::Color) > type_channel_score(n, Channel::Shape));
        assert!(type_channel_score(n, Channel::Shape) > type_channel_score(n, Channel::Size));
        assert!(
            type_channel_score(ExtendedType::Ordinal, Channel::Row)
                > type_channel_score(ExtendedType::Quantitative, Channel::Row)
        );
    }
}

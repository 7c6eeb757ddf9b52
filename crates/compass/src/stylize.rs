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

//! Style touches applied to finished candidates.

use crate::config::{NominalColorScaleStyle, QueryConfig, SmallBandSizeStyle};
use crate::error::SchemaResult;
use crate::model::SpecQueryModel;
use crate::query::{EncodingQuery, ScaleQuery};
use crate::schema::Schema;
use crate::vocabulary::{Channel, FieldType, ScaleType};
use crate::wildcard::{Nested, Spec};
use serde_json::Value;

pub fn stylize(
    mut answer_set: Vec<SpecQueryModel>,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> SchemaResult<Vec<SpecQueryModel>> {
    for model in &mut answer_set {
        if let Some(style) = &config.small_band_size_for_high_cardinality_or_facet {
            small_band_size_for_high_cardinality_or_facet(model, schema, style)?;
        }
        if let Some(style) = &config.nominal_color_scale_for_high_cardinality {
            nominal_color_scale_for_high_cardinality(model, schema, style)?;
        }
    }
    Ok(answer_set)
}
fn field_index_by_channel(model: &SpecQueryModel, channel: Channel) -> Option<usize> {
    model
        .spec_query()
        .encodings
        .iter()
        .position(|enc| matches!(enc, EncodingQuery::Field(q) if q.channel.is(&channel)))
}
/// Band size 12 on an ordinal-family positional scale that is faceted or crowded.
pub fn small_band_size_for_high_cardinality_or_facet(
    model: &mut SpecQueryModel,
    schema: &dyn Schema,
    style: &SmallBandSizeStyle,
) -> SchemaResult<()> {
    for (channel, facet) in [(Channel::Y, Channel::Row), (Channel::X, Channel::Column)] {
        let faceted = model.channel_used(facet);
        let Some(index) = field_index_by_channel(model, channel) else {
            continue;
        };
        let EncodingQuery::Field(q) = &mut model.spec_mut().encodings[index] else {
            continue;
        };
        if !faceted && schema.cardinality(q)? <= style.max_cardinality {
            continue;
        }
        let ordinal_family = matches!(
            q.scale_type(),
            None | Some(ScaleType::Ordinal | ScaleType::Point | ScaleType::Band)
        );
        if !ordinal_family {
            continue;
        }
        let scale = q.scale.get_or_insert_with(Nested::enabled);
        if let Nested::Enabled(scale) = scale {
            if scale.band_size.is_none() {
                scale.band_size = Some(Spec::Value(style.band_size));
            }
        }
    }
    Ok(())
}
/// Larger categorical palette for a nominal color with many values.
pub fn nominal_color_scale_for_high_cardinality(
    model: &mut SpecQueryModel,
    schema: &dyn Schema,
    style: &NominalColorScaleStyle,
) -> SchemaResult<()> {
    let Some(index) = field_index_by_channel(model, Channel::Color) else {
        return Ok(());
    };
    let EncodingQuery::Field(q) = &mut model.spec_mut().encodings[index] else {
        return Ok(());
    };
    if !q.field_type.is(&FieldType::Nominal) || schema.cardinality(q)? <= style.max_cardinality {
        return Ok(());
    }
    let scale = q.scale.get_or_insert_with(|| Nested::Enabled(ScaleQuery::default()));
    if let Nested::Enabled(scale) = scale {
        if scale.range.is_none() {
            scale.range = Some(Spec::Value(Value::String(style.palette.clone())));
        }
    }
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FieldQuery, SpecQuery};
    use crate::schema::{FieldSchema, TableSchema};
    use crate::vocabulary::{Mark, PrimitiveType};
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            FieldSchema::new("n100", FieldType::Nominal, PrimitiveType::String, 100),
            FieldSchema::new("n5", FieldType::Nominal, PrimitiveType::String, 5),
            FieldSchema::new("q", FieldType::Quantitative, PrimitiveType::Number, 100),
        ])
        .expect("schema")
    }
    fn model(encodings: Vec<FieldQuery>) -> SpecQueryModel {
        let query = SpecQuery::new(Mark::Point, encodings.into_iter().map(Into::into).collect());
        SpecQueryModel::build(&query, &schema(), &QueryConfig::default()).expect("build")
    }
    fn scale(model: &SpecQueryModel, index: usize) -> Option<ScaleQuery> {
        model
            .encoding(index)
            .and_then(EncodingQuery::as_field)
            .and_then(FieldQuery::scale_query)
            .cloned()
    }
    #[test]
    fn test_band_size_only_on_discrete_positional_scales() {
        let config = QueryConfig::default();
        let candidates = vec![model(vec![
            FieldQuery::new(Channel::Y, "n100", FieldType::Nominal),
            FieldQuery::new(Channel::X, "q", FieldType::Quantitative),
        ])];
        let styled = stylize(candidates, &schema(), &config).expect("stylize");
        let y = scale(&styled[0], 0).expect("y scale");
        assert_eq!(y.band_size, Some(Spec::Value(12)));
        assert!(scale(&styled[0], 1).is_none(), "continuous x keeps no scale");
    }
    #[test]
    fn test_nominal_color_palette() {
        let config = QueryConfig::default();
        let crowded = vec![model(vec![
            FieldQuery::new(Channel::X, "q", FieldType::Quantitative),
            FieldQuery::new(Channel::Color, "n100", FieldType::Nominal),
        ])];
        let styled = stylize(crowded, &schema(), &config).expect("stylize");
        let color = scale(&styled[0], 1).expect("color scale");
        assert_eq!(color.range, Some(Spec::Value(Value::String("category20".into()))));
        let sparse = vec![model(vec![
            FieldQuery::new(Channel::X, "q", FieldType::Quantitative),
            FieldQuery::new(Channel::Color, "n5", FieldType::Nominal),
        ])];
        let styled = stylize(sparse, &schema(), &config).expect("stylize");
        assert!(scale(&styled[0], 1).is_none());
    }
}

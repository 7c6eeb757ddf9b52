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

use crate::config_error;
use crate::error::{CompassError, ConfigError, ConfigResult};
use crate::property::{Property, DEFAULT_PROPERTY_PRECEDENCE};
use crate::vocabulary::{AggregateOp, Channel, FieldType, Mark, ScaleType, SortOrder, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallBandSizeStyle {
    pub max_cardinality: u64,
    pub band_size: u32,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominalColorScaleStyle {
    pub max_cardinality: u64,
    pub palette: String,
}
/// Options for generation, pruning and ranking. Absent keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryConfig {
    pub verbose: bool,
    pub property_precedence: Vec<Property>,
    pub marks: Vec<Mark>,
    pub channels: Vec<Channel>,
    pub aggregates: Vec<Option<AggregateOp>>,
    pub time_units: Vec<Option<TimeUnit>>,
    pub types: Vec<FieldType>,
    pub max_bins_list: Vec<u32>,
    pub sort_orders: Vec<SortOrder>,
    pub scale_band_sizes: Vec<u32>,
    pub scale_domains: Vec<Value>,
    pub scale_exponents: Vec<Number>,
    pub scale_ranges: Vec<Value>,
    pub scale_types: Vec<ScaleType>,
    pub number_ordinal_proportion: f64,
    pub default_spec_config: Map<String, Value>,
    pub auto_add_count: bool,
    pub has_appropriate_graphic_type_for_mark: bool,
    pub omit_aggregate: bool,
    pub omit_aggregate_plot_with_dimension_only_on_facet: bool,
    pub omit_aggregate_plot_without_dimension: bool,
    pub omit_bar_line_area_with_occlusion: bool,
    pub omit_bar_tick_with_size: bool,
    pub omit_facet_over_positional_channels: bool,
    pub omit_multiple_non_positional_channels: bool,
    pub omit_non_sum_stack: bool,
    pub omit_raw: bool,
    pub omit_raw_continuous_field_for_aggregate_plot: bool,
    pub omit_repeated_field: bool,
    pub omit_non_positional_over_positional_channels: bool,
    pub omit_table_with_occlusion_if_auto_add_count: bool,
    pub omit_vertical_dot_plot: bool,
    pub preferred_bin_axis: Channel,
    pub preferred_temporal_axis: Channel,
    pub preferred_ordinal_axis: Channel,
    pub preferred_nominal_axis: Channel,
    pub preferred_facet: Channel,
    pub min_cardinality_for_bin: u64,
    /// `None` switches the ceiling off.
    pub max_cardinality_for_categorical_color: Option<u64>,
    pub max_cardinality_for_facet: Option<u64>,
    pub max_cardinality_for_shape: Option<u64>,
    pub type_matches_schema_type: bool,
    /// Also check values the caller fixed, not only enumerated ones.
    pub constraint_manually_specified_value: bool,
    pub stylize: bool,
    pub small_band_size_for_high_cardinality_or_facet: Option<SmallBandSizeStyle>,
    pub nominal_color_scale_for_high_cardinality: Option<NominalColorScaleStyle>,
    pub max_results: Option<usize>,
}
impl Default for QueryConfig {
    fn default() -> Self {
        let default_spec_config = match json!({"overlay": {"line": true}, "scale": {"useRawDomain": true}}) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            verbose: false,
            property_precedence: DEFAULT_PROPERTY_PRECEDENCE.to_vec(),
            marks: vec![Mark::Point, Mark::Bar, Mark::Line, Mark::Area, Mark::Tick],
            channels: vec![
                Channel::X,
                Channel::Y,
                Channel::Row,
                Channel::Column,
                Channel::Size,
                Channel::Color,
            ],
            aggregates: vec![None, Some(AggregateOp::Mean)],
            time_units: vec![
                None,
                Some(TimeUnit::Year),
                Some(TimeUnit::Month),
                Some(TimeUnit::Day),
                Some(TimeUnit::Date),
            ],
            types: vec![
                FieldType::Nominal,
                FieldType::Ordinal,
                FieldType::Quantitative,
                FieldType::Temporal,
            ],
            max_bins_list: vec![5, 10, 20],
            sort_orders: vec![SortOrder::Ascending, SortOrder::Descending],
            scale_band_sizes: vec![17, 21],
            scale_domains: vec![Value::Null],
            scale_exponents: vec![Number::from(1)],
            scale_ranges: vec![Value::Null],
            scale_types: vec![ScaleType::Linear, ScaleType::Log],
            number_ordinal_proportion: 0.05,
            default_spec_config,
            auto_add_count: false,
            has_appropriate_graphic_type_for_mark: true,
            omit_aggregate: false,
            omit_aggregate_plot_with_dimension_only_on_facet: true,
            omit_aggregate_plot_without_dimension: false,
            omit_bar_line_area_with_occlusion: true,
            omit_bar_tick_with_size: true,
            omit_facet_over_positional_channels: true,
            omit_multiple_non_positional_channels: true,
            omit_non_sum_stack: true,
            omit_raw: false,
            omit_raw_continuous_field_for_aggregate_plot: true,
            omit_repeated_field: true,
            omit_non_positional_over_positional_channels: true,
            omit_table_with_occlusion_if_auto_add_count: true,
            omit_vertical_dot_plot: false,
            preferred_bin_axis: Channel::X,
            preferred_temporal_axis: Channel::X,
            preferred_ordinal_axis: Channel::Y,
            preferred_nominal_axis: Channel::Y,
            preferred_facet: Channel::Row,
            min_cardinality_for_bin: 15,
            max_cardinality_for_categorical_color: Some(20),
            max_cardinality_for_facet: Some(10),
            max_cardinality_for_shape: Some(6),
            type_matches_schema_type: true,
            constraint_manually_specified_value: false,
            stylize: true,
            small_band_size_for_high_cardinality_or_facet: Some(SmallBandSizeStyle {
                max_cardinality: 10,
                band_size: 12,
            }),
            nominal_color_scale_for_high_cardinality: Some(NominalColorScaleStyle {
                max_cardinality: 10,
                palette: "category20".to_string(),
            }),
            max_results: None,
        }
    }
}
impl QueryConfig {
    /// Whether the configurable rule `name` is switched on. Unknown names are off.
    pub fn is_enabled(&self, name: &str) -> bool {
        match name {
            "autoAddCount" => self.auto_add_count,
            "hasAppropriateGraphicTypeForMark" => self.has_appropriate_graphic_type_for_mark,
            "omitAggregate" => self.omit_aggregate,
            "omitAggregatePlotWithDimensionOnlyOnFacet" => {
                self.omit_aggregate_plot_with_dimension_only_on_facet
            }
            "omitAggregatePlotWithoutDimension" => self.omit_aggregate_plot_without_dimension,
            "omitBarLineAreaWithOcclusion" => self.omit_bar_line_area_with_occlusion,
            "omitBarTickWithSize" => self.omit_bar_tick_with_size,
            "omitFacetOverPositionalChannels" => self.omit_facet_over_positional_channels,
            "omitMultipleNonPositionalChannels" => self.omit_multiple_non_positional_channels,
            "omitNonSumStack" => self.omit_non_sum_stack,
            "omitRaw" => self.omit_raw,
            "omitRawContinuousFieldForAggregatePlot" => {
                self.omit_raw_continuous_field_for_aggregate_plot
            }
            "omitRepeatedField" => self.omit_repeated_field,
            "omitNonPositionalOverPositionalChannels" => {
                self.omit_non_positional_over_positional_channels
            }
            "omitTableWithOcclusionIfAutoAddCount" => {
                self.omit_table_with_occlusion_if_auto_add_count
            }
            "omitVerticalDotPlot" => self.omit_vertical_dot_plot,
            "typeMatchesSchemaType" => self.type_matches_schema_type,
            "maxCardinalityForCategoricalColor" => self.max_cardinality_for_categorical_color.is_some(),
            "maxCardinalityForFacet" => self.max_cardinality_for_facet.is_some(),
            "maxCardinalityForShape" => self.max_cardinality_for_shape.is_some(),
            _ => false,
        }
    }
    pub fn validate(&self) -> ConfigResult<()> {
        let lists = [
            ("propertyPrecedence", self.property_precedence.is_empty()),
            ("marks", self.marks.is_empty()),
            ("channels", self.channels.is_empty()),
            ("aggregates", self.aggregates.is_empty()),
            ("timeUnits", self.time_units.is_empty()),
            ("types", self.types.is_empty()),
            ("maxBinsList", self.max_bins_list.is_empty()),
            ("sortOrders", self.sort_orders.is_empty()),
            ("scaleTypes", self.scale_types.is_empty()),
        ];
        if let Some((field, _)) = lists.iter().find(|(_, empty)| *empty) {
            return Err(ConfigError::EmptyList {
                field: field.to_string(),
            });
        }
        if self.max_bins_list.contains(&0) {
            return Err(config_error!("maxBinsList", "must only hold positive bin counts"));
        }
        if !(0.0..=1.0).contains(&self.number_ordinal_proportion) {
            return Err(config_error!(
                "numberOrdinalProportion",
                "must be between 0.0 and 1.0, got {}",
                self.number_ordinal_proportion
            ));
        }
        let ceilings = [
            ("maxCardinalityForCategoricalColor", self.max_cardinality_for_categorical_color),
            ("maxCardinalityForFacet", self.max_cardinality_for_facet),
            ("maxCardinalityForShape", self.max_cardinality_for_shape),
        ];
        for (field, ceiling) in ceilings {
            if ceiling == Some(0) {
                return Err(config_error!(field, "must be greater than 0"));
            }
        }
        let axes = [
            ("preferredBinAxis", self.preferred_bin_axis),
            ("preferredTemporalAxis", self.preferred_temporal_axis),
            ("preferredOrdinalAxis", self.preferred_ordinal_axis),
            ("preferredNominalAxis", self.preferred_nominal_axis),
        ];
        for (field, axis) in axes {
            if !matches!(axis, Channel::X | Channel::Y) {
                return Err(config_error!(field, "must be x or y, got {axis}"));
            }
        }
        if !self.preferred_facet.is_facet() {
            return Err(config_error!(
                "preferredFacet",
                "must be row or column, got {}",
                self.preferred_facet
            ));
        }
        if let Some(missing) = DEFAULT_PROPERTY_PRECEDENCE
            .iter()
            .find(|p| !self.property_precedence.contains(*p))
        {
            return Err(config_error!("propertyPrecedence", "is missing '{missing}'"));
        }
        for (i, property) in self.property_precedence.iter().enumerate() {
            if let Some(parent) = property.parent() {
                match self.property_precedence.iter().position(|p| *p == parent) {
                    Some(pos) if pos < i => {}
                    _ => {
                        return Err(config_error!(
                            "propertyPrecedence",
                            "'{property}' must come after '{parent}'"
                        ))
                    }
                }
            }
        }
        Ok(())
    }
    pub fn for_performance() -> Self {
        Self {
            marks: vec![Mark::Point, Mark::Bar, Mark::Line],
            max_bins_list: vec![10],
            time_units: vec![None, Some(TimeUnit::Year), Some(TimeUnit::Month)],
            scale_types: vec![ScaleType::Linear],
            max_results: Some(50),
            ..Default::default()
        }
    }
    pub fn for_exploration() -> Self {
        Self {
            auto_add_count: true,
            marks: vec![
                Mark::Point,
                Mark::Bar,
                Mark::Line,
                Mark::Area,
                Mark::Tick,
                Mark::Text,
            ],
            ..Default::default()
        }
    }
    pub fn for_presentation() -> Self {
        Self {
            max_cardinality_for_categorical_color: Some(10),
            max_cardinality_for_facet: Some(6),
            max_cardinality_for_shape: Some(5),
            omit_vertical_dot_plot: true,
            omit_aggregate_plot_without_dimension: true,
            ..Default::default()
        }
    }
    /// Loads YAML (`.yaml`/`.yml`) or JSON (`.json`) and validates the result.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CompassError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: QueryConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)?,
            Some("json") => serde_json::from_str(&raw)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.display().to_string(),
                }
                .into())
            }
        };
        config.validate()?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

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

//! Rules over a whole candidate: mark and channel combinations, aggregation
//! shape and stacking.

use super::{index_by_property, report_violation, ConstraintFamily, SpecConstraint};
use crate::config::QueryConfig;
use crate::error::{ConstraintError, ConstraintResult};
use crate::model::SpecQueryModel;
use crate::property::Property;
use crate::query::{EncodingQuery, FieldQuery};
use crate::schema::Schema;
use crate::vocabulary::{Channel, FieldType, Mark, ScaleType, NONSPATIAL_CHANNELS};
use crate::wildcard::{Nested, Spec};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

fn fields(model: &SpecQueryModel) -> impl Iterator<Item = &FieldQuery> + '_ {
    model.encodings().filter_map(EncodingQuery::as_field)
}
fn no_repeated_channel(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let mut used = HashSet::new();
    Ok(model
        .encodings()
        .filter_map(EncodingQuery::concrete_channel)
        .all(|channel| used.insert(channel)))
}
fn always_include_zero_in_scale_with_bar_mark(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if !model.mark().is(&Mark::Bar) {
        return Ok(true);
    }
    Ok(!fields(model).any(|q| {
        q.channel.value().is_some_and(Channel::is_positional)
            && q.field_type.is(&FieldType::Quantitative)
            && q.scale_query()
                .and_then(|s| s.zero.as_ref())
                .is_some_and(|z| z.is(&false))
    }))
}
fn auto_add_count(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    if model.encodings().any(EncodingQuery::is_enabled_auto_count) {
        return Ok(model.encodings().all(|enc| match enc {
            EncodingQuery::Value(_) | EncodingQuery::AutoCount(_) => true,
            EncodingQuery::Field(q) => match q.field_type.value() {
                Some(FieldType::Quantitative) => q.bin.as_ref().is_some_and(Nested::is_present),
                Some(FieldType::Temporal) => !matches!(q.time_unit, Spec::Value(None)),
                _ => true,
            },
        }));
    }
    let never_auto_count = model
        .wildcard_index()
        .encoding_indices(Property::AutoCount)
        .iter()
        .all(|i| !model.encoding(*i).is_some_and(|e| e.is_wildcard(Property::AutoCount)));
    if !never_auto_count {
        return Ok(true);
    }
    Ok(model.encodings().any(|enc| match enc {
        EncodingQuery::AutoCount(_) | EncodingQuery::Value(_) => false,
        EncodingQuery::Field(q) => match q.field_type.value() {
            Some(FieldType::Quantitative) => !q.is_binned(),
            Some(FieldType::Temporal) => q.concrete_time_unit().is_none(),
            _ => false,
        },
    }))
}
fn channel_permitted_by_mark_type(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let Some(mark) = model.mark().value() else {
        return Ok(true);
    };
    Ok(model
        .encodings()
        .filter_map(EncodingQuery::concrete_channel)
        .all(|channel| channel.supports_mark(*mark)))
}
fn has_all_required_channels_for_mark(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(mark) = model.mark().value() else {
        return Ok(true);
    };
    let x_or_y = model.channel_used(Channel::X) || model.channel_used(Channel::Y);
    match mark {
        Mark::Area | Mark::Line => Ok(model.channel_used(Channel::X) && model.channel_used(Channel::Y)),
        Mark::Text => Ok(model.channel_used(Channel::Text)),
        Mark::Bar | Mark::Circle | Mark::Square | Mark::Tick | Mark::Rule => Ok(x_or_y),
        // A point with fixed channels is whatever the caller asked for.
        Mark::Point => Ok(!model.wildcard_index().has_property(Property::Channel) || x_or_y),
        Mark::Rect | Mark::Geoshape => Err(ConstraintError::UnsupportedCombination {
            constraint: "hasAllRequiredChannelsForMark",
            mark: mark.to_string(),
        }),
    }
}
fn omit_aggregate(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    Ok(!model.is_aggregate())
}
fn omit_raw(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    Ok(model.is_aggregate())
}
fn omit_aggregate_plot_with_dimension_only_on_facet(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if !model.is_aggregate() {
        return Ok(true);
    }
    let dimensions: Vec<&FieldQuery> = fields(model)
        .filter(|q| q.concrete_aggregate().is_none())
        .collect();
    Ok(dimensions.is_empty()
        || dimensions
            .iter()
            .any(|q| !q.channel.value().is_some_and(Channel::is_facet)))
}
fn omit_aggregate_plot_without_dimension(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if !model.is_aggregate() {
        return Ok(true);
    }
    Ok(model.encodings().any(EncodingQuery::is_dimension))
}
fn omit_bar_line_area_with_occlusion(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    match model.mark().value() {
        Some(Mark::Bar | Mark::Line | Mark::Area) => Ok(model.is_aggregate()),
        _ => Ok(true),
    }
}
fn omit_bar_tick_with_size(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    match model.mark().value() {
        Some(Mark::Bar | Mark::Tick) => Ok(!model.channel_used(Channel::Size)),
        _ => Ok(true),
    }
}
fn omit_bar_area_for_log_scale(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    if !matches!(model.mark().value(), Some(Mark::Bar | Mark::Area)) {
        return Ok(true);
    }
    Ok(!fields(model).any(|q| {
        q.channel.value().is_some_and(Channel::is_positional)
            && q.scale_query().is_some()
            && q.scale_type() == Some(ScaleType::Log)
    }))
}
fn omit_facet_over_positional_channels(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if model.channel_used(Channel::Row) || model.channel_used(Channel::Column) {
        return Ok(model.channel_used(Channel::X) && model.channel_used(Channel::Y));
    }
    Ok(true)
}
fn omit_multiple_non_positional_channels(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let retinal = model
        .encodings()
        .filter_map(EncodingQuery::concrete_channel)
        .filter(|c| matches!(c, Channel::Color | Channel::Shape | Channel::Size))
        .count();
    Ok(retinal <= 1)
}
fn omit_non_positional_over_positional_channels(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if NONSPATIAL_CHANNELS.iter().any(|c| model.channel_used(*c)) {
        return Ok(model.channel_used(Channel::X) && model.channel_used(Channel::Y));
    }
    Ok(true)
}
fn omit_raw_continuous_field_for_aggregate_plot(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if !model.is_aggregate() {
        return Ok(true);
    }
    Ok(fields(model).all(|q| match q.field_type.value() {
        Some(FieldType::Temporal) => !matches!(q.time_unit, Spec::Value(None)),
        Some(FieldType::Quantitative) => {
            q.bin.as_ref().is_some_and(Nested::is_present) || !matches!(q.aggregate, Spec::Value(None))
        }
        _ => true,
    }))
}
fn omit_raw_detail(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    Ok(model.is_aggregate() || !model.channel_used(Channel::Detail))
}
fn omit_repeated_field(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let mut used = HashSet::new();
    Ok(fields(model)
        .filter_map(|q| q.field.value())
        .all(|field| used.insert(field.as_str())))
}
fn omit_vertical_dot_plot(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let encodings: Vec<&EncodingQuery> = model.encodings().collect();
    Ok(!(encodings.len() == 1 && encodings[0].channel().is(&Channel::Y)))
}
fn has_appropriate_graphic_type_for_mark(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(mark) = model.mark().value() else {
        return Ok(true);
    };
    match mark {
        Mark::Area | Mark::Line => {
            if !model.is_aggregate() {
                return Ok(true);
            }
            let (Some(x), Some(y)) = (
                model.encoding_by_channel(Channel::X),
                model.encoding_by_channel(Channel::Y),
            ) else {
                return Ok(false);
            };
            let nominal_dimension = |enc: &EncodingQuery| {
                !enc.is_measure() && enc.as_field().is_some_and(|q| q.field_type.is(&FieldType::Nominal))
            };
            Ok(x.is_measure() != y.is_measure() && !nominal_dimension(x) && !nominal_dimension(y))
        }
        Mark::Bar | Mark::Tick => {
            if model.channel_used(Channel::Size) {
                return Ok(false);
            }
            Ok(model.is_measure(Channel::X) != model.is_measure(Channel::Y))
        }
        Mark::Text | Mark::Circle | Mark::Point | Mark::Square | Mark::Rule => Ok(true),
        Mark::Rect | Mark::Geoshape => Err(ConstraintError::UnsupportedCombination {
            constraint: "hasAppropriateGraphicTypeForMark",
            mark: mark.to_string(),
        }),
    }
}
fn omit_non_linear_scale_type_with_stack(
    model: &SpecQueryModel,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    if model.stack().is_none() {
        return Ok(true);
    }
    Ok(!fields(model).any(|q| {
        q.concrete_aggregate().is_some()
            && q.field_type.is(&FieldType::Quantitative)
            && q.channel.value().is_some_and(Channel::is_positional)
            && q.scale_type().is_some_and(|t| t != ScaleType::Linear)
    }))
}
fn omit_non_sum_stack(model: &SpecQueryModel, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let Some(stack) = model.stack() else {
        return Ok(true);
    };
    Ok(match model.encoding(stack.field_index) {
        Some(EncodingQuery::Field(q)) => q.concrete_aggregate().is_some_and(|op| op.is_sum_op()),
        Some(EncodingQuery::AutoCount(q)) => q.auto_count.is(&true),
        _ => false,
    })
}
fn omit_table_with_occlusion_if_auto_add_count(
    model: &SpecQueryModel,
    _: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    Ok(!(config.auto_add_count
        && model.is_dimension(Channel::X)
        && model.is_dimension(Channel::Y)
        && !model.is_aggregate()))
}
pub static SPEC_CONSTRAINTS: [SpecConstraint; 23] = [
    SpecConstraint {
        name: "noRepeatedChannel",
        description: "Each encoding channel should only be used once.",
        properties: &[Property::Channel],
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: no_repeated_channel,
    },
    SpecConstraint {
        name: "alwaysIncludeZeroInScaleWithBarMark",
        description: "Do not turn off zero in the positional scale of a bar.",
        properties: &[
            Property::Mark,
            Property::Scale,
            Property::ScaleZero,
            Property::Channel,
            Property::Type,
        ],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: always_include_zero_in_scale_with_bar_mark,
    },
    SpecConstraint {
        name: "autoAddCount",
        description: "Add count only for plots whose fields are all ordinal, nominal, binned or time-unit fields.",
        properties: &[Property::Bin, Property::TimeUnit, Property::Type, Property::AutoCount],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: auto_add_count,
    },
    SpecConstraint {
        name: "channelPermittedByMarkType",
        description: "Each encoding channel should be supported by the mark type.",
        properties: &[Property::Channel, Property::Mark],
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: channel_permitted_by_mark_type,
    },
    SpecConstraint {
        name: "hasAllRequiredChannelsForMark",
        description: "All required channels for the specified mark should be specified.",
        properties: &[Property::Channel, Property::Mark],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: has_all_required_channels_for_mark,
    },
    SpecConstraint {
        name: "omitAggregate",
        description: "Omit aggregate plots.",
        properties: &[Property::Aggregate, Property::AutoCount],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_aggregate,
    },
    SpecConstraint {
        name: "omitAggregatePlotWithDimensionOnlyOnFacet",
        description: "Omit aggregate plots whose only dimensions sit on a facet channel.",
        properties: &[Property::Channel, Property::Aggregate, Property::AutoCount],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_aggregate_plot_with_dimension_only_on_facet,
    },
    SpecConstraint {
        name: "omitAggregatePlotWithoutDimension",
        description: "Aggregate plots without a dimension should be omitted.",
        properties: &[
            Property::Aggregate,
            Property::AutoCount,
            Property::Bin,
            Property::TimeUnit,
            Property::Type,
        ],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_aggregate_plot_without_dimension,
    },
    SpecConstraint {
        name: "omitBarLineAreaWithOcclusion",
        description: "Raw bar, line and area plots occlude each other and should be omitted.",
        properties: &[Property::Mark, Property::Aggregate, Property::AutoCount],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_bar_line_area_with_occlusion,
    },
    SpecConstraint {
        name: "omitBarTickWithSize",
        description: "Bar and tick should not use size.",
        properties: &[Property::Channel, Property::Mark],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_bar_tick_with_size,
    },
    SpecConstraint {
        name: "omitBarAreaForLogScale",
        description: "Bar and area should not use a log scale on a positional channel.",
        properties: &[
            Property::Mark,
            Property::Channel,
            Property::Scale,
            Property::ScaleType,
            Property::Type,
        ],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: omit_bar_area_for_log_scale,
    },
    SpecConstraint {
        name: "omitFacetOverPositionalChannels",
        description: "Omit faceted plots unless both x and y are used.",
        properties: &[Property::Channel],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_facet_over_positional_channels,
    },
    SpecConstraint {
        name: "omitMultipleNonPositionalChannels",
        description: "Use at most one of color, shape and size.",
        properties: &[Property::Channel],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_multiple_non_positional_channels,
    },
    SpecConstraint {
        name: "omitNonPositionalOverPositionalChannels",
        description: "Do not use non-positional channels unless both x and y are used.",
        properties: &[Property::Channel],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_non_positional_over_positional_channels,
    },
    SpecConstraint {
        name: "omitRaw",
        description: "Omit raw plots.",
        properties: &[Property::Aggregate, Property::AutoCount],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_raw,
    },
    SpecConstraint {
        name: "omitRawContinuousFieldForAggregatePlot",
        description: "Aggregate plots should not use raw continuous fields.",
        properties: &[
            Property::Aggregate,
            Property::AutoCount,
            Property::TimeUnit,
            Property::Bin,
            Property::Type,
        ],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_raw_continuous_field_for_aggregate_plot,
    },
    SpecConstraint {
        name: "omitRawDetail",
        description: "Do not use detail in a raw plot.",
        properties: &[Property::Channel, Property::Aggregate, Property::AutoCount],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: omit_raw_detail,
    },
    SpecConstraint {
        name: "omitRepeatedField",
        description: "Each field should be mapped to only one channel.",
        properties: &[Property::Field],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_repeated_field,
    },
    SpecConstraint {
        name: "omitVerticalDotPlot",
        description: "Omit a plot with a single encoding on y.",
        properties: &[Property::Channel],
        allow_wildcard_for_properties: true,
        strict: false,
        satisfy: omit_vertical_dot_plot,
    },
    SpecConstraint {
        name: "hasAppropriateGraphicTypeForMark",
        description: "Each mark should encode the kind of data it is good at showing.",
        properties: &[
            Property::Channel,
            Property::Mark,
            Property::Type,
            Property::TimeUnit,
            Property::Bin,
            Property::Aggregate,
            Property::AutoCount,
        ],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: has_appropriate_graphic_type_for_mark,
    },
    SpecConstraint {
        name: "omitNonLinearScaleTypeWithStack",
        description: "A stacked measure should use a linear scale.",
        properties: &[
            Property::Channel,
            Property::Mark,
            Property::Aggregate,
            Property::AutoCount,
            Property::Scale,
            Property::ScaleType,
            Property::Type,
        ],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: omit_non_linear_scale_type_with_stack,
    },
    SpecConstraint {
        name: "omitNonSumStack",
        description: "Stacked plots should use a summative aggregate such as sum or count.",
        properties: &[
            Property::Channel,
            Property::Mark,
            Property::Aggregate,
            Property::AutoCount,
        ],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_non_sum_stack,
    },
    SpecConstraint {
        name: "omitTableWithOcclusionIfAutoAddCount",
        description: "Raw plots with dimensions on both x and y occlude when count can be added instead.",
        properties: &[
            Property::Channel,
            Property::Type,
            Property::TimeUnit,
            Property::Bin,
            Property::Aggregate,
            Property::AutoCount,
        ],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: omit_table_with_occlusion_if_auto_add_count,
    },
];
pub static SPEC_CONSTRAINTS_BY_PROPERTY: Lazy<HashMap<Property, Vec<&'static SpecConstraint>>> =
    Lazy::new(|| index_by_property(&SPEC_CONSTRAINTS));
fn has_all_required_properties_specific(constraint: &SpecConstraint, model: &SpecQueryModel) -> bool {
    constraint.properties.iter().all(|property| match property {
        Property::Mark => !model.mark().is_wildcard(),
        p => model.encodings().all(|enc| !enc.is_wildcard(*p)),
    })
}
impl SpecConstraint {
    /// Runs the rule, treating it as met while a property it may not see open is still a wildcard.
    pub fn check(&self, model: &SpecQueryModel, schema: &dyn Schema, config: &QueryConfig) -> ConstraintResult<bool> {
        if !self.allow_wildcard_for_properties && !has_all_required_properties_specific(self, model) {
            return Ok(true);
        }
        (self.satisfy)(model, schema, config)
    }
}
/// Runs the active spec rules that read `property` and returns the first one violated.
pub fn check_spec(
    property: Property,
    model: &SpecQueryModel,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<Option<&'static str>> {
    let Some(constraints) = SPEC_CONSTRAINTS_BY_PROPERTY.get(&property) else {
        return Ok(None);
    };
    for constraint in constraints {
        if !constraint.is_active(config) {
            continue;
        }
        if !constraint.check(model, schema, config)? {
            return Ok(report_violation(
                ConstraintFamily::Spec,
                constraint.name,
                property,
                model,
                config,
            ));
        }
    }
    Ok(None)
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_constraint_names_are_unique() {
        let names: HashSet<&str> = SPEC_CONSTRAINTS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), SPEC_CONSTRAINTS.len());
    }
    #[test]
    fn test_configurable_rules_have_config_switch() {
        let all_on = QueryConfig {
            auto_add_count: true,
            omit_aggregate: true,
            omit_aggregate_plot_without_dimension: true,
            omit_raw: true,
            omit_vertical_dot_plot: true,
            ..QueryConfig::default()
        };
        for constraint in SPEC_CONSTRAINTS.iter().filter(|c| !c.strict) {
            assert!(
                all_on.is_enabled(constraint.name),
                "{} has no config switch",
                constraint.name
            );
        }
    }
}

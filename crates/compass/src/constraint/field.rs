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

//! Rules over a single encoding.

use super::{index_by_property, report_violation, ConstraintFamily, EncodingConstraint};
use crate::config::QueryConfig;
use crate::error::{ConstraintError, ConstraintResult};
use crate::model::{EncodingWildcards, SpecQueryModel};
use crate::property::Property;
use crate::query::{EncodingQuery, FieldQuery, ScaleQuery};
use crate::schema::Schema;
use crate::vocabulary::{AggregateOp, Channel, FieldType, PrimitiveType, ScaleProperty, ScaleType};
use crate::wildcard::{Nested, Spec};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static SCALE_PROPERTIES_WITH_CHANNEL: [Property; 12] = [
    Property::Channel,
    Property::Scale,
    Property::ScaleType,
    Property::ScaleBandSize,
    Property::ScaleClamp,
    Property::ScaleDomain,
    Property::ScaleExponent,
    Property::ScaleNice,
    Property::ScaleRange,
    Property::ScaleRound,
    Property::ScaleUseRawDomain,
    Property::ScaleZero,
];
static SCALE_PROPERTIES_WITH_TYPE: [Property; 12] = [
    Property::Type,
    Property::Scale,
    Property::ScaleType,
    Property::ScaleBandSize,
    Property::ScaleClamp,
    Property::ScaleDomain,
    Property::ScaleExponent,
    Property::ScaleNice,
    Property::ScaleRange,
    Property::ScaleRound,
    Property::ScaleUseRawDomain,
    Property::ScaleZero,
];
/// Scale object only when the scale is switched on.
fn enabled_scale(q: &FieldQuery) -> Option<&ScaleQuery> {
    match &q.scale {
        Some(Nested::Enabled(scale)) => Some(scale),
        _ => None,
    }
}
fn set_scale_properties(scale: &ScaleQuery) -> impl Iterator<Item = ScaleProperty> + '_ {
    ScaleProperty::ALL
        .iter()
        .copied()
        .filter(|p| *p != ScaleProperty::Type && scale.has(*p))
}
fn guards_enumerated_choice(wildcards: &EncodingWildcards, config: &QueryConfig) -> bool {
    wildcards.contains_key(&Property::Field)
        || wildcards.contains_key(&Property::Type)
        || config.constraint_manually_specified_value
}
fn aggregate_op_supported_by_type(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    if q.concrete_aggregate().is_some() {
        return Ok(!q.field_type.value().is_some_and(FieldType::is_discrete));
    }
    Ok(true)
}
fn asterisk_field_with_count_only(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    Ok(q.field.is(&"*".to_string()) == (q.concrete_aggregate() == Some(AggregateOp::Count)))
}
fn min_cardinality_for_bin(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    if q.is_binned() && q.field_type.is(&FieldType::Quantitative) {
        let raw = FieldQuery {
            bin: None,
            aggregate: Spec::Value(None),
            time_unit: Spec::Value(None),
            ..q.clone()
        };
        return Ok(schema.cardinality(&raw)? >= config.min_cardinality_for_bin);
    }
    Ok(true)
}
fn bin_applied_for_quantitative(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    Ok(!q.is_binned() || q.field_type.is(&FieldType::Quantitative))
}
fn channel_supports_role(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(channel) = enc.concrete_channel() else {
        return Ok(true);
    };
    match enc {
        EncodingQuery::Value(_) => Ok(true),
        EncodingQuery::AutoCount(_) => Ok(channel.supports_measure()),
        EncodingQuery::Field(q) => {
            let undecided = match q.field_type.value() {
                None => true,
                Some(FieldType::Quantitative) => q.bin_is_wildcard(),
                Some(FieldType::Temporal) => q.time_unit.is_wildcard(),
                Some(_) => false,
            };
            Ok(undecided || enc.is_dimension() || channel.supports_measure())
        }
    }
}
fn has_fn(enc: &EncodingQuery, _: &EncodingWildcards, _: &dyn Schema, _: &QueryConfig) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    if !q.has_fn {
        return Ok(true);
    }
    Ok(!matches!(q.aggregate, Spec::Value(None))
        || q.bin.as_ref().is_some_and(Nested::is_present)
        || !matches!(q.time_unit, Spec::Value(None)))
}
fn omit_scale_zero_with_binned_field(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    if q.is_binned() {
        let zero = enabled_scale(q).and_then(|s| s.zero.as_ref());
        return Ok(!zero.is_some_and(|z| z.is(&true)));
    }
    Ok(true)
}
fn only_one_type_of_function(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    let functions = [
        q.concrete_aggregate().is_some(),
        q.is_binned(),
        q.concrete_time_unit().is_some(),
    ];
    Ok(functions.iter().filter(|f| **f).count() <= 1)
}
fn time_unit_applied_for_temporal(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    Ok(q.concrete_time_unit().is_none() || q.field_type.is(&FieldType::Temporal))
}
fn scale_properties_supported_by_scale_type(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    let Some(scale) = enabled_scale(q) else {
        return Ok(true);
    };
    let Some(scale_type) = q.scale_type() else {
        return Ok(true);
    };
    Ok(set_scale_properties(scale).all(|property| {
        scale_type.supports_property(property)
            || (scale_type == ScaleType::Point && ScaleType::Band.supports_property(property))
    }))
}
fn scale_properties_supported_by_channel(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let (Some(q), Some(channel)) = (enc.as_field(), enc.concrete_channel()) else {
        return Ok(true);
    };
    let Some(scale) = enabled_scale(q) else {
        return Ok(true);
    };
    if !channel.supports_scale() {
        return Ok(false);
    }
    let mut properties = set_scale_properties(scale);
    Ok(properties.all(|property| channel.supports_scale_property(property)))
}
fn type_matches_primitive_type(
    enc: &EncodingQuery,
    wildcards: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    let (Some(field), Some(field_type)) = (q.field.value(), q.field_type.value()) else {
        return Ok(true);
    };
    if field == "*" || !guards_enumerated_choice(wildcards, config) {
        return Ok(true);
    }
    Ok(match schema.primitive_type(field) {
        Some(PrimitiveType::String | PrimitiveType::Boolean) => {
            !matches!(field_type, FieldType::Quantitative | FieldType::Temporal)
        }
        Some(PrimitiveType::Number | PrimitiveType::Integer) => *field_type != FieldType::Temporal,
        Some(PrimitiveType::Date) => *field_type == FieldType::Temporal,
        None => false,
    })
}
fn type_matches_schema_type(
    enc: &EncodingQuery,
    wildcards: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    let (Some(field), Some(field_type)) = (q.field.value(), q.field_type.value()) else {
        return Ok(true);
    };
    if !guards_enumerated_choice(wildcards, config) {
        return Ok(true);
    }
    if field == "*" {
        return Ok(*field_type == FieldType::Quantitative);
    }
    Ok(schema.field_type(field) == Some(*field_type))
}
fn cardinality_within(enc: &EncodingQuery, schema: &dyn Schema, ceiling: Option<u64>) -> ConstraintResult<bool> {
    let (Some(q), Some(ceiling)) = (enc.as_field(), ceiling) else {
        return Ok(true);
    };
    Ok(schema.cardinality(q)? <= ceiling)
}
fn max_cardinality_for_categorical_color(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    let nominal = enc.as_field().is_some_and(|q| q.field_type.is(&FieldType::Nominal));
    if enc.channel().is(&Channel::Color) && nominal {
        return cardinality_within(enc, schema, config.max_cardinality_for_categorical_color);
    }
    Ok(true)
}
fn max_cardinality_for_facet(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    if enc.concrete_channel().is_some_and(|c| c.is_facet()) {
        return cardinality_within(enc, schema, config.max_cardinality_for_facet);
    }
    Ok(true)
}
fn max_cardinality_for_shape(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<bool> {
    if enc.channel().is(&Channel::Shape) {
        return cardinality_within(enc, schema, config.max_cardinality_for_shape);
    }
    Ok(true)
}
fn data_type_and_function_match_scale_type(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    if enabled_scale(q).is_none() {
        return Ok(true);
    }
    let (Some(field_type), Some(scale_type)) = (q.field_type.value(), q.scale_type()) else {
        return Ok(true);
    };
    Ok(match field_type {
        FieldType::Nominal | FieldType::Ordinal => scale_type.has_discrete_domain(),
        FieldType::Temporal => {
            let continuous = matches!(scale_type, ScaleType::Time | ScaleType::Utc | ScaleType::Sequential);
            match q.concrete_time_unit() {
                Some(_) => continuous || scale_type.has_discrete_domain(),
                None => continuous,
            }
        }
        FieldType::Quantitative if q.is_binned() => matches!(
            scale_type,
            ScaleType::Linear | ScaleType::BinLinear | ScaleType::BinOrdinal
        ),
        FieldType::Quantitative => matches!(
            scale_type,
            ScaleType::Log
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Quantile
                | ScaleType::Quantize
                | ScaleType::Linear
                | ScaleType::Sequential
                | ScaleType::Ordinal
        ),
    })
}
fn omit_bin_with_log_scale(
    enc: &EncodingQuery,
    _: &EncodingWildcards,
    _: &dyn Schema,
    _: &QueryConfig,
) -> ConstraintResult<bool> {
    let Some(q) = enc.as_field() else {
        return Ok(true);
    };
    let log = enabled_scale(q)
        .and_then(|s| s.scale_type.as_ref())
        .is_some_and(|t| t.is(&ScaleType::Log));
    Ok(!(q.is_binned() && log))
}
pub static ENCODING_CONSTRAINTS: [EncodingConstraint; 18] = [
    EncodingConstraint {
        name: "aggregateOpSupportedByType",
        description: "Aggregate function should be supported by the data type.",
        properties: &[Property::Aggregate, Property::Type],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: aggregate_op_supported_by_type,
    },
    EncodingConstraint {
        name: "asteriskFieldWithCountOnly",
        description: "Field=\"*\" should be used with count and count only.",
        properties: &[Property::Field, Property::Aggregate],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: asterisk_field_with_count_only,
    },
    EncodingConstraint {
        name: "minCardinalityForBin",
        description: "Binned quantitative fields should have at least a minimum number of distinct values.",
        properties: &[Property::Bin, Property::Field, Property::Type],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: min_cardinality_for_bin,
    },
    EncodingConstraint {
        name: "binAppliedForQuantitative",
        description: "Bin should be applied to quantitative fields only.",
        properties: &[Property::Type, Property::Bin],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: bin_applied_for_quantitative,
    },
    EncodingConstraint {
        name: "channelSupportsRole",
        description: "The encoding's role (dimension or measure) should be supported by its channel.",
        properties: &[Property::Channel, Property::Type, Property::Bin, Property::TimeUnit],
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: channel_supports_role,
    },
    EncodingConstraint {
        name: "hasFn",
        description: "A field with hasFn must carry an aggregate, a bin or a time unit.",
        properties: &[Property::Aggregate, Property::Bin, Property::TimeUnit],
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: has_fn,
    },
    EncodingConstraint {
        name: "omitScaleZeroWithBinnedField",
        description: "Do not use scale zero with a binned field.",
        properties: &[Property::Scale, Property::ScaleZero, Property::Bin],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: omit_scale_zero_with_binned_field,
    },
    EncodingConstraint {
        name: "onlyOneTypeOfFunction",
        description: "Only one of aggregate, auto count, time unit or bin should be applied at once.",
        properties: &[Property::Aggregate, Property::AutoCount, Property::TimeUnit, Property::Bin],
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: only_one_type_of_function,
    },
    EncodingConstraint {
        name: "timeUnitAppliedForTemporal",
        description: "Time unit should be applied to temporal fields only.",
        properties: &[Property::TimeUnit, Property::Type],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: time_unit_applied_for_temporal,
    },
    EncodingConstraint {
        name: "scalePropertiesSupportedByScaleType",
        description: "Scale properties must be supported by the scale type in effect.",
        properties: &SCALE_PROPERTIES_WITH_TYPE,
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: scale_properties_supported_by_scale_type,
    },
    EncodingConstraint {
        name: "scalePropertiesSupportedByChannel",
        description: "Scale properties must be supported by the channel.",
        properties: &SCALE_PROPERTIES_WITH_CHANNEL,
        allow_wildcard_for_properties: true,
        strict: true,
        satisfy: scale_properties_supported_by_channel,
    },
    EncodingConstraint {
        name: "typeMatchesPrimitiveType",
        description: "The encoding type should suit the field's storage type.",
        properties: &[Property::Field, Property::Type],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: type_matches_primitive_type,
    },
    EncodingConstraint {
        name: "typeMatchesSchemaType",
        description: "The encoding type should match the type reported by the schema.",
        properties: &[Property::Field, Property::Type],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: type_matches_schema_type,
    },
    EncodingConstraint {
        name: "maxCardinalityForCategoricalColor",
        description: "Categorical color should not be used with too many distinct values.",
        properties: &[Property::Channel, Property::Field],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: max_cardinality_for_categorical_color,
    },
    EncodingConstraint {
        name: "maxCardinalityForFacet",
        description: "Row and column should not be used with too many distinct values.",
        properties: &[Property::Channel, Property::Field, Property::Bin, Property::TimeUnit],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: max_cardinality_for_facet,
    },
    EncodingConstraint {
        name: "maxCardinalityForShape",
        description: "Shape should not be used with too many distinct values.",
        properties: &[Property::Channel, Property::Field, Property::Bin, Property::TimeUnit],
        allow_wildcard_for_properties: false,
        strict: false,
        satisfy: max_cardinality_for_shape,
    },
    EncodingConstraint {
        name: "dataTypeAndFunctionMatchScaleType",
        description: "The scale type should suit the data type and the function applied.",
        properties: &[
            Property::Scale,
            Property::ScaleType,
            Property::Type,
            Property::TimeUnit,
            Property::Bin,
        ],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: data_type_and_function_match_scale_type,
    },
    EncodingConstraint {
        name: "omitBinWithLogScale",
        description: "Do not use a log scale with a binned field.",
        properties: &[Property::Scale, Property::ScaleType, Property::Bin],
        allow_wildcard_for_properties: false,
        strict: true,
        satisfy: omit_bin_with_log_scale,
    },
];
pub static ENCODING_CONSTRAINTS_BY_PROPERTY: Lazy<HashMap<Property, Vec<&'static EncodingConstraint>>> =
    Lazy::new(|| index_by_property(&ENCODING_CONSTRAINTS));
impl EncodingConstraint {
    /// Runs the rule on one encoding, treating it as met while a property it may not see open is still a wildcard.
    pub fn check(
        &self,
        enc: &EncodingQuery,
        wildcards: &EncodingWildcards,
        schema: &dyn Schema,
        config: &QueryConfig,
    ) -> ConstraintResult<bool> {
        if !self.allow_wildcard_for_properties && self.properties.iter().any(|p| enc.is_wildcard(*p)) {
            return Ok(true);
        }
        (self.satisfy)(enc, wildcards, schema, config)
    }
}
/// Runs the active encoding rules that read `property` against encoding `index`.
pub fn check_encoding(
    property: Property,
    model: &SpecQueryModel,
    index: usize,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> ConstraintResult<Option<&'static str>> {
    let Some(constraints) = ENCODING_CONSTRAINTS_BY_PROPERTY.get(&property) else {
        return Ok(None);
    };
    let enc = model.encoding(index).ok_or_else(|| ConstraintError::UnresolvedProperty {
        constraint: "checkEncoding",
        property: format!("{property} of encoding {index}"),
    })?;
    let empty = EncodingWildcards::default();
    let wildcards = model.wildcard_index().encoding_wildcards(index).unwrap_or(&empty);
    for constraint in constraints {
        if !constraint.is_active(config) {
            continue;
        }
        if !constraint.check(enc, wildcards, schema, config)? {
            return Ok(report_violation(
                ConstraintFamily::Encoding,
                constraint.name,
                property,
                model,
                config,
            ));
        }
    }
    Ok(None)
}

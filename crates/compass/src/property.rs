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
use crate::error::VocabularyError;
use crate::schema::Schema;
use crate::vocabulary::{vocabulary_enum, ScaleProperty};
use crate::wildcard::PropertyValue;
use serde::{Deserialize, Serialize};

vocabulary_enum!(
    /// Every property the query model can address, including nested scale and bin children.
    Property, "property" {
        Mark => "mark",
        Transform => "transform",
        Stack => "stack",
        Channel => "channel",
        Aggregate => "aggregate",
        AutoCount => "autoCount",
        HasFn => "hasFn",
        Bin => "bin",
        BinMaxBins => "bin.maxbins",
        TimeUnit => "timeUnit",
        Field => "field",
        Type => "type",
        Scale => "scale",
        ScaleType => "scale.type",
        ScaleBandSize => "scale.bandSize",
        ScaleClamp => "scale.clamp",
        ScaleDomain => "scale.domain",
        ScaleExponent => "scale.exponent",
        ScaleNice => "scale.nice",
        ScaleRange => "scale.range",
        ScaleRound => "scale.round",
        ScaleUseRawDomain => "scale.useRawDomain",
        ScaleZero => "scale.zero",
        Sort => "sort",
        Axis => "axis",
        Legend => "legend",
    }
);
/// Order in which wildcard properties are expanded. Children follow their parents.
pub const DEFAULT_PROPERTY_PRECEDENCE: [Property; 23] = [
    Property::Type,
    Property::Field,
    Property::Bin,
    Property::TimeUnit,
    Property::Aggregate,
    Property::AutoCount,
    Property::Channel,
    Property::Mark,
    Property::Scale,
    Property::Sort,
    Property::Axis,
    Property::Legend,
    Property::BinMaxBins,
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
pub const ENCODING_TOPLEVEL_PROPERTIES: [Property; 11] = [
    Property::Channel,
    Property::Aggregate,
    Property::AutoCount,
    Property::Bin,
    Property::TimeUnit,
    Property::Field,
    Property::Type,
    Property::Scale,
    Property::Sort,
    Property::Axis,
    Property::Legend,
];
pub const ENCODING_NESTED_PROPERTIES: [Property; 11] = [
    Property::BinMaxBins,
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
impl Property {
    pub fn parent(&self) -> Option<Property> {
        match self {
            Property::BinMaxBins => Some(Property::Bin),
            p if p.scale_property().is_some() => Some(Property::Scale),
            _ => None,
        }
    }
    pub fn is_nested(&self) -> bool {
        self.parent().is_some()
    }
    /// Parents whose value is either a flag or an object of child properties.
    pub fn has_nested_children(&self) -> bool {
        matches!(
            self,
            Property::Bin | Property::Scale | Property::Axis | Property::Legend
        )
    }
    pub fn is_encoding_property(&self) -> bool {
        ENCODING_TOPLEVEL_PROPERTIES.contains(self) || self.is_nested() || *self == Property::HasFn
    }
    pub fn children(&self) -> Vec<Property> {
        ENCODING_NESTED_PROPERTIES
            .iter()
            .copied()
            .filter(|p| p.parent() == Some(*self))
            .collect()
    }
    pub fn scale_property(&self) -> Option<ScaleProperty> {
        match self {
            Property::ScaleType => Some(ScaleProperty::Type),
            Property::ScaleBandSize => Some(ScaleProperty::BandSize),
            Property::ScaleClamp => Some(ScaleProperty::Clamp),
            Property::ScaleDomain => Some(ScaleProperty::Domain),
            Property::ScaleExponent => Some(ScaleProperty::Exponent),
            Property::ScaleNice => Some(ScaleProperty::Nice),
            Property::ScaleRange => Some(ScaleProperty::Range),
            Property::ScaleRound => Some(ScaleProperty::Round),
            Property::ScaleUseRawDomain => Some(ScaleProperty::UseRawDomain),
            Property::ScaleZero => Some(ScaleProperty::Zero),
            _ => None,
        }
    }
    pub fn default_name(&self) -> &'static str {
        match self {
            Property::Mark => "m",
            Property::Transform => "tf",
            Property::Stack => "stk",
            Property::Channel => "c",
            Property::Aggregate => "a",
            Property::AutoCount => "#",
            Property::HasFn => "h",
            Property::Bin => "b",
            Property::BinMaxBins => "mb",
            Property::TimeUnit => "tu",
            Property::Field => "f",
            Property::Type => "t",
            Property::Scale => "s",
            Property::ScaleType => "st",
            Property::ScaleBandSize => "sbs",
            Property::ScaleClamp => "scl",
            Property::ScaleDomain => "sd",
            Property::ScaleExponent => "se",
            Property::ScaleNice => "sn",
            Property::ScaleRange => "sra",
            Property::ScaleRound => "sro",
            Property::ScaleUseRawDomain => "su",
            Property::ScaleZero => "sz",
            Property::Sort => "so",
            Property::Axis => "ax",
            Property::Legend => "l",
        }
    }
    /// Enumeration list a wildcard receives when the query does not name one.
    pub fn default_values(&self, schema: &dyn Schema, config: &QueryConfig) -> Vec<PropertyValue> {
        fn all<T: Clone + Into<PropertyValue>>(values: &[T]) -> Vec<PropertyValue> {
            values.iter().cloned().map(Into::into).collect()
        }
        let flags = vec![PropertyValue::Bool(true), PropertyValue::Bool(false)];
        match self {
            Property::Mark => all(&config.marks),
            Property::Channel => all(&config.channels),
            Property::Aggregate => all(&config.aggregates),
            Property::AutoCount => vec![PropertyValue::Bool(false), PropertyValue::Bool(true)],
            Property::HasFn => vec![PropertyValue::Bool(false), PropertyValue::Bool(true)],
            Property::Bin | Property::Scale | Property::Axis | Property::Legend => flags,
            Property::BinMaxBins => all(&config.max_bins_list),
            Property::TimeUnit => all(&config.time_units),
            Property::Field => schema.field_names().into_iter().map(PropertyValue::Field).collect(),
            Property::Type => all(&config.types),
            Property::ScaleType => all(&config.scale_types),
            Property::ScaleBandSize => all(&config.scale_band_sizes),
            Property::ScaleDomain => config
                .scale_domains
                .iter()
                .cloned()
                .map(PropertyValue::Json)
                .collect(),
            Property::ScaleRange => config
                .scale_ranges
                .iter()
                .cloned()
                .map(PropertyValue::Json)
                .collect(),
            Property::ScaleExponent => config
                .scale_exponents
                .iter()
                .cloned()
                .map(PropertyValue::Number)
                .collect(),
            Property::ScaleClamp
            | Property::ScaleNice
            | Property::ScaleRound
            | Property::ScaleUseRawDomain
            | Property::ScaleZero => flags,
            Property::Sort => all(&config.sort_orders),
            Property::Transform | Property::Stack => Vec::new(),
        }
    }
}
/// Parses a comma separated property list such as `field,type,aggregate`.
pub fn parse_property_list(list: &str) -> Result<Vec<Property>, VocabularyError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_children_follow_parents_in_precedence() {
        for (i, prop) in DEFAULT_PROPERTY_PRECEDENCE.iter().enumerate() {
            if let Some(parent) = prop.parent() {
                let parent_pos = DEFAULT_PROPERTY_PRECEDENCE
                    .iter()
                    .position(|p| *p == parent)
                    .expect("parent in precedence");
                assert!(parent_pos < i, "{prop} must follow {parent}");
            }
        }
    }
    #[test]
    fn test_nested_metadata() {
        assert_eq!(Property::BinMaxBins.parent(), Some(Property::Bin));
        assert_eq!(Property::ScaleZero.parent(), Some(Property::Scale));
        assert_eq!(Property::Bin.children(), vec![Property::BinMaxBins]);
        assert_eq!(Property::Scale.children().len(), 10);
        assert_eq!("scale.useRawDomain".parse::<Property>(), Ok(Property::ScaleUseRawDomain));
    }
}

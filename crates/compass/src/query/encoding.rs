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
use crate::error::ModelError;
use crate::property::Property;
use crate::schema::Schema;
use crate::vocabulary::{
    AggregateOp, Channel, FieldType, ScaleProperty, ScaleType, SortOrder, TimeUnit,
};
use crate::wildcard::{Nested, NestedQuery, PropertyKind, PropertyValue, Spec, Wildcard};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const BIN_PARAMS: [&str; 7] = ["maxbins", "extent", "base", "step", "steps", "minstep", "divide"];
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxbins: Option<Spec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minstep: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divide: Option<Value>,
}
impl NestedQuery for BinQuery {
    fn is_empty(&self) -> bool {
        *self == BinQuery::default()
    }
}
impl BinQuery {
    /// Parameters in shorthand order, rendered as JSON.
    pub fn params(&self) -> Vec<(&'static str, Value)> {
        let maxbins = self.maxbins.as_ref().map(Spec::to_json);
        let rest = [
            &self.extent,
            &self.base,
            &self.step,
            &self.steps,
            &self.minstep,
            &self.divide,
        ];
        std::iter::once(maxbins)
            .chain(rest.into_iter().cloned())
            .zip(BIN_PARAMS)
            .filter_map(|(value, key)| value.map(|v| (key, v)))
            .collect()
    }
    pub fn set_param(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error> {
        match key {
            "maxbins" => self.maxbins = Some(Spec::from_json(value)?),
            "extent" => self.extent = Some(value),
            "base" => self.base = Some(value),
            "step" => self.step = Some(value),
            "steps" => self.steps = Some(value),
            "minstep" => self.minstep = Some(value),
            "divide" => self.divide = Some(value),
            other => {
                return Err(de::Error::custom(format!("unknown bin parameter {other}")));
            }
        }
        Ok(())
    }
}
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleQuery {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scale_type: Option<Spec<ScaleType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_size: Option<Spec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp: Option<Spec<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Spec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<Spec<Number>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<Spec<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Spec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<Spec<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_raw_domain: Option<Spec<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero: Option<Spec<bool>>,
}
impl NestedQuery for ScaleQuery {
    fn is_empty(&self) -> bool {
        ScaleProperty::ALL.iter().all(|p| !self.has(*p))
    }
}
/// Runs `$body` with `$slot` bound to the scale field for `$property`.
macro_rules! with_scale_slot {
    (@arms [$($r:tt)*] $scale:expr, $property:expr, $slot:ident => $body:expr) => {
        match $property {
            ScaleProperty::Type => { let $slot = $($r)* $scale.scale_type; $body }
            ScaleProperty::BandSize => { let $slot = $($r)* $scale.band_size; $body }
            ScaleProperty::Clamp => { let $slot = $($r)* $scale.clamp; $body }
            ScaleProperty::Domain => { let $slot = $($r)* $scale.domain; $body }
            ScaleProperty::Exponent => { let $slot = $($r)* $scale.exponent; $body }
            ScaleProperty::Nice => { let $slot = $($r)* $scale.nice; $body }
            ScaleProperty::Range => { let $slot = $($r)* $scale.range; $body }
            ScaleProperty::Round => { let $slot = $($r)* $scale.round; $body }
            ScaleProperty::UseRawDomain => { let $slot = $($r)* $scale.use_raw_domain; $body }
            ScaleProperty::Zero => { let $slot = $($r)* $scale.zero; $body }
        }
    };
    (mut $scale:expr, $property:expr, $slot:ident => $body:expr) => {
        with_scale_slot!(@arms [&mut] $scale, $property, $slot => $body)
    };
    ($scale:expr, $property:expr, $slot:ident => $body:expr) => {
        with_scale_slot!(@arms [&] $scale, $property, $slot => $body)
    };
}
fn assign<T: PropertyKind>(slot: &mut Option<Spec<T>>, value: &PropertyValue) -> bool {
    match T::from_property_value(value) {
        Some(v) => {
            *slot = Some(Spec::Value(v));
            true
        }
        None => false,
    }
}
fn fill_wildcard<T: PropertyKind>(
    slot: &mut Spec<T>,
    property: Property,
    index: usize,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> Option<(Property, Wildcard<PropertyValue>)> {
    let Spec::Wildcard(wildcard) = slot else {
        return None;
    };
    if wildcard.name.is_none() {
        wildcard.name = Some(format!("{}{}", property.default_name(), index));
    }
    if wildcard.values.is_none() {
        let values = property
            .default_values(schema, config)
            .iter()
            .filter_map(T::from_property_value)
            .collect();
        wildcard.values = Some(values);
    }
    Some((property, wildcard.map(|v| v.clone().into())))
}
fn fill_nested_flag<T: NestedQuery>(
    slot: &mut Nested<T>,
    property: Property,
    index: usize,
    schema: &dyn Schema,
    config: &QueryConfig,
) -> Option<(Property, Wildcard<PropertyValue>)> {
    let Nested::Wildcard(flag, _) = slot else {
        return None;
    };
    let mut spec = Spec::Wildcard(std::mem::replace(flag, Wildcard::short()));
    let filled = fill_wildcard(&mut spec, property, index, schema, config);
    if let Spec::Wildcard(filled_flag) = spec {
        *flag = filled_flag;
    }
    filled
}
impl ScaleQuery {
    pub fn has(&self, property: ScaleProperty) -> bool {
        with_scale_slot!(self, property, slot => match slot.as_ref().map(Spec::to_json) {
            Some(Value::Null) | None => false,
            Some(_) => true,
        })
    }
    pub fn is_wildcard(&self, property: ScaleProperty) -> bool {
        with_scale_slot!(self, property, slot => slot.as_ref().is_some_and(Spec::is_wildcard))
    }
    pub fn get_json(&self, property: ScaleProperty) -> Option<Value> {
        with_scale_slot!(self, property, slot => slot.as_ref().map(Spec::to_json))
            .filter(|v| !v.is_null())
    }
    pub fn property_wildcard(&self, property: ScaleProperty) -> Option<Wildcard<PropertyValue>> {
        with_scale_slot!(self, property, slot => slot.as_ref().and_then(Spec::property_wildcard))
    }
    fn set(&mut self, property: ScaleProperty, value: &PropertyValue) -> bool {
        let assigned = with_scale_slot!(mut self, property, slot => assign(slot, value));
        if self.domain == Some(Spec::Value(Value::Null)) {
            self.domain = None;
        }
        if self.range == Some(Spec::Value(Value::Null)) {
            self.range = None;
        }
        assigned
    }
    fn reset(&mut self, property: ScaleProperty, origin: &ScaleQuery) {
        match property {
            ScaleProperty::Type => self.scale_type = origin.scale_type.clone(),
            ScaleProperty::BandSize => self.band_size = origin.band_size.clone(),
            ScaleProperty::Clamp => self.clamp = origin.clamp.clone(),
            ScaleProperty::Domain => self.domain = origin.domain.clone(),
            ScaleProperty::Exponent => self.exponent = origin.exponent.clone(),
            ScaleProperty::Nice => self.nice = origin.nice.clone(),
            ScaleProperty::Range => self.range = origin.range.clone(),
            ScaleProperty::Round => self.round = origin.round.clone(),
            ScaleProperty::UseRawDomain => self.use_raw_domain = origin.use_raw_domain.clone(),
            ScaleProperty::Zero => self.zero = origin.zero.clone(),
        }
    }
    fn fill_wildcards(
        &mut self,
        index: usize,
        schema: &dyn Schema,
        config: &QueryConfig,
        out: &mut Vec<(Property, Wildcard<PropertyValue>)>,
    ) {
        for property in Property::Scale.children() {
            let Some(scale_property) = property.scale_property() else {
                continue;
            };
            let filled = with_scale_slot!(mut self, scale_property, slot => match slot.as_mut() {
                Some(spec) => fill_wildcard(spec, property, index, schema, config),
                None => None,
            });
            out.extend(filled);
        }
    }
    /// Concrete properties as a JSON object with sorted keys.
    pub fn to_json_map(&self) -> Map<String, Value> {
        ScaleProperty::ALL
            .iter()
            .filter_map(|p| self.get_json(*p).map(|v| (p.as_str().to_string(), v)))
            .collect()
    }
}
/// Free-form axis or legend properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuideQuery(pub Map<String, Value>);
impl NestedQuery for GuideQuery {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<AggregateOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sort {
    Order(SortOrder),
    Field(SortField),
}
fn no_function<T>() -> Spec<Option<T>> {
    Spec::Value(None)
}
fn is_no_function<T>(spec: &Spec<Option<T>>) -> bool {
    matches!(spec, Spec::Value(None))
}
fn is_false(flag: &bool) -> bool {
    !*flag
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldQuery {
    pub channel: Spec<Channel>,
    #[serde(default = "no_function", skip_serializing_if = "is_no_function")]
    pub aggregate: Spec<Option<AggregateOp>>,
    #[serde(default = "no_function", skip_serializing_if = "is_no_function")]
    pub time_unit: Spec<Option<TimeUnit>>,
    /// Forces the field to carry one of aggregate, bin or time unit.
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_fn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Nested<BinQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Nested<ScaleQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Spec<Sort>>,
    pub field: Spec<String>,
    #[serde(rename = "type", default = "Spec::short_wildcard")]
    pub field_type: Spec<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Nested<GuideQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Nested<GuideQuery>>,
}
impl FieldQuery {
    pub fn new(channel: impl Into<Spec<Channel>>, field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            channel: channel.into(),
            aggregate: Spec::Value(None),
            time_unit: Spec::Value(None),
            has_fn: false,
            bin: None,
            scale: None,
            sort: None,
            field: Spec::Value(field.into()),
            field_type: Spec::Value(field_type),
            axis: None,
            legend: None,
        }
    }
    pub fn with_aggregate(mut self, op: AggregateOp) -> Self {
        self.aggregate = Spec::Value(Some(op));
        self
    }
    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = Spec::Value(Some(unit));
        self
    }
    pub fn with_bin(mut self, bin: Nested<BinQuery>) -> Self {
        self.bin = Some(bin);
        self
    }
    pub fn with_scale(mut self, scale: Nested<ScaleQuery>) -> Self {
        self.scale = Some(scale);
        self
    }
    pub fn concrete_aggregate(&self) -> Option<AggregateOp> {
        self.aggregate.value().copied().flatten()
    }
    pub fn concrete_time_unit(&self) -> Option<TimeUnit> {
        self.time_unit.value().copied().flatten()
    }
    pub fn is_binned(&self) -> bool {
        self.bin.as_ref().is_some_and(Nested::is_enabled)
    }
    pub fn bin_is_wildcard(&self) -> bool {
        self.bin.as_ref().is_some_and(Nested::is_wildcard)
    }
    pub fn scale_query(&self) -> Option<&ScaleQuery> {
        self.scale.as_ref().and_then(Nested::inner)
    }
    /// Scale type in effect, explicit or inferred. `None` while an input to the inference is open.
    pub fn scale_type(&self) -> Option<ScaleType> {
        let explicit = self.scale_query().and_then(|s| s.scale_type.as_ref());
        if explicit.is_some_and(Spec::is_wildcard)
            || self.field_type.is_wildcard()
            || self.channel.is_wildcard()
            || self.bin_is_wildcard()
        {
            return None;
        }
        if let Some(Spec::Value(scale_type)) = explicit {
            return Some(*scale_type);
        }
        let channel = *self.channel.value()?;
        let field_type = *self.field_type.value()?;
        if field_type == FieldType::Temporal && self.time_unit.is_wildcard() {
            return None;
        }
        let discrete_scale = if matches!(
            channel,
            Channel::X | Channel::Y | Channel::Row | Channel::Column
        ) {
            ScaleType::Point
        } else {
            ScaleType::Ordinal
        };
        Some(match field_type {
            FieldType::Nominal | FieldType::Ordinal => discrete_scale,
            FieldType::Temporal => match self.concrete_time_unit() {
                Some(unit) if unit.is_discrete_by_default() => discrete_scale,
                _ => match channel {
                    Channel::Color => ScaleType::Sequential,
                    Channel::Shape => ScaleType::Ordinal,
                    _ => ScaleType::Time,
                },
            },
            FieldType::Quantitative if self.is_binned() => match channel {
                Channel::Color => ScaleType::BinOrdinal,
                Channel::Shape => ScaleType::Ordinal,
                _ => ScaleType::BinLinear,
            },
            FieldType::Quantitative => match channel {
                Channel::Color => ScaleType::Sequential,
                Channel::Shape => ScaleType::Ordinal,
                _ => ScaleType::Linear,
            },
        })
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCountQuery {
    pub channel: Spec<Channel>,
    pub auto_count: Spec<bool>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueQuery {
    pub channel: Spec<Channel>,
    pub value: Spec<Value>,
}
/// One encoding slot of a spec query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EncodingQuery {
    Field(FieldQuery),
    Value(ValueQuery),
    AutoCount(AutoCountQuery),
}
impl<'de> Deserialize<'de> for EncodingQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let Value::Object(object) = &raw else {
            return Err(de::Error::custom(format!(
                "encoding query must be an object, found {raw}"
            )));
        };
        if object.contains_key("autoCount") {
            serde_json::from_value(raw)
                .map(EncodingQuery::AutoCount)
                .map_err(de::Error::custom)
        } else if object.contains_key("value") {
            serde_json::from_value(raw)
                .map(EncodingQuery::Value)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(raw)
                .map(EncodingQuery::Field)
                .map_err(de::Error::custom)
        }
    }
}
impl From<FieldQuery> for EncodingQuery {
    fn from(query: FieldQuery) -> Self {
        EncodingQuery::Field(query)
    }
}
impl EncodingQuery {
    pub fn auto_count(channel: impl Into<Spec<Channel>>, enabled: impl Into<Spec<bool>>) -> Self {
        EncodingQuery::AutoCount(AutoCountQuery {
            channel: channel.into(),
            auto_count: enabled.into(),
        })
    }
    pub fn channel(&self) -> &Spec<Channel> {
        match self {
            EncodingQuery::Field(q) => &q.channel,
            EncodingQuery::Value(q) => &q.channel,
            EncodingQuery::AutoCount(q) => &q.channel,
        }
    }
    pub fn channel_mut(&mut self) -> &mut Spec<Channel> {
        match self {
            EncodingQuery::Field(q) => &mut q.channel,
            EncodingQuery::Value(q) => &mut q.channel,
            EncodingQuery::AutoCount(q) => &mut q.channel,
        }
    }
    pub fn concrete_channel(&self) -> Option<Channel> {
        self.channel().value().copied()
    }
    pub fn as_field(&self) -> Option<&FieldQuery> {
        match self {
            EncodingQuery::Field(q) => Some(q),
            _ => None,
        }
    }
    pub fn is_value(&self) -> bool {
        matches!(self, EncodingQuery::Value(_))
    }
    pub fn is_disabled_auto_count(&self) -> bool {
        matches!(self, EncodingQuery::AutoCount(q) if q.auto_count.is(&false))
    }
    pub fn is_enabled_auto_count(&self) -> bool {
        matches!(self, EncodingQuery::AutoCount(q) if q.auto_count.is(&true))
    }
    /// Concrete aggregate function or an enabled auto count.
    pub fn is_aggregate(&self) -> bool {
        match self {
            EncodingQuery::Field(q) => q.concrete_aggregate().is_some(),
            EncodingQuery::AutoCount(q) => q.auto_count.is(&true),
            EncodingQuery::Value(_) => false,
        }
    }
    /// Aggregate that is set or still open; a wildcard counts as present.
    pub fn has_possible_aggregate(&self) -> bool {
        match self {
            EncodingQuery::Field(q) => !matches!(q.aggregate, Spec::Value(None)),
            EncodingQuery::AutoCount(q) => !q.auto_count.is(&false),
            EncodingQuery::Value(_) => false,
        }
    }
    pub fn is_dimension(&self) -> bool {
        match self {
            EncodingQuery::Field(q) => {
                q.field_type.value().is_some_and(FieldType::is_discrete)
                    || q.is_binned()
                    || q.concrete_time_unit().is_some()
            }
            _ => false,
        }
    }
    pub fn is_measure(&self) -> bool {
        match self {
            EncodingQuery::Field(q) => {
                let unbinned = !q.bin.as_ref().is_some_and(Nested::is_present);
                (q.field_type.is(&FieldType::Quantitative) && unbinned)
                    || (q.field_type.is(&FieldType::Temporal) && q.time_unit.is(&None))
            }
            EncodingQuery::AutoCount(_) => true,
            EncodingQuery::Value(_) => false,
        }
    }
    /// Field name, `*` for auto count.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            EncodingQuery::Field(q) => q.field.value().map(String::as_str),
            EncodingQuery::AutoCount(_) => Some("*"),
            EncodingQuery::Value(_) => None,
        }
    }
    pub fn is_wildcard(&self, property: Property) -> bool {
        if property == Property::Channel {
            return self.channel().is_wildcard();
        }
        match self {
            EncodingQuery::AutoCount(q) => property == Property::AutoCount && q.auto_count.is_wildcard(),
            EncodingQuery::Value(_) => false,
            EncodingQuery::Field(q) => match property {
                Property::Aggregate => q.aggregate.is_wildcard(),
                Property::TimeUnit => q.time_unit.is_wildcard(),
                Property::Field => q.field.is_wildcard(),
                Property::Type => q.field_type.is_wildcard(),
                Property::Sort => q.sort.as_ref().is_some_and(Spec::is_wildcard),
                Property::Bin => q.bin.as_ref().is_some_and(Nested::is_wildcard),
                Property::Scale => q.scale.as_ref().is_some_and(Nested::is_wildcard),
                Property::Axis => q.axis.as_ref().is_some_and(Nested::is_wildcard),
                Property::Legend => q.legend.as_ref().is_some_and(Nested::is_wildcard),
                Property::BinMaxBins => q
                    .bin
                    .as_ref()
                    .and_then(Nested::inner)
                    .and_then(|b| b.maxbins.as_ref())
                    .is_some_and(Spec::is_wildcard),
                other => match other.scale_property() {
                    Some(sp) => q.scale_query().is_some_and(|s| s.is_wildcard(sp)),
                    None => false,
                },
            },
        }
    }
    pub fn property_wildcard(&self, property: Property) -> Option<Wildcard<PropertyValue>> {
        if property == Property::Channel {
            return self.channel().property_wildcard();
        }
        match self {
            EncodingQuery::AutoCount(q) if property == Property::AutoCount => {
                q.auto_count.property_wildcard()
            }
            EncodingQuery::Field(q) => match property {
                Property::Aggregate => q.aggregate.property_wildcard(),
                Property::TimeUnit => q.time_unit.property_wildcard(),
                Property::Field => q.field.property_wildcard(),
                Property::Type => q.field_type.property_wildcard(),
                Property::Sort => q.sort.as_ref().and_then(Spec::property_wildcard),
                Property::Bin => q.bin.as_ref().and_then(|b| b.flag().property_wildcard()),
                Property::Scale => q.scale.as_ref().and_then(|s| s.flag().property_wildcard()),
                Property::Axis => q.axis.as_ref().and_then(|a| a.flag().property_wildcard()),
                Property::Legend => q.legend.as_ref().and_then(|l| l.flag().property_wildcard()),
                Property::BinMaxBins => q
                    .bin
                    .as_ref()
                    .and_then(Nested::inner)
                    .and_then(|b| b.maxbins.as_ref())
                    .and_then(Spec::property_wildcard),
                other => other
                    .scale_property()
                    .and_then(|sp| q.scale_query()?.property_wildcard(sp)),
            },
            _ => None,
        }
    }
    /// Names and fills every wildcard in this encoding, returning them in property order.
    pub fn init_wildcards(
        &mut self,
        index: usize,
        schema: &dyn Schema,
        config: &QueryConfig,
    ) -> Vec<(Property, Wildcard<PropertyValue>)> {
        let mut out = Vec::new();
        out.extend(fill_wildcard(self.channel_mut(), Property::Channel, index, schema, config));
        match self {
            EncodingQuery::AutoCount(q) => {
                out.extend(fill_wildcard(&mut q.auto_count, Property::AutoCount, index, schema, config));
            }
            EncodingQuery::Value(_) => {}
            EncodingQuery::Field(q) => {
                out.extend(fill_wildcard(&mut q.aggregate, Property::Aggregate, index, schema, config));
                if matches!(q.bin, Some(Nested::Disabled)) {
                    q.bin = None;
                }
                if let Some(bin) = q.bin.as_mut() {
                    out.extend(fill_nested_flag(bin, Property::Bin, index, schema, config));
                    if let Some(maxbins) = bin.inner_mut().and_then(|b| b.maxbins.as_mut()) {
                        out.extend(fill_wildcard(maxbins, Property::BinMaxBins, index, schema, config));
                    }
                }
                out.extend(fill_wildcard(&mut q.time_unit, Property::TimeUnit, index, schema, config));
                out.extend(fill_wildcard(&mut q.field, Property::Field, index, schema, config));
                out.extend(fill_wildcard(&mut q.field_type, Property::Type, index, schema, config));
                if let Some(scale) = q.scale.as_mut() {
                    out.extend(fill_nested_flag(scale, Property::Scale, index, schema, config));
                    if let Some(inner) = scale.inner_mut() {
                        inner.fill_wildcards(index, schema, config, &mut out);
                    }
                }
                if let Some(sort) = q.sort.as_mut() {
                    out.extend(fill_wildcard(sort, Property::Sort, index, schema, config));
                }
                if let Some(axis) = q.axis.as_mut() {
                    out.extend(fill_nested_flag(axis, Property::Axis, index, schema, config));
                }
                if let Some(legend) = q.legend.as_mut() {
                    out.extend(fill_nested_flag(legend, Property::Legend, index, schema, config));
                }
            }
        }
        out
    }
    pub fn set_property(&mut self, property: Property, value: &PropertyValue) -> Result<(), ModelError> {
        let mismatch = || ModelError::ValueTypeMismatch {
            property: property.to_string(),
            value: value.to_string(),
        };
        let flag = || match value {
            PropertyValue::Bool(b) => Ok(*b),
            _ => Err(mismatch()),
        };
        if property == Property::Channel {
            let channel = Channel::from_property_value(value).ok_or_else(mismatch)?;
            *self.channel_mut() = Spec::Value(channel);
            return Ok(());
        }
        match self {
            EncodingQuery::AutoCount(q) if property == Property::AutoCount => {
                q.auto_count = Spec::Value(flag()?);
                Ok(())
            }
            EncodingQuery::Field(q) => {
                let assigned = match property {
                    Property::Aggregate => {
                        q.aggregate = Spec::Value(PropertyKind::from_property_value(value).ok_or_else(mismatch)?);
                        true
                    }
                    Property::TimeUnit => {
                        q.time_unit = Spec::Value(PropertyKind::from_property_value(value).ok_or_else(mismatch)?);
                        true
                    }
                    Property::Field => {
                        q.field = Spec::Value(PropertyKind::from_property_value(value).ok_or_else(mismatch)?);
                        true
                    }
                    Property::Type => {
                        q.field_type = Spec::Value(PropertyKind::from_property_value(value).ok_or_else(mismatch)?);
                        true
                    }
                    Property::Sort => assign(&mut q.sort, value),
                    Property::Bin => {
                        // An unbinned field carries no bin, matching its shorthand.
                        if flag()? {
                            q.bin.get_or_insert(Nested::Disabled).set_flag(true);
                        } else {
                            q.bin = None;
                        }
                        true
                    }
                    Property::Scale => {
                        q.scale.get_or_insert(Nested::Disabled).set_flag(flag()?);
                        true
                    }
                    Property::Axis => {
                        q.axis.get_or_insert(Nested::Disabled).set_flag(flag()?);
                        true
                    }
                    Property::Legend => {
                        q.legend.get_or_insert(Nested::Disabled).set_flag(flag()?);
                        true
                    }
                    Property::BinMaxBins => match q.bin.as_mut().and_then(Nested::inner_mut) {
                        Some(bin) => assign(&mut bin.maxbins, value),
                        None => false,
                    },
                    other => match (other.scale_property(), q.scale.as_mut().and_then(Nested::inner_mut)) {
                        (Some(sp), Some(scale)) => scale.set(sp, value),
                        _ => {
                            return Err(ModelError::NotAnEncodingProperty {
                                property: other.to_string(),
                            })
                        }
                    },
                };
                if assigned {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            _ => Err(ModelError::NotAnEncodingProperty {
                property: property.to_string(),
            }),
        }
    }
    /// Restores the slot for `property` from `origin`, the encoding as it was built.
    pub fn reset_property(&mut self, property: Property, origin: &EncodingQuery) {
        if property == Property::Channel {
            *self.channel_mut() = origin.channel().clone();
            return;
        }
        match (self, origin) {
            (EncodingQuery::AutoCount(q), EncodingQuery::AutoCount(o)) => {
                if property == Property::AutoCount {
                    q.auto_count = o.auto_count.clone();
                }
            }
            (EncodingQuery::Field(q), EncodingQuery::Field(o)) => match property {
                Property::Aggregate => q.aggregate = o.aggregate.clone(),
                Property::TimeUnit => q.time_unit = o.time_unit.clone(),
                Property::Field => q.field = o.field.clone(),
                Property::Type => q.field_type = o.field_type.clone(),
                Property::Sort => q.sort = o.sort.clone(),
                Property::Bin => q.bin = o.bin.clone(),
                Property::Scale => q.scale = o.scale.clone(),
                Property::Axis => q.axis = o.axis.clone(),
                Property::Legend => q.legend = o.legend.clone(),
                Property::BinMaxBins => {
                    let origin_maxbins = o.bin.as_ref().and_then(Nested::inner).and_then(|b| b.maxbins.clone());
                    if let Some(bin) = q.bin.as_mut().and_then(Nested::inner_mut) {
                        bin.maxbins = origin_maxbins;
                    }
                }
                other => {
                    if let (Some(sp), Some(scale), Some(origin_scale)) = (
                        other.scale_property(),
                        q.scale.as_mut().and_then(Nested::inner_mut),
                        o.scale.as_ref().and_then(Nested::inner),
                    ) {
                        scale.reset(sp, origin_scale);
                    }
                }
            },
            _ => {}
        }
    }
    /// Whether any property outside `exclude` is still open.
    pub fn has_wildcard(&self, exclude: &[Property]) -> bool {
        crate::property::ENCODING_TOPLEVEL_PROPERTIES
            .iter()
            .chain(crate::property::ENCODING_NESTED_PROPERTIES.iter())
            .filter(|p| !exclude.contains(p))
            .any(|p| self.is_wildcard(*p))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    #[test]
    fn test_scale_type_inference() {
        let q = FieldQuery::new(Channel::X, "a", FieldType::Quantitative);
        assert_eq!(q.scale_type(), Some(ScaleType::Linear));
        let q = FieldQuery::new(Channel::Color, "a", FieldType::Nominal);
        assert_eq!(q.scale_type(), Some(ScaleType::Ordinal));
        let q = FieldQuery::new(Channel::X, "a", FieldType::Temporal).with_time_unit(TimeUnit::Month);
        assert_eq!(q.scale_type(), Some(ScaleType::Point));
        let mut q = FieldQuery::new(Channel::X, "a", FieldType::Quantitative);
        q.field_type = Spec::short_wildcard();
        assert_eq!(q.scale_type(), None);
    }
    #[test]
    fn test_encoding_variant_detection() {
        let auto: EncodingQuery =
            serde_json::from_value(json!({"channel": "x", "autoCount": true})).expect("auto count");
        assert!(auto.is_enabled_auto_count());
        let value: EncodingQuery =
            serde_json::from_value(json!({"channel": "color", "value": "red"})).expect("value");
        assert!(value.is_value());
        let field: EncodingQuery =
            serde_json::from_value(json!({"channel": "?", "field": "a"})).expect("field");
        assert!(field.is_wildcard(Property::Channel));
        assert!(field.is_wildcard(Property::Type));
    }
    #[test]
    fn test_set_and_reset_nested_child() {
        let origin: EncodingQuery = serde_json::from_value(json!({
            "channel": "x", "field": "a", "type": "quantitative",
            "bin": {"maxbins": {"enum": [5, 10]}}
        }))
        .expect("query");
        let mut enc = origin.clone();
        assert!(enc.is_wildcard(Property::BinMaxBins));
        enc.set_property(Property::BinMaxBins, &PropertyValue::Count(10))
            .expect("set maxbins");
        assert!(!enc.is_wildcard(Property::BinMaxBins));
        enc.reset_property(Property::BinMaxBins, &origin);
        assert_eq!(enc, origin);
    }
}

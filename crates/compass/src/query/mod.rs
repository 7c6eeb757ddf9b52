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

//! Spec queries: a mark plus encoding slots, any of which may hold wildcards.

pub mod encoding;
pub mod shorthand;

pub use encoding::{
    AutoCountQuery, BinQuery, EncodingQuery, FieldQuery, GuideQuery, ScaleQuery, Sort, SortField,
    ValueQuery,
};

use crate::error::SerialisationError;
use crate::property::Property;
use crate::vocabulary::{Channel, FieldType, Mark};
use crate::wildcard::{Nested, NestedQuery, Spec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub mark: Spec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Vec<Value>>,
    #[serde(default)]
    pub encodings: Vec<EncodingQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}
/// How aggregated values accumulate along one positional axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackProperties {
    pub groupby_channel: Option<Channel>,
    pub field_channel: Channel,
    pub stack_by: Vec<Channel>,
    pub offset: String,
    /// Encoding index of the aggregated field.
    pub field_index: usize,
}
/// A fully resolved chart ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Vec<Value>>,
    pub mark: Mark,
    pub encoding: BTreeMap<Channel, Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}
pub const STACK_OFFSETS: [&str; 3] = ["zero", "center", "normalize"];
impl SpecQuery {
    pub fn new(mark: impl Into<Spec<Mark>>, encodings: Vec<EncodingQuery>) -> Self {
        Self {
            data: None,
            mark: mark.into(),
            transform: None,
            encodings,
            config: None,
        }
    }
    pub fn is_aggregate(&self) -> bool {
        self.encodings.iter().any(EncodingQuery::is_aggregate)
    }
    pub fn has_wildcard(&self, exclude: &[Property]) -> bool {
        (self.mark.is_wildcard() && !exclude.contains(&Property::Mark))
            || self.encodings.iter().any(|e| e.has_wildcard(exclude))
    }
    /// Offset named by `config.stack`, `None` when stacking is switched off.
    /// An absent value or `true` means `zero`; anything unreadable is returned as the error.
    pub fn stack_offset(&self) -> Result<Option<&str>, &Value> {
        match self.config.as_ref().and_then(|c| c.get("stack")) {
            None | Some(Value::Bool(true)) => Ok(Some("zero")),
            Some(Value::Null | Value::Bool(false)) => Ok(None),
            Some(Value::String(s)) if s == "none" => Ok(None),
            Some(Value::String(s)) if STACK_OFFSETS.contains(&s.as_str()) => Ok(Some(s.as_str())),
            Some(other) => Err(other),
        }
    }
    pub fn stack(&self) -> Option<StackProperties> {
        let offset = self.stack_offset().ok()??;
        if !self.mark.value().is_some_and(Mark::is_stackable) || !self.is_aggregate() {
            return None;
        }
        let stack_by: Vec<Channel> = self
            .encodings
            .iter()
            .filter(|e| match e {
                EncodingQuery::Value(_) => true,
                EncodingQuery::Field(_) => !e.has_possible_aggregate(),
                EncodingQuery::AutoCount(_) => false,
            })
            .filter_map(|e| e.concrete_channel().filter(Channel::is_stack_group))
            .collect();
        if stack_by.is_empty() {
            return None;
        }
        let position = |channel: Channel| self.encodings.iter().position(|e| e.channel().is(&channel));
        let x = position(Channel::X);
        let y = position(Channel::Y);
        let is_aggregate_at = |index: Option<usize>| {
            index.is_some_and(|i| self.encodings[i].has_possible_aggregate())
        };
        let x_is_aggregate = is_aggregate_at(x);
        if x_is_aggregate == is_aggregate_at(y) {
            return None;
        }
        let (field_channel, field_index, groupby) = if x_is_aggregate {
            (Channel::X, x?, y.map(|_| Channel::Y))
        } else {
            (Channel::Y, y?, x.map(|_| Channel::X))
        };
        Some(StackProperties {
            groupby_channel: groupby,
            field_channel,
            stack_by,
            offset: offset.to_string(),
            field_index,
        })
    }
    /// Converts a resolved query into a chart. `None` while any required property is open.
    pub fn to_chart_spec(&self, default_config: &Map<String, Value>) -> Option<ChartSpec> {
        let mark = *self.mark.value()?;
        let mut encoding = BTreeMap::new();
        for enc in &self.encodings {
            if enc.is_disabled_auto_count() {
                continue;
            }
            let channel = enc.concrete_channel()?;
            encoding.insert(channel, channel_def(enc, channel)?);
        }
        let mut config = default_config.clone();
        if let Some(own) = &self.config {
            config.extend(own.clone());
        }
        Some(ChartSpec {
            data: self.data.clone(),
            transform: self.transform.clone(),
            mark,
            encoding,
            config: (!config.is_empty()).then_some(config),
        })
    }
}
fn nested_json<T: NestedQuery + Serialize>(nested: &Nested<T>) -> Option<Value> {
    match nested {
        Nested::Wildcard(..) => None,
        Nested::Disabled => Some(Value::Null),
        Nested::Enabled(_) => serde_json::to_value(nested).ok(),
    }
}
fn channel_def(enc: &EncodingQuery, channel: Channel) -> Option<Map<String, Value>> {
    let mut def = Map::new();
    match enc {
        EncodingQuery::AutoCount(q) => {
            if q.auto_count.is_wildcard() {
                return None;
            }
            def.insert("aggregate".into(), Value::from("count"));
            def.insert("field".into(), Value::from("*"));
            def.insert("type".into(), Value::from(FieldType::Quantitative.as_str()));
        }
        EncodingQuery::Value(q) => {
            def.insert("value".into(), q.value.value()?.clone());
        }
        EncodingQuery::Field(q) => {
            if enc.has_wildcard(&[]) {
                return None;
            }
            if let Some(op) = q.concrete_aggregate() {
                def.insert("aggregate".into(), Value::from(op.as_str()));
            }
            if let Some(bin) = q.bin.as_ref().filter(|b| b.is_enabled()) {
                def.insert("bin".into(), nested_json(bin)?);
            }
            if let Some(unit) = q.concrete_time_unit() {
                def.insert("timeUnit".into(), Value::from(unit.as_str()));
            }
            def.insert("field".into(), Value::from(q.field.value()?.as_str()));
            def.insert("type".into(), Value::from(q.field_type.value()?.as_str()));
            if let Some(scale) = q.scale.as_ref().filter(|_| channel.supports_scale()) {
                def.insert("scale".into(), nested_json(scale)?);
            }
            if let Some(sort) = &q.sort {
                def.insert("sort".into(), sort.to_json());
            }
            if let Some(axis) = q.axis.as_ref().filter(|_| channel.supports_axis()) {
                def.insert("axis".into(), nested_json(axis)?);
            }
            if let Some(legend) = q.legend.as_ref().filter(|_| channel.supports_legend()) {
                def.insert("legend".into(), nested_json(legend)?);
            }
        }
    }
    Some(def)
}
/// Reads a Vega-Lite style unit specification (`mark`, `encoding` map) as a query.
pub fn from_spec(spec: &Value) -> Result<SpecQuery, SerialisationError> {
    let object = spec.as_object().ok_or_else(|| SerialisationError::UnexpectedShape {
        expected: "a unit specification object".to_string(),
        found: spec.to_string(),
    })?;
    let mark = Spec::from_json(object.get("mark").cloned().unwrap_or(Value::Null))?;
    let mut encodings: Vec<EncodingQuery> = Vec::new();
    if let Some(encoding) = object.get("encoding").and_then(Value::as_object) {
        for (channel, channel_def) in encoding {
            let mut query = Map::new();
            query.insert("channel".into(), Value::from(channel.as_str()));
            for (key, value) in channel_def.as_object().into_iter().flatten() {
                let is_encoding_key = key == "value"
                    || key
                        .parse::<Property>()
                        .is_ok_and(|p| crate::property::ENCODING_TOPLEVEL_PROPERTIES.contains(&p));
                if !is_encoding_key {
                    continue;
                }
                let nullable = matches!(key.as_str(), "bin" | "scale" | "axis" | "legend");
                let value = if nullable && value.is_null() {
                    Value::Bool(false)
                } else {
                    value.clone()
                };
                query.insert(key.clone(), value);
            }
            encodings.push(serde_json::from_value(Value::Object(query))?);
        }
    }
    Ok(SpecQuery {
        data: object.get("data").cloned(),
        mark,
        transform: object
            .get("transform")
            .and_then(Value::as_array)
            .cloned(),
        encodings,
        config: object.get("config").and_then(Value::as_object).cloned(),
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::AggregateOp;
    use serde_json::json;
    fn stacked_bar(aggregate_x: bool) -> SpecQuery {
        let mut x = FieldQuery::new(Channel::X, "q", FieldType::Quantitative);
        if aggregate_x {
            x = x.with_aggregate(AggregateOp::Sum);
        }
        SpecQuery::new(
            Mark::Bar,
            vec![
                x.into(),
                FieldQuery::new(Channel::Y, "n", FieldType::Nominal).into(),
                FieldQuery::new(Channel::Color, "n1", FieldType::Nominal).into(),
            ],
        )
    }
    #[test]
    fn test_stack_for_aggregated_bar() {
        let stack = stacked_bar(true).stack().expect("stack expected");
        assert_eq!(stack.field_channel, Channel::X);
        assert_eq!(stack.groupby_channel, Some(Channel::Y));
        assert_eq!(stack.stack_by, vec![Channel::Color]);
        assert_eq!(stack.offset, "zero");
        assert!(stacked_bar(false).stack().is_none());
    }
    #[test]
    fn test_stack_disabled_by_config() {
        let mut query = stacked_bar(true);
        query.config = Some(json!({"stack": "none"}).as_object().cloned().unwrap_or_default());
        assert!(query.stack().is_none());
    }
    #[test]
    fn test_stack_offset_from_config() {
        let mut query = stacked_bar(true);
        query.config = json!({"stack": "normalize"}).as_object().cloned();
        assert_eq!(query.stack().map(|s| s.offset), Some("normalize".to_string()));
        query.config = json!({"stack": true}).as_object().cloned();
        assert_eq!(query.stack_offset(), Ok(Some("zero")));
        query.config = json!({"stack": 3}).as_object().cloned();
        assert_eq!(query.stack_offset(), Err(&json!(3)));
        assert!(query.stack().is_none());
        query.config = json!({"stack": "sideways"}).as_object().cloned();
        assert!(query.stack_offset().is_err());
    }
    #[test]
    fn test_from_spec_converts_null_nested_to_false() {
        let query = from_spec(&json!({
            "mark": "point",
            "encoding": {"x": {"field": "a", "type": "quantitative", "scale": null, "title": "x"}}
        }))
        .expect("from_spec");
        let field = query.encodings[0].as_field().expect("field query");
        assert_eq!(field.scale, Some(Nested::Disabled));
        assert_eq!(query.mark, Spec::Value(Mark::Point));
    }
}

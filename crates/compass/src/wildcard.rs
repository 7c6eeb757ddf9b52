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

//! Wildcards are placeholders for property values that are still open.
//!
//! A wildcard is written either as the short glyph `"?"` or as an object
//! `{"name": "c0", "enum": ["x", "y"]}`. [`Spec`] holds a fixed value or a
//! wildcard; [`Nested`] covers properties like `bin` and `scale` that are a
//! flag and an object of child properties at the same time.

use crate::query::Sort;
use crate::vocabulary::{AggregateOp, Channel, FieldType, Mark, ScaleType, SortOrder, TimeUnit};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

pub const SHORT_WILDCARD: &str = "?";
const WILDCARD_KEYS: [&str; 3] = ["name", "enum", "values"];
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wildcard<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<T>>,
}
impl<T> Wildcard<T> {
    pub fn short() -> Self {
        Self {
            name: None,
            values: None,
        }
    }
    pub fn with_values(values: Vec<T>) -> Self {
        Self {
            name: None,
            values: Some(values),
        }
    }
    pub fn named(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: Some(name.into()),
            values: Some(values),
        }
    }
    pub fn is_short(&self) -> bool {
        self.name.is_none() && self.values.is_none()
    }
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Wildcard<U> {
        Wildcard {
            name: self.name.clone(),
            values: self.values.as_ref().map(|v| v.iter().map(f).collect()),
        }
    }
}
impl<T: Serialize> Wildcard<T> {
    /// `?` for an open wildcard, `?` followed by the JSON value list otherwise.
    pub fn shorthand(&self) -> String {
        match &self.values {
            Some(values) => format!(
                "{SHORT_WILDCARD}{}",
                serde_json::to_string(values).unwrap_or_default()
            ),
            None => SHORT_WILDCARD.to_string(),
        }
    }
    fn to_json(&self) -> Value {
        if self.is_short() {
            Value::String(SHORT_WILDCARD.to_string())
        } else {
            serde_json::to_value(self).unwrap_or(Value::Null)
        }
    }
}
impl<T: DeserializeOwned> Wildcard<T> {
    /// Recognises `"?"` and wildcard objects. Any other JSON yields `Ok(None)`.
    pub fn from_json(raw: &Value) -> Result<Option<Self>, serde_json::Error> {
        match raw {
            Value::String(s) if s == SHORT_WILDCARD => Ok(Some(Wildcard::short())),
            Value::Object(map) if is_wildcard_object(map) => {
                let name = map.get("name").and_then(Value::as_str).map(str::to_string);
                let values = match map.get("enum").or_else(|| map.get("values")) {
                    Some(v) => Some(serde_json::from_value(v.clone())?),
                    None => None,
                };
                Ok(Some(Wildcard { name, values }))
            }
            _ => Ok(None),
        }
    }
}
fn is_wildcard_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| WILDCARD_KEYS.contains(&k.as_str()))
}
/// A property that is either fixed or still open.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec<T> {
    Value(T),
    Wildcard(Wildcard<T>),
}
impl<T> Spec<T> {
    pub fn short_wildcard() -> Self {
        Spec::Wildcard(Wildcard::short())
    }
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Spec::Wildcard(_))
    }
    pub fn value(&self) -> Option<&T> {
        match self {
            Spec::Value(v) => Some(v),
            Spec::Wildcard(_) => None,
        }
    }
    pub fn wildcard(&self) -> Option<&Wildcard<T>> {
        match self {
            Spec::Value(_) => None,
            Spec::Wildcard(w) => Some(w),
        }
    }
}
impl<T: PartialEq> Spec<T> {
    pub fn is(&self, other: &T) -> bool {
        self.value() == Some(other)
    }
}
impl<T> From<T> for Spec<T> {
    fn from(value: T) -> Self {
        Spec::Value(value)
    }
}
impl<T: Serialize> Spec<T> {
    pub fn to_json(&self) -> Value {
        match self {
            Spec::Value(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            Spec::Wildcard(w) => w.to_json(),
        }
    }
}
impl<T: DeserializeOwned> Spec<T> {
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        if let Some(wildcard) = Wildcard::from_json(&raw)? {
            return Ok(Spec::Wildcard(wildcard));
        }
        serde_json::from_value(raw).map(Spec::Value)
    }
}
impl<T: Serialize> Serialize for Spec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Spec::Value(v) => v.serialize(serializer),
            Spec::Wildcard(w) if w.is_short() => serializer.serialize_str(SHORT_WILDCARD),
            Spec::Wildcard(w) => w.serialize(serializer),
        }
    }
}
impl<'de, T: DeserializeOwned> Deserialize<'de> for Spec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Spec::from_json(raw).map_err(de::Error::custom)
    }
}
/// Child-property objects such as bin and scale queries.
pub trait NestedQuery: Default + Clone + PartialEq {
    fn is_empty(&self) -> bool;
}
/// A property that can be switched off, switched on with child properties,
/// or left open with a wildcard enable flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested<T> {
    Disabled,
    Enabled(T),
    Wildcard(Wildcard<bool>, T),
}
impl<T: NestedQuery> Nested<T> {
    pub fn enabled() -> Self {
        Nested::Enabled(T::default())
    }
    pub fn short_wildcard() -> Self {
        Nested::Wildcard(Wildcard::short(), T::default())
    }
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Nested::Wildcard(..))
    }
    pub fn is_enabled(&self) -> bool {
        matches!(self, Nested::Enabled(_))
    }
    /// True unless the property is concretely switched off.
    pub fn is_present(&self) -> bool {
        !matches!(self, Nested::Disabled)
    }
    pub fn inner(&self) -> Option<&T> {
        match self {
            Nested::Disabled => None,
            Nested::Enabled(t) | Nested::Wildcard(_, t) => Some(t),
        }
    }
    pub fn inner_mut(&mut self) -> Option<&mut T> {
        match self {
            Nested::Disabled => None,
            Nested::Enabled(t) | Nested::Wildcard(_, t) => Some(t),
        }
    }
    pub fn flag(&self) -> Spec<bool> {
        match self {
            Nested::Disabled => Spec::Value(false),
            Nested::Enabled(_) => Spec::Value(true),
            Nested::Wildcard(w, _) => Spec::Wildcard(w.clone()),
        }
    }
    /// Resolves the enable flag, keeping child properties when switched on.
    pub fn set_flag(&mut self, on: bool) {
        *self = if on {
            Nested::Enabled(self.inner().cloned().unwrap_or_default())
        } else {
            Nested::Disabled
        };
    }
}
impl<T: NestedQuery + Serialize> Serialize for Nested<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nested::Disabled => serializer.serialize_bool(false),
            Nested::Enabled(t) if t.is_empty() => serializer.serialize_bool(true),
            Nested::Enabled(t) => t.serialize(serializer),
            Nested::Wildcard(w, t) if t.is_empty() => w.to_json().serialize(serializer),
            Nested::Wildcard(w, t) => {
                let mut object = match serde_json::to_value(t).map_err(ser::Error::custom)? {
                    Value::Object(map) => map,
                    other => {
                        return Err(ser::Error::custom(format!(
                            "nested query must serialise to an object, got {other}"
                        )))
                    }
                };
                if let Value::Object(flag) = serde_json::to_value(w).map_err(ser::Error::custom)? {
                    object.extend(flag);
                }
                Value::Object(object).serialize(serializer)
            }
        }
    }
}
impl<'de, T: NestedQuery + DeserializeOwned> Deserialize<'de> for Nested<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Nested::from_json(raw).map_err(de::Error::custom)
    }
}
impl<T: NestedQuery + DeserializeOwned> Nested<T> {
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        match raw {
            Value::Null | Value::Bool(false) => Ok(Nested::Disabled),
            Value::Bool(true) => Ok(Nested::enabled()),
            Value::String(s) if s == SHORT_WILDCARD => Ok(Nested::short_wildcard()),
            Value::Object(mut map) => {
                let name = map.remove("name");
                let values = map.remove("enum").or_else(|| map.remove("values"));
                let child: T = serde_json::from_value(Value::Object(map))?;
                if name.is_none() && values.is_none() {
                    return Ok(Nested::Enabled(child));
                }
                let values = values.map(serde_json::from_value).transpose()?;
                let name = name.and_then(|n| n.as_str().map(str::to_string));
                Ok(Nested::Wildcard(Wildcard { name, values }, child))
            }
            other => Err(de::Error::custom(format!(
                "expected a boolean, \"?\" or an object, found {other}"
            ))),
        }
    }
}
/// Typed union of every value a wildcard can enumerate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Mark(Mark),
    Channel(Channel),
    Aggregate(Option<AggregateOp>),
    TimeUnit(Option<TimeUnit>),
    Bool(bool),
    Count(u32),
    Number(Number),
    Field(String),
    Type(FieldType),
    ScaleType(ScaleType),
    Sort(Sort),
    Json(Value),
}
impl PropertyValue {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Field(name) => f.write_str(name),
            PropertyValue::Mark(m) => f.write_str(m.as_str()),
            PropertyValue::Channel(c) => f.write_str(c.as_str()),
            PropertyValue::Type(t) => f.write_str(t.as_str()),
            PropertyValue::ScaleType(t) => f.write_str(t.as_str()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
macro_rules! property_value_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                PropertyValue::$variant(value)
            }
        })+
    };
}
property_value_from!(
    Mark => Mark,
    Channel => Channel,
    Option<AggregateOp> => Aggregate,
    Option<TimeUnit> => TimeUnit,
    bool => Bool,
    u32 => Count,
    Number => Number,
    String => Field,
    FieldType => Type,
    ScaleType => ScaleType,
    Sort => Sort,
    Value => Json,
);
impl From<SortOrder> for PropertyValue {
    fn from(order: SortOrder) -> Self {
        PropertyValue::Sort(Sort::Order(order))
    }
}
/// Conversion back from the enumerated union into a concrete slot type.
pub trait PropertyKind: Sized + Clone + Into<PropertyValue> {
    fn from_property_value(value: &PropertyValue) -> Option<Self>;
}
impl PropertyKind for Mark {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Mark(m) => Some(*m),
            _ => None,
        }
    }
}
impl PropertyKind for Channel {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Channel(c) => Some(*c),
            _ => None,
        }
    }
}
impl PropertyKind for Option<AggregateOp> {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Aggregate(a) => Some(*a),
            PropertyValue::Json(Value::Null) => Some(None),
            _ => None,
        }
    }
}
impl PropertyKind for Option<TimeUnit> {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::TimeUnit(t) => Some(*t),
            PropertyValue::Json(Value::Null) => Some(None),
            _ => None,
        }
    }
}
impl PropertyKind for bool {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
impl PropertyKind for u32 {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Count(n) => Some(*n),
            PropertyValue::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        }
    }
}
impl PropertyKind for Number {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Number(n) => Some(n.clone()),
            PropertyValue::Count(n) => Some(Number::from(*n)),
            _ => None,
        }
    }
}
impl PropertyKind for String {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Field(name) => Some(name.clone()),
            _ => None,
        }
    }
}
impl PropertyKind for FieldType {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Type(t) => Some(*t),
            _ => None,
        }
    }
}
impl PropertyKind for ScaleType {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::ScaleType(t) => Some(*t),
            _ => None,
        }
    }
}
impl PropertyKind for Sort {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Sort(s) => Some(s.clone()),
            _ => None,
        }
    }
}
impl PropertyKind for Value {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        Some(value.to_json())
    }
}
impl<T: PropertyKind> Spec<T> {
    /// The wildcard in enumerable form, or `None` when the slot is fixed.
    pub fn property_wildcard(&self) -> Option<Wildcard<PropertyValue>> {
        self.wildcard().map(|w| w.map(|v| v.clone().into()))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::BinQuery;
    use serde_json::json;
    #[test]
    fn test_spec_short_and_long_forms() {
        let short: Spec<Channel> = serde_json::from_value(json!("?")).expect("short");
        assert!(short.is_wildcard());
        let long: Spec<Channel> =
            serde_json::from_value(json!({"name": "c1", "enum": ["x", "y"]})).expect("long");
        assert_eq!(
            long,
            Spec::Wildcard(Wildcard::named("c1", vec![Channel::X, Channel::Y]))
        );
        let fixed: Spec<Channel> = serde_json::from_value(json!("row")).expect("value");
        assert_eq!(fixed, Spec::Value(Channel::Row));
        assert_eq!(serde_json::to_value(&short).expect("ser"), json!("?"));
    }
    #[test]
    fn test_nested_forms() {
        let off: Nested<BinQuery> = serde_json::from_value(json!(false)).expect("off");
        assert_eq!(off, Nested::Disabled);
        let on: Nested<BinQuery> = serde_json::from_value(json!(true)).expect("on");
        assert!(on.is_enabled());
        assert_eq!(serde_json::to_value(&on).expect("ser"), json!(true));
        let open: Nested<BinQuery> =
            serde_json::from_value(json!({"enum": [true, false], "maxbins": 10})).expect("open");
        assert!(open.is_wildcard());
        assert_eq!(
            open.inner().and_then(|b| b.maxbins.clone()),
            Some(Spec::Value(10))
        );
    }
    #[test]
    fn test_wildcard_shorthand() {
        assert_eq!(Wildcard::<u32>::short().shorthand(), "?");
        assert_eq!(Wildcard::with_values(vec![10u32, 20]).shorthand(), "?[10,20]");
    }
}

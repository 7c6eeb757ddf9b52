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

//! Canonical string form of queries.
//!
//! `mark|transform:[..]|channel:fn(field,t,key=value)|...` with encodings
//! sorted, so two queries that differ only in encoding order share one string.
//! Open values render as `?`, or `?` followed by the JSON list of candidates.

use super::encoding::{AutoCountQuery, BinQuery, FieldQuery, GuideQuery, ScaleQuery, ValueQuery, BIN_PARAMS};
use super::{from_spec, ChartSpec, EncodingQuery, SpecQuery};
use crate::error::{SerialisationError, ShorthandError, ShorthandResult};
use crate::property::Property;
use crate::shorthand_syntax_error;
use crate::vocabulary::{AggregateOp, Channel, FieldType, Mark, ScaleProperty, TimeUnit};
use crate::wildcard::{Nested, NestedQuery, Spec, Wildcard, SHORT_WILDCARD};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Properties rendered into a shorthand.
pub type Include = BTreeSet<Property>;
/// Literal value substitutions for one property.
pub type Replace = BTreeMap<String, String>;
pub type Replacers = BTreeMap<Property, Replace>;
pub static INCLUDE_ALL: Lazy<Include> = Lazy::new(|| Property::ALL.iter().copied().collect());
static FN_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z]+)\((.*)\)$").expect("function call pattern"));
fn replaced(value: &str, property: Property, replace: &Replacers) -> String {
    replace
        .get(&property)
        .and_then(|r| r.get(value))
        .cloned()
        .unwrap_or_else(|| value.to_string())
}
fn spec_value<T>(spec: &Spec<T>, property: Property, replace: &Replacers, text: impl Fn(&T) -> String) -> String
where
    T: Serialize,
{
    match spec {
        Spec::Value(v) => replaced(&text(v), property, replace),
        Spec::Wildcard(w) => w.shorthand(),
    }
}
fn to_json_string(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
/// Shorthand for a whole spec query.
pub fn spec(query: &SpecQuery, include: &Include, replace: &Replacers) -> String {
    let mut parts = Vec::new();
    if include.contains(&Property::Mark) {
        parts.push(spec_value(&query.mark, Property::Mark, replace, |m| m.as_str().to_string()));
    }
    if include.contains(&Property::Transform) {
        if let Some(transform) = query.transform.as_ref().filter(|t| !t.is_empty()) {
            parts.push(format!("transform:{}", to_json_string(transform)));
        }
    }
    let stack = include
        .contains(&Property::Stack)
        .then(|| query.stack())
        .flatten();
    let encodings = query
        .encodings
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.is_disabled_auto_count())
        .map(|(i, e)| {
            let offset = stack
                .as_ref()
                .filter(|s| s.field_index == i)
                .map(|s| s.offset.as_str());
            encoding_with_stack(e, include, replace, offset)
        })
        .filter(|s| !s.is_empty())
        .sorted()
        .join("|");
    if !encodings.is_empty() {
        parts.push(encodings);
    }
    parts.join("|")
}
/// Shorthand for a finished chart.
pub fn vl_spec(chart: &ChartSpec) -> Result<String, SerialisationError> {
    let query = from_spec(&serde_json::to_value(chart)?)?;
    Ok(spec(&query, &INCLUDE_ALL, &Replacers::new()))
}
pub fn encoding(enc: &EncodingQuery, include: &Include, replace: &Replacers) -> String {
    encoding_with_stack(enc, include, replace, None)
}
fn encoding_with_stack(
    enc: &EncodingQuery,
    include: &Include,
    replace: &Replacers,
    stack_offset: Option<&str>,
) -> String {
    let mut parts = Vec::new();
    if include.contains(&Property::Channel) {
        parts.push(spec_value(enc.channel(), Property::Channel, replace, |c| c.as_str().to_string()));
    }
    let field_def = field_def_with_stack(enc, include, replace, stack_offset);
    if !field_def.is_empty() {
        parts.push(field_def);
    }
    parts.join(":")
}
pub fn field_def(enc: &EncodingQuery, include: &Include, replace: &Replacers) -> String {
    field_def_with_stack(enc, include, replace, None)
}
fn fn_wildcard_json<T: Serialize>(wildcard: &Wildcard<T>) -> Value {
    match &wildcard.values {
        Some(values) => serde_json::to_value(values).unwrap_or(Value::Null),
        None => Value::String(SHORT_WILDCARD.to_string()),
    }
}
fn nested_param<T: NestedQuery + Serialize>(key: &str, nested: &Nested<T>, children: Map<String, Value>) -> Option<String> {
    match nested {
        Nested::Disabled => Some(format!("{key}=false")),
        Nested::Enabled(_) if children.is_empty() => None,
        Nested::Enabled(_) => Some(format!("{key}={}", to_json_string(&children))),
        Nested::Wildcard(flag, _) if children.is_empty() => Some(format!("{key}={}", flag.shorthand())),
        Nested::Wildcard(flag, _) => {
            let mut object = children;
            if let Value::Object(flag) = serde_json::to_value(flag).unwrap_or(Value::Null) {
                object.extend(flag);
            }
            Some(format!("{key}={}", to_json_string(&object)))
        }
    }
}
fn scale_children(scale: &ScaleQuery, include: &Include) -> Map<String, Value> {
    Property::Scale
        .children()
        .into_iter()
        .filter(|p| include.contains(p))
        .filter_map(|p| p.scale_property())
        .filter_map(|sp| scale.get_json(sp).map(|v| (sp.as_str().to_string(), v)))
        .collect()
}
fn guide_children(guide: &GuideQuery) -> Map<String, Value> {
    guide.0.clone()
}
fn field_def_with_stack(
    enc: &EncodingQuery,
    include: &Include,
    replace: &Replacers,
    stack_offset: Option<&str>,
) -> String {
    match enc {
        EncodingQuery::AutoCount(q) => auto_count_def(q, include, replace),
        EncodingQuery::Value(q) => match &q.value {
            Spec::Value(v) => format!("value={}", to_json_string(v)),
            Spec::Wildcard(w) => format!("value={}", w.shorthand()),
        },
        EncodingQuery::Field(q) => field_query_def(q, include, replace, stack_offset),
    }
}
fn auto_count_def(q: &AutoCountQuery, include: &Include, replace: &Replacers) -> String {
    let function = match &q.auto_count {
        Spec::Value(false) if include.contains(&Property::Aggregate) => return "-".to_string(),
        Spec::Value(false) => None,
        Spec::Value(true) if include.contains(&Property::Aggregate) => {
            Some(replaced(AggregateOp::Count.as_str(), Property::Aggregate, replace))
        }
        Spec::Value(true) => Some("autocount".to_string()),
        Spec::Wildcard(w) if include.contains(&Property::AutoCount) => {
            let mut object = Map::new();
            object.insert("autoCount".into(), fn_wildcard_json(w));
            Some(format!("{SHORT_WILDCARD}{}", to_json_string(&object)))
        }
        Spec::Wildcard(_) => None,
    };
    let mut field_and_params = if include.contains(&Property::Field) {
        replaced("*", Property::Field, replace)
    } else {
        "...".to_string()
    };
    if include.contains(&Property::Type) {
        field_and_params.push(',');
        field_and_params.push_str(&replaced("q", Property::Type, replace));
    }
    match function {
        Some(f) => format!("{f}({field_and_params})"),
        None => field_and_params,
    }
}
fn field_query_def(q: &FieldQuery, include: &Include, replace: &Replacers, stack_offset: Option<&str>) -> String {
    let mut function = None;
    if let Some(op) = q.concrete_aggregate().filter(|_| include.contains(&Property::Aggregate)) {
        function = Some(replaced(op.as_str(), Property::Aggregate, replace));
    } else if let Some(unit) = q.concrete_time_unit().filter(|_| include.contains(&Property::TimeUnit)) {
        function = Some(replaced(unit.as_str(), Property::TimeUnit, replace));
    } else if q.is_binned() && include.contains(&Property::Bin) {
        function = Some("bin".to_string());
    } else {
        let mut open = Map::new();
        if let (true, Spec::Wildcard(w)) = (include.contains(&Property::Aggregate), &q.aggregate) {
            open.insert("aggregate".into(), fn_wildcard_json(w));
        }
        if let (true, Spec::Wildcard(w)) = (include.contains(&Property::TimeUnit), &q.time_unit) {
            open.insert("timeUnit".into(), fn_wildcard_json(w));
        }
        if let (true, Some(Nested::Wildcard(w, _))) = (include.contains(&Property::Bin), &q.bin) {
            open.insert("bin".into(), fn_wildcard_json(w));
        }
        if !open.is_empty() {
            if q.has_fn {
                open.insert("hasFn".into(), Value::Bool(true));
            }
            function = Some(format!("{SHORT_WILDCARD}{}", to_json_string(&open)));
        }
    }
    let mut out = if include.contains(&Property::Field) {
        spec_value(&q.field, Property::Field, replace, String::clone)
    } else {
        "...".to_string()
    };
    if include.contains(&Property::Type) {
        out.push(',');
        out.push_str(&spec_value(&q.field_type, Property::Type, replace, |t| {
            t.letter().to_string()
        }));
    }
    let channel = q.channel.value().copied();
    let mut params = Vec::new();
    if include.contains(&Property::Bin) {
        if let Some(bin) = q.bin.as_ref().and_then(Nested::inner) {
            for (key, value) in bin.params() {
                if key == "maxbins" && !include.contains(&Property::BinMaxBins) {
                    continue;
                }
                let rendered = match (key, &bin.maxbins) {
                    ("maxbins", Some(Spec::Wildcard(w))) => w.shorthand(),
                    _ => to_json_string(&value),
                };
                params.push(format!("{key}={rendered}"));
            }
        }
    }
    if include.contains(&Property::Scale) {
        if let Some(scale) = &q.scale {
            let children = scale.inner().map(|s| scale_children(s, include)).unwrap_or_default();
            params.extend(nested_param("scale", scale, children));
        }
    }
    if include.contains(&Property::Sort) {
        if let Some(sort) = &q.sort {
            let rendered = match sort {
                Spec::Value(s) => to_json_string(s),
                Spec::Wildcard(w) => w.shorthand(),
            };
            params.push(format!("sort={rendered}"));
        }
    }
    if include.contains(&Property::Axis) && channel.map_or(true, |c| c.supports_axis()) {
        if let Some(axis) = &q.axis {
            let children = axis.inner().map(guide_children).unwrap_or_default();
            params.extend(nested_param("axis", axis, children));
        }
    }
    if include.contains(&Property::Legend) && channel.map_or(true, |c| c.supports_legend()) {
        if let Some(legend) = &q.legend {
            let children = legend.inner().map(guide_children).unwrap_or_default();
            params.extend(nested_param("legend", legend, children));
        }
    }
    if let Some(offset) = stack_offset {
        params.push(format!("stack={}", to_json_string(&offset)));
    }
    for param in params {
        out.push(',');
        out.push_str(&param);
    }
    match function {
        Some(f) => format!("{f}({out})"),
        None => out,
    }
}
/// Splits `s` at the first `count` occurrences of `delim` into exactly
/// `count + 1` parts; the last part keeps the rest, missing parts are empty.
pub fn split_with_tail(s: &str, delim: &str, count: usize) -> Vec<String> {
    let mut parts: Vec<String> = s.splitn(count + 1, delim).map(str::to_string).collect();
    parts.resize(count + 1, String::new());
    parts
}
/// Index of the bracket closing the one at `open`, skipping JSON strings.
fn matching_close(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
/// Splits on `delim` outside brackets and JSON strings.
fn split_top_level(s: &str, delim: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, &b) in s.as_bytes().iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => depth -= 1,
            _ if b == delim && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
fn parse_json<T: DeserializeOwned>(fragment: &str) -> ShorthandResult<T> {
    serde_json::from_str(fragment).map_err(|source| ShorthandError::InvalidJson {
        fragment: fragment.to_string(),
        source,
    })
}
fn json_value<T: DeserializeOwned>(fragment: &str, value: Value) -> ShorthandResult<T> {
    serde_json::from_value(value).map_err(|source| ShorthandError::InvalidJson {
        fragment: fragment.to_string(),
        source,
    })
}
/// `?`, `?[..]` or a concrete token.
fn parse_spec<T: DeserializeOwned>(
    token: &str,
    concrete: impl FnOnce(&str) -> ShorthandResult<T>,
) -> ShorthandResult<Spec<T>> {
    if token == SHORT_WILDCARD {
        return Ok(Spec::short_wildcard());
    }
    match token.strip_prefix(SHORT_WILDCARD) {
        Some(list) => Ok(Spec::Wildcard(Wildcard::with_values(parse_json(list)?))),
        None => concrete(token).map(Spec::Value),
    }
}
/// Parameter value: JSON, or `?`-prefixed wildcard in its JSON object form.
fn param_value(raw: &str) -> ShorthandResult<Value> {
    if raw == SHORT_WILDCARD {
        return Ok(Value::String(SHORT_WILDCARD.to_string()));
    }
    if let Some(list) = raw.strip_prefix(SHORT_WILDCARD) {
        let values: Value = parse_json(list)?;
        let mut object = Map::new();
        object.insert("enum".into(), values);
        return Ok(Value::Object(object));
    }
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}
/// Splits `key=value,key=value` where values may be bracketed JSON.
fn parse_params(input: &str, params: &str) -> ShorthandResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut rest = params;
    while !rest.is_empty() {
        let (key, after) = rest
            .split_once('=')
            .ok_or_else(|| shorthand_syntax_error!(input, "parameter '{rest}' has no value"))?;
        let bracket = after.trim_start_matches(SHORT_WILDCARD);
        let value_len = if bracket.starts_with(['[', '{']) {
            let offset = after.len() - bracket.len();
            let close = matching_close(after, offset)
                .ok_or_else(|| shorthand_syntax_error!(input, "unbalanced brackets in '{after}'"))?;
            close + 1
        } else if after.starts_with('"') {
            let close = after[1..]
                .find('"')
                .ok_or_else(|| shorthand_syntax_error!(input, "unterminated string in '{after}'"))?;
            close + 2
        } else {
            after.find(',').unwrap_or(after.len())
        };
        out.push((key.to_string(), after[..value_len].to_string()));
        rest = &after[value_len..];
        if let Some(next) = rest.strip_prefix(',') {
            rest = next;
        } else if !rest.is_empty() {
            return Err(shorthand_syntax_error!(input, "expected ',' before '{rest}'"));
        }
    }
    Ok(out)
}
fn parse_nested<T: NestedQuery + DeserializeOwned>(raw: &str) -> ShorthandResult<Nested<T>> {
    let value = param_value(raw)?;
    Nested::from_json(value).map_err(|source| ShorthandError::InvalidJson {
        fragment: raw.to_string(),
        source,
    })
}
/// Parses `field,t,key=value,...`. Bin parameters are returned separately so
/// the caller can attach them to whichever bin the function part declares.
pub fn parse_raw_field_def(
    channel: Spec<Channel>,
    field_def: &str,
) -> ShorthandResult<(FieldQuery, Option<BinQuery>)> {
    let parts = split_with_tail(field_def, ",", 2);
    let field = parse_spec(&parts[0], |f| Ok(f.to_string()))?;
    let field_type = if parts[1].is_empty() {
        Spec::short_wildcard()
    } else {
        parse_spec(&parts[1], |t| {
            FieldType::from_letter(t)
                .ok_or_else(|| shorthand_syntax_error!(field_def, "unknown type '{t}'"))
        })?
    };
    let mut query = FieldQuery {
        field,
        field_type,
        ..FieldQuery::new(channel, "", FieldType::Quantitative)
    };
    let mut bin: Option<BinQuery> = None;
    for (key, raw) in parse_params(field_def, &parts[2])? {
        match key.as_str() {
            k if BIN_PARAMS.contains(&k) => {
                let value = param_value(&raw)?;
                bin.get_or_insert_with(BinQuery::default)
                    .set_param(k, value)
                    .map_err(|source| ShorthandError::InvalidJson {
                        fragment: raw.clone(),
                        source,
                    })?;
            }
            "scale" => query.scale = Some(parse_nested(&raw)?),
            "axis" => query.axis = Some(parse_nested(&raw)?),
            "legend" => query.legend = Some(parse_nested(&raw)?),
            "sort" => {
                let value = param_value(&raw)?;
                query.sort = Some(Spec::from_json(value).map_err(|source| {
                    ShorthandError::InvalidJson {
                        fragment: raw.clone(),
                        source,
                    }
                })?);
            }
            "stack" => {}
            other => {
                return Err(shorthand_syntax_error!(field_def, "unknown parameter '{other}'"));
            }
        }
    }
    Ok((query, bin))
}
fn fn_wildcard<T: DeserializeOwned>(fragment: &str, value: Value) -> ShorthandResult<Wildcard<T>> {
    match value {
        Value::String(s) if s == SHORT_WILDCARD => Ok(Wildcard::short()),
        Value::Array(values) => Ok(Wildcard::with_values(json_value(fragment, Value::Array(values))?)),
        other => Err(shorthand_syntax_error!(fragment, "'{other}' is not a wildcard")),
    }
}
fn reject_bin_params(input: &str, bin: &Option<BinQuery>) -> ShorthandResult<()> {
    match bin {
        Some(_) => Err(shorthand_syntax_error!(input, "bin parameters without a bin function")),
        None => Ok(()),
    }
}
/// Parses the part after `channel:`.
pub fn parse_field_def(channel: Spec<Channel>, field_def: &str) -> ShorthandResult<EncodingQuery> {
    if field_def == "-" {
        return Ok(EncodingQuery::auto_count(channel, false));
    }
    if let Some(raw) = field_def.strip_prefix("value=") {
        let value = Spec::from_json(param_value(raw)?).map_err(|source| ShorthandError::InvalidJson {
            fragment: raw.to_string(),
            source,
        })?;
        return Ok(EncodingQuery::Value(ValueQuery { channel, value }));
    }
    if field_def.starts_with("?{") {
        return parse_wildcard_fn(channel, field_def);
    }
    let Some(captures) = FN_CALL.captures(field_def) else {
        let (query, bin) = parse_raw_field_def(channel, field_def)?;
        reject_bin_params(field_def, &bin)?;
        return Ok(query.into());
    };
    let name = captures.get(1).map_or("", |m| m.as_str());
    let inner = captures.get(2).map_or("", |m| m.as_str());
    if name == "autocount" {
        return Ok(EncodingQuery::auto_count(channel, true));
    }
    let (mut query, bin) = parse_raw_field_def(channel, inner)?;
    if name == "bin" {
        query.bin = Some(Nested::Enabled(bin.unwrap_or_default()));
        return Ok(query.into());
    }
    reject_bin_params(field_def, &bin)?;
    if let Ok(op) = name.parse::<AggregateOp>() {
        query.aggregate = Spec::Value(Some(op));
    } else if let Ok(unit) = name.parse::<TimeUnit>() {
        query.time_unit = Spec::Value(Some(unit));
    } else {
        return Err(shorthand_syntax_error!(field_def, "unknown function '{name}'"));
    }
    Ok(query.into())
}
fn parse_wildcard_fn(channel: Spec<Channel>, field_def: &str) -> ShorthandResult<EncodingQuery> {
    let close = matching_close(field_def, 1)
        .ok_or_else(|| shorthand_syntax_error!(field_def, "unbalanced function wildcard"))?;
    let fragment = &field_def[1..=close];
    let inner = field_def[close + 1..]
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| shorthand_syntax_error!(field_def, "expected '(' after function wildcard"))?;
    let object: Map<String, Value> = parse_json(fragment)?;
    if let Some(auto_count) = object.get("autoCount") {
        let wildcard = fn_wildcard(fragment, auto_count.clone())?;
        return Ok(EncodingQuery::auto_count(channel, Spec::Wildcard(wildcard)));
    }
    let (mut query, bin) = parse_raw_field_def(channel, inner)?;
    let mut bin = bin;
    for (key, value) in object {
        match key.as_str() {
            "aggregate" => query.aggregate = Spec::Wildcard(fn_wildcard(fragment, value)?),
            "timeUnit" => query.time_unit = Spec::Wildcard(fn_wildcard(fragment, value)?),
            "bin" => {
                let flag = fn_wildcard(fragment, value)?;
                query.bin = Some(Nested::Wildcard(flag, bin.take().unwrap_or_default()));
            }
            "hasFn" => query.has_fn = value.as_bool().unwrap_or(false),
            other => {
                return Err(shorthand_syntax_error!(field_def, "unknown function property '{other}'"));
            }
        }
    }
    reject_bin_params(field_def, &bin)?;
    Ok(query.into())
}
/// Parses `channel:fieldDef`.
pub fn parse_encoding(channel: &str, field_def: &str) -> ShorthandResult<EncodingQuery> {
    let channel = parse_spec(channel, |c| Ok(c.parse::<Channel>()?))?;
    parse_field_def(channel, field_def)
}
/// Parses a full shorthand back into a query.
pub fn parse(shorthand: &str) -> ShorthandResult<SpecQuery> {
    let parts = split_top_level(shorthand, b'|');
    let (mark, rest) = parts
        .split_first()
        .filter(|(m, _)| !m.is_empty())
        .ok_or_else(|| shorthand_syntax_error!(shorthand, "missing mark"))?;
    let mark = parse_spec(mark, |m| Ok(m.parse::<Mark>()?))?;
    let mut query = SpecQuery::new(mark, Vec::new());
    for part in rest {
        if let Some(transform) = part.strip_prefix("transform:") {
            query.transform = Some(parse_json(transform)?);
            continue;
        }
        let pieces = split_with_tail(part, ":", 1);
        if pieces[1].is_empty() {
            return Err(shorthand_syntax_error!(shorthand, "encoding '{part}' has no channel"));
        }
        query.encodings.push(parse_encoding(&pieces[0], &pieces[1])?);
    }
    Ok(query)
}
/// Shorthand of a scale query with every property included.
pub fn scale(scale: &ScaleQuery) -> String {
    let include: Include = ScaleProperty::ALL
        .iter()
        .map(|sp| match sp {
            ScaleProperty::Type => Property::ScaleType,
            ScaleProperty::Domain => Property::ScaleDomain,
            ScaleProperty::Range => Property::ScaleRange,
            ScaleProperty::Clamp => Property::ScaleClamp,
            ScaleProperty::Nice => Property::ScaleNice,
            ScaleProperty::Round => Property::ScaleRound,
            ScaleProperty::Exponent => Property::ScaleExponent,
            ScaleProperty::Zero => Property::ScaleZero,
            ScaleProperty::UseRawDomain => Property::ScaleUseRawDomain,
            ScaleProperty::BandSize => Property::ScaleBandSize,
        })
        .collect();
    to_json_string(&scale_children(scale, &include))
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_split_with_tail() {
        assert_eq!(split_with_tail("012-345-678-9", "-", 2), vec!["012", "345", "678-9"]);
        assert_eq!(split_with_tail("012-345", "-", 3), vec!["012", "345", "", ""]);
    }
    #[test]
    fn test_split_top_level_respects_json() {
        let parts = split_top_level(r#"point|transform:[{"filter":"a || b"}]|x:a,q"#, b'|');
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], r#"transform:[{"filter":"a || b"}]"#);
    }
    #[test]
    fn test_parse_params_with_brackets() {
        let params = parse_params("t", r#"scale={"domain":[1,2]},maxbins=?[10,20],sort="ascending""#)
            .expect("params");
        assert_eq!(
            params,
            vec![
                ("scale".to_string(), r#"{"domain":[1,2]}"#.to_string()),
                ("maxbins".to_string(), "?[10,20]".to_string()),
                ("sort".to_string(), r#""ascending""#.to_string()),
            ]
        );
    }
}

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

//! Groups ranked candidates into a tree keyed by partial shorthands.
//!
//! A level's key is the shorthand of each candidate restricted to the
//! properties that level includes, with channel names folded together by the
//! level's replace maps. Includes and replace maps accumulate downward, so a
//! child group always refines its parent.

use crate::model::SpecQueryModel;
use crate::property::Property;
use crate::query::shorthand::{Include, Replace, Replacers, INCLUDE_ALL};
use crate::ranking::RankingScore;
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub const FIELD: &str = "field";
pub const FIELD_TRANSFORM: &str = "fieldTransform";
pub const ENCODING: &str = "encoding";
pub const TRANSPOSE: &str = "transpose";
pub const SPEC: &str = "spec";
const FIELD_PROPERTIES: [Property; 5] = [
    Property::Field,
    Property::Type,
    Property::Aggregate,
    Property::Bin,
    Property::TimeUnit,
];
/// One property of a custom grouping key, with optional value substitutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyGroupBy {
    Property(Property),
    Replaced { property: Property, replace: Replace },
}
impl PropertyGroupBy {
    pub fn property(&self) -> Property {
        match self {
            PropertyGroupBy::Property(p) | PropertyGroupBy::Replaced { property: p, .. } => *p,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupBy {
    Named(String),
    Properties(Vec<PropertyGroupBy>),
}
impl GroupBy {
    pub fn field() -> Self {
        GroupBy::Named(FIELD.to_string())
    }
    pub fn encoding() -> Self {
        GroupBy::Named(ENCODING.to_string())
    }
    pub fn transpose() -> Self {
        GroupBy::Named(TRANSPOSE.to_string())
    }
    /// Properties and replace maps this key adds to its level.
    pub fn parse(&self) -> Option<(Include, Replacers)> {
        let name = match self {
            GroupBy::Named(name) => name.as_str(),
            GroupBy::Properties(list) => {
                let mut include = Include::new();
                let mut replacers = Replacers::new();
                for entry in list {
                    include.insert(entry.property());
                    if let PropertyGroupBy::Replaced { property, replace } = entry {
                        replacers.insert(*property, replace.clone());
                    }
                }
                return Some((include, replacers));
            }
        };
        let mut include: Include = FIELD_PROPERTIES.into_iter().collect();
        let mut replacers = Replacers::new();
        match name {
            FIELD => {}
            FIELD_TRANSFORM => {
                include.insert(Property::Stack);
            }
            ENCODING => {
                include.extend([Property::Stack, Property::Channel]);
                replacers.insert(Property::Channel, channel_replace(true));
            }
            TRANSPOSE => {
                include.extend([Property::Stack, Property::Channel, Property::Mark]);
                replacers.insert(Property::Channel, channel_replace(false));
            }
            SPEC => include = INCLUDE_ALL.clone(),
            _ => return None,
        }
        Some((include, replacers))
    }
}
fn channel_replace(fold_style: bool) -> Replace {
    let mut replace: Replace = [("x", "xy"), ("y", "xy"), ("row", "facet"), ("column", "facet")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    if fold_style {
        for channel in ["color", "size", "shape", "opacity"] {
            replace.insert(channel.to_string(), "style".to_string());
        }
    }
    replace
}
/// One level of grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nest {
    pub group_by: GroupBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_group_by: Option<String>,
}
impl Nest {
    pub fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            order_group_by: None,
        }
    }
}
#[derive(Debug, Clone)]
pub enum ResultItem {
    Group(ResultTree),
    Model(Box<SpecQueryModel>),
}
#[derive(Debug, Clone, Default)]
pub struct ResultTree {
    pub name: String,
    pub path: String,
    pub items: Vec<ResultItem>,
}
impl ResultTree {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            items: Vec::new(),
        }
    }
    pub fn flat(models: Vec<SpecQueryModel>) -> Self {
        let mut tree = ResultTree::new("", "");
        tree.items = models.into_iter().map(|m| ResultItem::Model(Box::new(m))).collect();
        tree
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// Best candidate: the first leaf reached by always taking the first child.
    pub fn top(&self) -> Option<&SpecQueryModel> {
        match self.items.first()? {
            ResultItem::Group(group) => group.top(),
            ResultItem::Model(model) => Some(model),
        }
    }
    pub fn models(&self) -> Vec<&SpecQueryModel> {
        let mut out = Vec::new();
        self.collect_models(&mut out);
        out
    }
    fn collect_models<'a>(&'a self, out: &mut Vec<&'a SpecQueryModel>) {
        for item in &self.items {
            match item {
                ResultItem::Group(group) => group.collect_models(out),
                ResultItem::Model(model) => out.push(model),
            }
        }
    }
    pub fn into_models(self) -> Vec<SpecQueryModel> {
        let mut out = Vec::new();
        for item in self.items {
            match item {
                ResultItem::Group(group) => out.extend(group.into_models()),
                ResultItem::Model(model) => out.push(*model),
            }
        }
        out
    }
}
/// Free-function form of [`ResultTree::top`].
pub fn get_top(tree: &ResultTree) -> Option<&SpecQueryModel> {
    tree.top()
}
impl Serialize for ResultTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResultTree", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("items", &self.items)?;
        state.end()
    }
}
impl Serialize for ResultItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultItem::Group(group) => group.serialize(serializer),
            ResultItem::Model(model) => {
                let scores: BTreeMap<&str, &RankingScore> = model.ranking_scores().collect();
                let mut state = serializer.serialize_struct("Candidate", 3)?;
                state.serialize_field("shorthand", &model.to_shorthand())?;
                state.serialize_field("spec", &model.to_spec())?;
                state.serialize_field("scores", &scores)?;
                state.end()
            }
        }
    }
}
/// Groups `models` level by level; keeps the incoming order inside every group.
pub fn nest(models: Vec<SpecQueryModel>, nests: &[Nest]) -> ResultTree {
    if nests.is_empty() {
        return ResultTree::flat(models);
    }
    let mut root = ResultTree::new("", "");
    group_into(&mut root, models, nests, &Include::new(), &Replacers::new());
    root
}
fn group_into(
    tree: &mut ResultTree,
    models: Vec<SpecQueryModel>,
    nests: &[Nest],
    include: &Include,
    replacers: &Replacers,
) {
    let Some((level, rest)) = nests.split_first() else {
        tree.items = models.into_iter().map(|m| ResultItem::Model(Box::new(m))).collect();
        return;
    };
    let mut include = include.clone();
    let mut replacers = replacers.clone();
    if let Some((more, replace)) = level.group_by.parse() {
        include.extend(more);
        for (property, map) in replace {
            replacers.entry(property).or_default().extend(map);
        }
    }
    let mut groups: IndexMap<String, Vec<SpecQueryModel>> = IndexMap::new();
    for model in models {
        let key = model.to_shorthand_with(&include, &replacers);
        groups.entry(key).or_default().push(model);
    }
    for (key, members) in groups {
        let path = format!("{}/{}", tree.path, key);
        let mut child = ResultTree::new(key, path);
        group_into(&mut child, members, rest, &include, &replacers);
        tree.items.push(ResultItem::Group(child));
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_named_keys_accumulate_channel_folding() {
        let (include, replacers) = GroupBy::encoding().parse().expect("known key");
        assert!(include.contains(&Property::Channel));
        assert!(!include.contains(&Property::Mark));
        let channel = &replacers[&Property::Channel];
        assert_eq!(channel["x"], "xy");
        assert_eq!(channel["size"], "style");
        let (include, replacers) = GroupBy::transpose().parse().expect("known key");
        assert!(include.contains(&Property::Mark));
        assert!(!replacers[&Property::Channel].contains_key("color"));
        assert!(GroupBy::Named("nonsense".into()).parse().is_none());
    }
    #[test]
    fn test_custom_group_by_reads_from_json() {
        let raw = serde_json::json!({
            "groupBy": ["field", {"property": "channel", "replace": {"x": "xy", "y": "xy"}}]
        });
        let nest: Nest = serde_json::from_value(raw).expect("nest");
        let (include, replacers) = nest.group_by.parse().expect("list");
        assert_eq!(include.len(), 2);
        assert_eq!(replacers[&Property::Channel]["y"], "xy");
    }
}

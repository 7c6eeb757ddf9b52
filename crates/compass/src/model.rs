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

//! Working copy of a query used during enumeration.
//!
//! A [`SpecQueryModel`] owns its own encoding list and assignment map, while
//! the query as it was built and its [`WildcardIndex`] sit behind an `Arc` and
//! are shared read-only by every clone taken along the search.

use crate::config::QueryConfig;
use crate::error::{ModelError, ModelResult};
use crate::property::Property;
use crate::query::shorthand::{self, Include, Replacers, INCLUDE_ALL};
use crate::query::{ChartSpec, EncodingQuery, SpecQuery, StackProperties};
use crate::ranking::RankingScore;
use crate::schema::Schema;
use crate::vocabulary::{Channel, Mark};
use crate::wildcard::{PropertyValue, Spec, Wildcard};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub type EncodingWildcards = IndexMap<Property, Wildcard<PropertyValue>>;
/// Where the open slots of a built query live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WildcardIndex {
    pub mark: Option<Wildcard<Mark>>,
    pub encodings: BTreeMap<usize, EncodingWildcards>,
    pub encoding_indices_by_property: IndexMap<Property, Vec<usize>>,
}
impl WildcardIndex {
    pub fn set_mark(&mut self, wildcard: Wildcard<Mark>) {
        self.mark = Some(wildcard);
    }
    pub fn set_encoding_property(&mut self, index: usize, property: Property, wildcard: Wildcard<PropertyValue>) {
        self.encodings.entry(index).or_default().insert(property, wildcard);
        let indices = self.encoding_indices_by_property.entry(property).or_default();
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    pub fn has_property(&self, property: Property) -> bool {
        if property == Property::Mark {
            return self.mark.is_some();
        }
        self.encoding_indices_by_property
            .get(&property)
            .is_some_and(|indices| !indices.is_empty())
    }
    pub fn encoding_indices(&self, property: Property) -> &[usize] {
        self.encoding_indices_by_property
            .get(&property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
    pub fn encoding_wildcards(&self, index: usize) -> Option<&EncodingWildcards> {
        self.encodings.get(&index)
    }
    pub fn encoding_wildcard(&self, index: usize, property: Property) -> Option<&Wildcard<PropertyValue>> {
        self.encodings.get(&index)?.get(&property)
    }
    pub fn is_empty(&self) -> bool {
        self.mark.is_none() && self.encodings.is_empty()
    }
    /// Every wildcard name in the index, mark first.
    pub fn names(&self) -> Vec<&str> {
        self.mark
            .iter()
            .filter_map(|w| w.name.as_deref())
            .chain(
                self.encodings
                    .values()
                    .flat_map(|e| e.values())
                    .filter_map(|w| w.name.as_deref()),
            )
            .collect()
    }
}
/// State shared by every clone of one built model.
#[derive(Debug)]
pub struct ModelContext {
    pub origin: SpecQuery,
    pub wildcard_index: WildcardIndex,
    pub default_spec_config: Map<String, Value>,
}
#[derive(Debug, Clone)]
pub struct SpecQueryModel {
    spec: SpecQuery,
    context: Arc<ModelContext>,
    channel_count: BTreeMap<Channel, usize>,
    assignment: BTreeMap<String, PropertyValue>,
    ranking_scores: BTreeMap<String, RankingScore>,
}
fn counted_channel(enc: &EncodingQuery) -> Option<Channel> {
    if enc.is_disabled_auto_count() {
        return None;
    }
    enc.concrete_channel()
}
fn fill_mark(mark: &mut Spec<Mark>, config: &QueryConfig) -> Option<Wildcard<Mark>> {
    let Spec::Wildcard(wildcard) = mark else {
        return None;
    };
    if wildcard.name.is_none() {
        wildcard.name = Some(Property::Mark.default_name().to_string());
    }
    if wildcard.values.is_none() {
        wildcard.values = Some(config.marks.clone());
    }
    Some(wildcard.clone())
}
impl SpecQueryModel {
    /// Names every wildcard, fills default candidate lists and records the
    /// open slots. With `auto_add_count` an auto count encoding whose channel
    /// and flag are both open is appended.
    pub fn build(query: &SpecQuery, schema: &dyn Schema, config: &QueryConfig) -> ModelResult<Self> {
        if let Err(value) = query.stack_offset() {
            return Err(ModelError::InvalidStackOffset {
                value: value.to_string(),
            });
        }
        let mut spec = query.clone();
        let mut index = WildcardIndex::default();
        if let Some(wildcard) = fill_mark(&mut spec.mark, config) {
            index.set_mark(wildcard);
        }
        for (i, enc) in spec.encodings.iter_mut().enumerate() {
            for (property, wildcard) in enc.init_wildcards(i, schema, config) {
                index.set_encoding_property(i, property, wildcard);
            }
        }
        if config.auto_add_count {
            let i = spec.encodings.len();
            let channel = Wildcard::named(
                format!("{}{i}", Property::Channel.default_name()),
                config.channels.clone(),
            );
            let flag = Wildcard::named(format!("{}{i}", Property::AutoCount.default_name()), vec![false, true]);
            index.set_encoding_property(i, Property::Channel, channel.map(|c| PropertyValue::from(*c)));
            index.set_encoding_property(i, Property::AutoCount, flag.map(|b| PropertyValue::from(*b)));
            spec.encodings
                .push(EncodingQuery::auto_count(Spec::Wildcard(channel), Spec::Wildcard(flag)));
        }
        let wildcard_count = {
            let mut seen = HashSet::new();
            for name in index.names() {
                if !seen.insert(name) {
                    return Err(ModelError::DuplicateWildcardName {
                        name: name.to_string(),
                    });
                }
            }
            seen.len()
        };
        debug!(
            wildcards = wildcard_count,
            encodings = spec.encodings.len(),
            "query model built"
        );
        let channel_count = spec.encodings.iter().filter_map(counted_channel).fold(
            BTreeMap::new(),
            |mut counts, channel| {
                *counts.entry(channel).or_insert(0) += 1;
                counts
            },
        );
        Ok(Self {
            context: Arc::new(ModelContext {
                origin: spec.clone(),
                wildcard_index: index,
                default_spec_config: config.default_spec_config.clone(),
            }),
            spec,
            channel_count,
            assignment: BTreeMap::new(),
            ranking_scores: BTreeMap::new(),
        })
    }
    pub fn wildcard_index(&self) -> &WildcardIndex {
        &self.context.wildcard_index
    }
    pub fn spec_query(&self) -> &SpecQuery {
        &self.spec
    }
    pub fn origin(&self) -> &SpecQuery {
        &self.context.origin
    }
    /// Values picked so far, keyed by wildcard name.
    pub fn assignment(&self) -> &BTreeMap<String, PropertyValue> {
        &self.assignment
    }
    pub fn mark(&self) -> &Spec<Mark> {
        &self.spec.mark
    }
    pub fn set_mark(&mut self, mark: Mark) -> ModelResult<()> {
        let name = self
            .context
            .wildcard_index
            .mark
            .as_ref()
            .and_then(|w| w.name.clone())
            .ok_or(ModelError::MarkNotAWildcard)?;
        self.spec.mark = Spec::Value(mark);
        self.assignment.insert(name, PropertyValue::Mark(mark));
        Ok(())
    }
    pub fn reset_mark(&mut self) {
        if let Some(wildcard) = &self.context.wildcard_index.mark {
            if let Some(name) = &wildcard.name {
                self.assignment.remove(name);
            }
            self.spec.mark = Spec::Wildcard(wildcard.clone());
        }
    }
    /// Encodings that take part in the output; disabled auto counts are left out.
    pub fn encodings(&self) -> impl Iterator<Item = &EncodingQuery> + '_ {
        self.spec.encodings.iter().filter(|e| !e.is_disabled_auto_count())
    }
    pub fn encoding(&self, index: usize) -> Option<&EncodingQuery> {
        self.spec.encodings.get(index)
    }
    pub fn encoding_count(&self) -> usize {
        self.spec.encodings.len()
    }
    pub fn encoding_by_channel(&self, channel: Channel) -> Option<&EncodingQuery> {
        self.encodings().find(|e| e.channel().is(&channel))
    }
    fn slot_name(&self, index: usize, property: Property) -> ModelResult<String> {
        if index >= self.spec.encodings.len() {
            return Err(ModelError::EncodingOutOfRange {
                index,
                len: self.spec.encodings.len(),
            });
        }
        self.context
            .wildcard_index
            .encoding_wildcard(index, property)
            .and_then(|w| w.name.clone())
            .ok_or_else(|| ModelError::NotAWildcard {
                property: property.to_string(),
                index,
            })
    }
    fn track_channel(&mut self, before: Option<Channel>, after: Option<Channel>) {
        if before == after {
            return;
        }
        if let Some(channel) = before {
            if let Some(count) = self.channel_count.get_mut(&channel) {
                *count = count.saturating_sub(1);
            }
        }
        if let Some(channel) = after {
            *self.channel_count.entry(channel).or_insert(0) += 1;
        }
    }
    pub fn set_encoding_property(&mut self, index: usize, property: Property, value: &PropertyValue) -> ModelResult<()> {
        let name = self.slot_name(index, property)?;
        let context = Arc::clone(&self.context);
        let enc = &mut self.spec.encodings[index];
        let before = counted_channel(enc);
        // A nested flag switched back on takes its child properties from the built query.
        if property.has_nested_children() {
            if let Some(origin) = context.origin.encodings.get(index) {
                enc.reset_property(property, origin);
            }
        }
        enc.set_property(property, value)?;
        let after = counted_channel(enc);
        self.track_channel(before, after);
        self.assignment.insert(name, value.clone());
        Ok(())
    }
    /// Puts the wildcard for `property` back and forgets its assignment.
    pub fn reset_encoding_property(&mut self, index: usize, property: Property) -> ModelResult<()> {
        let name = self.slot_name(index, property)?;
        let context = Arc::clone(&self.context);
        let origin = context
            .origin
            .encodings
            .get(index)
            .ok_or(ModelError::EncodingOutOfRange {
                index,
                len: context.origin.encodings.len(),
            })?;
        let enc = &mut self.spec.encodings[index];
        let before = counted_channel(enc);
        enc.reset_property(property, origin);
        let after = counted_channel(enc);
        self.track_channel(before, after);
        self.assignment.remove(&name);
        Ok(())
    }
    pub fn channel_used(&self, channel: Channel) -> bool {
        self.channel_count.get(&channel).is_some_and(|n| *n > 0)
    }
    pub fn is_dimension(&self, channel: Channel) -> bool {
        self.encoding_by_channel(channel).is_some_and(EncodingQuery::is_dimension)
    }
    pub fn is_measure(&self, channel: Channel) -> bool {
        self.encoding_by_channel(channel).is_some_and(EncodingQuery::is_measure)
    }
    pub fn is_aggregate(&self) -> bool {
        self.spec.is_aggregate()
    }
    pub fn stack(&self) -> Option<StackProperties> {
        self.spec.stack()
    }
    /// The finished chart, or `None` while any required slot is open.
    pub fn to_spec(&self) -> Option<ChartSpec> {
        self.spec.to_chart_spec(&self.context.default_spec_config)
    }
    pub fn to_shorthand(&self) -> String {
        shorthand::spec(&self.spec, &INCLUDE_ALL, &Replacers::new())
    }
    pub fn to_shorthand_with(&self, include: &Include, replace: &Replacers) -> String {
        shorthand::spec(&self.spec, include, replace)
    }
    pub fn ranking_score(&self, name: &str) -> Option<&RankingScore> {
        self.ranking_scores.get(name)
    }
    pub fn ranking_scores(&self) -> impl Iterator<Item = (&str, &RankingScore)> + '_ {
        self.ranking_scores.iter().map(|(name, score)| (name.as_str(), score))
    }
    pub fn set_ranking_score(&mut self, name: impl Into<String>, score: RankingScore) {
        self.ranking_scores.insert(name.into(), score);
    }
    pub(crate) fn spec_mut(&mut self) -> &mut SpecQuery {
        &mut self.spec
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldQuery;
    use crate::schema::{FieldSchema, TableSchema};
    use crate::vocabulary::{FieldType, PrimitiveType};
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            FieldSchema::new("a", FieldType::Quantitative, PrimitiveType::Number, 100),
            FieldSchema::new("b", FieldType::Nominal, PrimitiveType::String, 5),
        ])
        .expect("schema")
    }
    #[test]
    fn test_channel_count_follows_set_and_reset() {
        let mut field = FieldQuery::new(Channel::X, "a", FieldType::Quantitative);
        field.channel = Spec::short_wildcard();
        let query = SpecQuery::new(Mark::Point, vec![field.into()]);
        let mut model = SpecQueryModel::build(&query, &schema(), &QueryConfig::default()).expect("build");
        assert!(!model.channel_used(Channel::X));
        model
            .set_encoding_property(0, Property::Channel, &PropertyValue::Channel(Channel::X))
            .expect("set");
        assert!(model.channel_used(Channel::X));
        assert_eq!(model.assignment().get("c0"), Some(&PropertyValue::Channel(Channel::X)));
        model.reset_encoding_property(0, Property::Channel).expect("reset");
        assert!(!model.channel_used(Channel::X));
        assert!(model.assignment().is_empty());
    }
    #[test]
    fn test_setting_a_fixed_slot_fails() {
        let query = SpecQuery::new(
            Mark::Point,
            vec![FieldQuery::new(Channel::X, "a", FieldType::Quantitative).into()],
        );
        let mut model = SpecQueryModel::build(&query, &schema(), &QueryConfig::default()).expect("build");
        let err = model
            .set_encoding_property(0, Property::Field, &PropertyValue::Field("b".into()))
            .expect_err("not a wildcard");
        assert!(matches!(err, ModelError::NotAWildcard { .. }));
        assert!(matches!(model.set_mark(Mark::Bar), Err(ModelError::MarkNotAWildcard)));
    }
}

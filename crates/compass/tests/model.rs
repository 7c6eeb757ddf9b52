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


mod common;

use compass::error::ModelError;
use compass::query::{BinQuery, GuideQuery, ScaleQuery};
use compass::wildcard::PropertyValue;
use compass::{
    generate, Channel, EncodingQuery, FieldQuery, FieldType, Mark, Nested, Property, QueryConfig, Spec,
    SpecQuery, SpecQueryModel, Wildcard,
};

fn auto_count_model() -> SpecQueryModel {
    let config = QueryConfig {
        auto_add_count: true,
        ..QueryConfig::default()
    };
    common::model_with("point|x:Q,q", &config)
}
#[test]
fn test_disabled_auto_count_leaves_no_trace() -> anyhow::Result<()> {
    let mut model = auto_count_model();
    assert_eq!(model.encoding_count(), 2);
    model.set_encoding_property(1, Property::Channel, &PropertyValue::from(Channel::Y))?;
    model.set_encoding_property(1, Property::AutoCount, &PropertyValue::from(false))?;
    assert!(!model.channel_used(Channel::Y));
    let spec = model.to_spec().expect("resolved");
    assert_eq!(spec.encoding.keys().copied().collect::<Vec<_>>(), vec![Channel::X]);
    assert_eq!(model.to_shorthand(), "point|x:Q,q");
    Ok(())
}
#[test]
fn test_enabled_auto_count_takes_its_channel() -> anyhow::Result<()> {
    let mut model = auto_count_model();
    model.set_encoding_property(1, Property::Channel, &PropertyValue::from(Channel::Y))?;
    model.set_encoding_property(1, Property::AutoCount, &PropertyValue::from(true))?;
    assert!(model.channel_used(Channel::Y));
    let spec = model.to_spec().expect("resolved");
    let y = spec.encoding.get(&Channel::Y).expect("count on y");
    assert_eq!(y.get("aggregate").and_then(|v| v.as_str()), Some("count"));
    Ok(())
}
#[test]
fn test_shared_wildcard_name_is_rejected() {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.field = Spec::Wildcard(Wildcard::named("f", vec!["Q".to_string(), "Q1".to_string()]));
    let mut y = FieldQuery::new(Channel::Y, "Q1", FieldType::Quantitative);
    y.field = Spec::Wildcard(Wildcard::named("f", vec!["Q".to_string(), "Q1".to_string()]));
    let query = SpecQuery::new(Mark::Point, vec![x.into(), y.into()]);
    let err = SpecQueryModel::build(&query, &common::schema(), &QueryConfig::default())
        .expect_err("names must be unique");
    assert!(matches!(err, ModelError::DuplicateWildcardName { ref name } if name == "f"));
}
#[test]
fn test_to_spec_drops_off_bins_and_inapplicable_guides() {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Disabled);
    x.legend = Some(Nested::<GuideQuery>::enabled());
    let mut color = FieldQuery::new(Channel::Color, "N", FieldType::Nominal);
    color.axis = Some(Nested::<GuideQuery>::enabled());
    let mut row = FieldQuery::new(Channel::Row, "O", FieldType::Ordinal);
    row.scale = Some(Nested::<ScaleQuery>::enabled());
    let query = SpecQuery::new(Mark::Point, vec![x.into(), color.into(), row.into()]);
    let model = SpecQueryModel::build(&query, &common::schema(), &QueryConfig::default()).expect("build");
    let spec = model.to_spec().expect("resolved");
    let x = &spec.encoding[&Channel::X];
    assert!(!x.contains_key("bin"));
    assert!(!x.contains_key("legend"));
    assert!(!spec.encoding[&Channel::Color].contains_key("axis"));
    assert!(!spec.encoding[&Channel::Row].contains_key("scale"));
}
#[test]
fn test_enumerated_off_bin_is_not_written() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Wildcard(Wildcard::with_values(vec![true, false]), BinQuery::default()));
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    let unbinned = answers
        .iter()
        .find(|m| m.encoding(0).and_then(EncodingQuery::as_field).is_some_and(|q| !q.is_binned()))
        .expect("unbinned candidate");
    let spec = unbinned.to_spec().expect("resolved");
    assert!(!spec.encoding[&Channel::X].contains_key("bin"));
    Ok(())
}
#[test]
fn test_unreadable_stack_offset_is_rejected() {
    let mut query = compass::shorthand::parse("bar|color:N,n|x:sum(Q,q)|y:O,o").expect("shorthand parses");
    query.config = serde_json::json!({"stack": {"offset": "zero"}}).as_object().cloned();
    let err = SpecQueryModel::build(&query, &common::schema(), &QueryConfig::default())
        .expect_err("offset must be a name");
    assert!(matches!(err, ModelError::InvalidStackOffset { .. }), "{err}");
    query.config = serde_json::json!({"stack": "center"}).as_object().cloned();
    let model = SpecQueryModel::build(&query, &common::schema(), &QueryConfig::default()).expect("build");
    assert_eq!(model.stack().map(|s| s.offset), Some("center".to_string()));
}

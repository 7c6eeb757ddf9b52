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

use compass::query::BinQuery;
use compass::wildcard::Wildcard;
use compass::{
    generate, Channel, CompassError, EncodingQuery, FieldQuery, FieldType, Mark, Nested, Property, QueryConfig,
    Spec, SpecQuery,
};
use std::collections::BTreeSet;

fn auto_count_config() -> QueryConfig {
    QueryConfig {
        auto_add_count: true,
        ..QueryConfig::default()
    }
}
#[test]
fn test_open_bin_and_aggregate_on_one_field() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::short_wildcard());
    x.aggregate = Spec::short_wildcard();
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &auto_count_config())?;
    let got: BTreeSet<String> = common::shorthands(&answers).into_iter().collect();
    let expected: BTreeSet<String> = [
        "point|x:Q,q",
        "point|x:mean(Q,q)",
        "point|x:bin(Q,q)|y:count(*,q)",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    assert_eq!(got, expected, "raw, aggregated, and binned with an added count");
    Ok(())
}
#[test]
fn test_open_channel_keeps_only_valid_placements() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.channel = Spec::short_wildcard();
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert_eq!(common::shorthands(&answers), vec!["point|x:Q,q", "point|y:Q,q"]);
    Ok(())
}
#[test]
fn test_dimensions_on_both_axes_get_a_count() -> anyhow::Result<()> {
    let query = SpecQuery::new(
        Spec::short_wildcard(),
        vec![
            FieldQuery::new(Channel::X, "N", FieldType::Nominal).into(),
            FieldQuery::new(Channel::Y, "N20", FieldType::Nominal).into(),
        ],
    );
    let answers = generate(&query, &common::schema(), &auto_count_config())?;
    assert!(!answers.is_empty(), "counted heatmaps should remain");
    for model in &answers {
        assert!(
            model.encodings().any(EncodingQuery::is_enabled_auto_count),
            "{} should carry a count",
            model.to_shorthand()
        );
        let mark = model.mark().value().copied();
        assert!(
            !matches!(mark, Some(Mark::Area | Mark::Line | Mark::Bar | Mark::Tick)),
            "{} uses an occluding mark",
            model.to_shorthand()
        );
    }
    Ok(())
}
#[test]
fn test_two_raw_measures_never_use_bar_line_area_or_tick() -> anyhow::Result<()> {
    let query = SpecQuery::new(
        Spec::short_wildcard(),
        vec![
            FieldQuery::new(Channel::X, "Q", FieldType::Quantitative).into(),
            FieldQuery::new(Channel::Y, "Q1", FieldType::Quantitative).into(),
        ],
    );
    let answers = generate(&query, &common::schema(), &auto_count_config())?;
    assert!(!answers.is_empty());
    for model in &answers {
        let mark = model.mark().value().copied();
        assert!(!matches!(mark, Some(Mark::Area | Mark::Line | Mark::Bar | Mark::Tick)));
    }
    Ok(())
}
#[test]
fn test_open_channels_never_repeat() -> anyhow::Result<()> {
    let open = |field: &str, field_type: FieldType| {
        let mut q = FieldQuery::new(Channel::X, field, field_type);
        q.channel = Spec::short_wildcard();
        EncodingQuery::from(q)
    };
    let query = SpecQuery::new(
        Spec::short_wildcard(),
        vec![
            open("N", FieldType::Nominal),
            open("N20", FieldType::Nominal),
            open("Q", FieldType::Quantitative),
        ],
    );
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert!(!answers.is_empty());
    for model in &answers {
        let channels: Vec<Channel> = model.encodings().filter_map(EncodingQuery::concrete_channel).collect();
        let distinct: BTreeSet<Channel> = channels.iter().copied().collect();
        assert_eq!(channels.len(), 3, "{} left a channel open", model.to_shorthand());
        assert_eq!(distinct.len(), channels.len(), "{} repeats a channel", model.to_shorthand());
        assert!(model.mark().value().is_some());
        assert!(!model.to_shorthand().contains('?'));
    }
    Ok(())
}
#[test]
fn test_maxbins_values_enumerate_in_order() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Enabled(BinQuery {
        maxbins: Some(Spec::Wildcard(Wildcard::with_values(vec![10, 20, 30]))),
        ..BinQuery::default()
    }));
    let query = SpecQuery::new(Mark::Bar, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    let maxbins: Vec<Option<u32>> = answers
        .iter()
        .map(|m| {
            m.encoding(0)
                .and_then(EncodingQuery::as_field)
                .and_then(|q| q.bin.as_ref())
                .and_then(Nested::inner)
                .and_then(|b| b.maxbins.as_ref())
                .and_then(|s| s.value().copied())
        })
        .collect();
    assert_eq!(maxbins, vec![Some(10), Some(20), Some(30)]);
    Ok(())
}
#[test]
fn test_shape_leaves_only_point() -> anyhow::Result<()> {
    let marks = Wildcard::with_values(vec![Mark::Point, Mark::Bar, Mark::Line, Mark::Area]);
    let query = SpecQuery::new(
        Spec::Wildcard(marks),
        vec![
            FieldQuery::new(Channel::X, "Q", FieldType::Quantitative).into(),
            FieldQuery::new(Channel::Y, "Q1", FieldType::Quantitative).into(),
            FieldQuery::new(Channel::Shape, "O", FieldType::Ordinal).into(),
        ],
    );
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].mark(), &Spec::Value(Mark::Point));
    Ok(())
}
#[test]
fn test_bin_on_then_off() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Wildcard(
        Wildcard::with_values(vec![true, false]),
        BinQuery {
            maxbins: Some(Spec::Value(10)),
            ..BinQuery::default()
        },
    ));
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert_eq!(common::shorthands(&answers), vec!["point|x:bin(Q,q,maxbins=10)", "point|x:Q,q"]);
    let first = answers[0].encoding(0).and_then(EncodingQuery::as_field).expect("field");
    let maxbins = first.bin.as_ref().and_then(Nested::inner).and_then(|b| b.maxbins.clone());
    assert_eq!(maxbins, Some(Spec::Value(10)));
    let second = answers[1].encoding(0).and_then(EncodingQuery::as_field).expect("field");
    assert!(!second.is_binned());
    Ok(())
}
#[test]
fn test_precedence_without_an_open_property_is_refused() {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::short_wildcard());
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let config = QueryConfig {
        property_precedence: vec![Property::Type, Property::Field, Property::Channel, Property::Mark],
        ..QueryConfig::default()
    };
    let err = generate(&query, &common::schema(), &config).expect_err("bin is never expanded");
    assert!(matches!(err, CompassError::Config(_)), "{err}");
}
#[test]
fn test_bin_switched_back_on_keeps_its_maxbins() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Wildcard(
        Wildcard::with_values(vec![false, true]),
        BinQuery {
            maxbins: Some(Spec::Wildcard(Wildcard::with_values(vec![10, 20]))),
            ..BinQuery::default()
        },
    ));
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert_eq!(
        common::shorthands(&answers),
        vec!["point|x:Q,q", "point|x:bin(Q,q,maxbins=10)", "point|x:bin(Q,q,maxbins=20)"]
    );
    Ok(())
}
#[test]
fn test_bin_flag_and_maxbins_together() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::Wildcard(
        Wildcard::with_values(vec![true, false]),
        BinQuery {
            maxbins: Some(Spec::Wildcard(Wildcard::with_values(vec![10, 20, 30]))),
            ..BinQuery::default()
        },
    ));
    let query = SpecQuery::new(Mark::Point, vec![x.into()]);
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert_eq!(answers.len(), 4);
    let last = answers[3].encoding(0).and_then(EncodingQuery::as_field).expect("field");
    assert_eq!(last.bin, None);
    Ok(())
}
#[test]
fn test_generation_leaves_no_open_property() -> anyhow::Result<()> {
    let query = compass::shorthand::parse("?|?:?,?|?:?,?")?;
    let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
    assert!(!answers.is_empty());
    for model in &answers {
        assert!(!model.to_shorthand().contains('?'), "{} is incomplete", model.to_shorthand());
        assert!(model.to_spec().is_some());
    }
    Ok(())
}

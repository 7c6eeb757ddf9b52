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

use compass::property::Property;
use compass::query::shorthand::{self, Include, Replacers, INCLUDE_ALL};
use compass::{
    generate, AggregateOp, Channel, EncodingQuery, FieldQuery, FieldType, Mark, Nested, QueryConfig, Spec,
    SpecQuery,
};

fn round_trip(input: &str) -> anyhow::Result<String> {
    let query = shorthand::parse(input)?;
    Ok(shorthand::spec(&query, &INCLUDE_ALL, &Replacers::new()))
}
#[test]
fn test_parse_then_stringify_keeps_canonical_form() -> anyhow::Result<()> {
    for input in [
        "point|x:Q,q|y:mean(Q1,q)",
        "bar|x:bin(Q,q)|y:count(*,q)",
        "line|x:month(T,t)|y:sum(Q,q)",
        "tick|x:N,n",
    ] {
        assert_eq!(round_trip(input)?, input, "canonical shorthand should survive a round trip");
    }
    Ok(())
}
#[test]
fn test_generated_candidates_parse_back_to_themselves() -> anyhow::Result<()> {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.bin = Some(Nested::short_wildcard());
    x.aggregate = Spec::short_wildcard();
    let mut y = FieldQuery::new(Channel::Y, "Q1", FieldType::Quantitative);
    y.bin = Some(Nested::short_wildcard());
    for encodings in [vec![x.clone().into()], vec![x.into(), y.into()]] {
        let query = SpecQuery::new(Mark::Point, encodings);
        let answers = generate(&query, &common::schema(), &QueryConfig::default())?;
        assert!(!answers.is_empty());
        for answer in &answers {
            let parsed = shorthand::parse(&answer.to_shorthand())?;
            assert_eq!(&parsed, answer.spec_query(), "{}", answer.to_shorthand());
        }
    }
    Ok(())
}
#[test]
fn test_encodings_are_sorted() -> anyhow::Result<()> {
    assert_eq!(round_trip("point|y:Q1,q|x:Q,q")?, "point|x:Q,q|y:Q1,q");
    Ok(())
}
#[test]
fn test_parse_reads_functions() -> anyhow::Result<()> {
    let query = shorthand::parse("bar|x:bin(Q,q)|y:mean(Q1,q)")?;
    assert!(query.mark.is(&Mark::Bar));
    assert_eq!(query.encodings.len(), 2);
    let x = query.encodings[0].as_field().expect("field query");
    assert!(x.is_binned(), "bin() should switch the bin on");
    assert!(x.channel.is(&Channel::X));
    let y = query.encodings[1].as_field().expect("field query");
    assert_eq!(y.concrete_aggregate(), Some(AggregateOp::Mean));
    Ok(())
}
#[test]
fn test_disabled_auto_count() -> anyhow::Result<()> {
    let query = shorthand::parse("point|x:Q,q|y:-")?;
    assert_eq!(query.encodings.len(), 2);
    assert!(query.encodings[1].is_disabled_auto_count());
    assert_eq!(
        shorthand::encoding(&query.encodings[1], &INCLUDE_ALL, &Replacers::new()),
        "y:-"
    );
    assert_eq!(
        shorthand::spec(&query, &INCLUDE_ALL, &Replacers::new()),
        "point|x:Q,q",
        "a disabled auto count is left out of the whole-spec form"
    );
    Ok(())
}
#[test]
fn test_wildcards() -> anyhow::Result<()> {
    let query = shorthand::parse("?|?:?,?")?;
    assert!(query.mark.is_wildcard());
    let field = query.encodings[0].as_field().expect("field query");
    assert!(field.channel.is_wildcard());
    assert!(field.field.is_wildcard());
    assert!(field.field_type.is_wildcard());
    assert_eq!(round_trip("?|?:?,?")?, "?|?:?,?");
    let enumerated = shorthand::parse(r#"point|?["x","y"]:Q,q"#)?;
    let channel = enumerated.encodings[0].channel().wildcard().expect("channel wildcard");
    assert_eq!(channel.values, Some(vec![Channel::X, Channel::Y]));
    Ok(())
}
#[test]
fn test_function_wildcard() -> anyhow::Result<()> {
    let query = shorthand::parse(r#"point|x:?{"aggregate":["mean","median"]}(Q,q)"#)?;
    let field = query.encodings[0].as_field().expect("field query");
    let aggregate = field.aggregate.wildcard().expect("aggregate wildcard");
    assert_eq!(
        aggregate.values,
        Some(vec![Some(AggregateOp::Mean), Some(AggregateOp::Median)])
    );
    Ok(())
}
#[test]
fn test_include_and_replace() -> anyhow::Result<()> {
    let query = shorthand::parse("point|x:Q,q|y:mean(Q1,q)")?;
    let fields: Include = [Property::Field, Property::Type].into_iter().collect();
    assert_eq!(shorthand::spec(&query, &fields, &Replacers::new()), "Q,q|Q1,q");
    let mut channels = fields.clone();
    channels.insert(Property::Channel);
    let mut replace = Replacers::new();
    replace.insert(
        Property::Channel,
        [("x", "xy"), ("y", "xy")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    assert_eq!(shorthand::spec(&query, &channels, &replace), "xy:Q,q|xy:Q1,q");
    let no_field: Include = [Property::Mark, Property::Channel].into_iter().collect();
    assert_eq!(shorthand::spec(&query, &no_field, &Replacers::new()), "point|x:...|y:...");
    Ok(())
}
#[test]
fn test_malformed_input_is_rejected() {
    for input in ["", "point|x", "point|x:foo(Q,q)", "point|x:Q,z", "blob|x:Q,q"] {
        assert!(shorthand::parse(input).is_err(), "{input:?} should not parse");
    }
}
#[test]
fn test_chart_spec_reads_back_to_the_same_shorthand() -> anyhow::Result<()> {
    let model = common::model("point|x:Q,q|y:mean(Q1,q)");
    let chart = model.to_spec().expect("fully specified");
    assert_eq!(chart.mark, Mark::Point);
    assert_eq!(chart.encoding.len(), 2);
    assert_eq!(shorthand::vl_spec(&chart)?, model.to_shorthand());
    Ok(())
}
#[test]
fn test_value_encoding_shorthand() -> anyhow::Result<()> {
    let query = shorthand::parse(r#"point|x:Q,q|color:value="red""#)?;
    assert!(matches!(query.encodings[1], EncodingQuery::Value(_)));
    assert_eq!(
        shorthand::spec(&query, &INCLUDE_ALL, &Replacers::new()),
        r#"point|color:value="red"|x:Q,q"#
    );
    Ok(())
}

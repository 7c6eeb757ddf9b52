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

use compass::wildcard::Wildcard;
use compass::{
    recommend, Channel, CompassError, FieldQuery, FieldType, GroupBy, Mark, Nest, Query, QueryConfig,
    ResultItem, Spec, SpecQuery,
};

fn open_channel_query() -> Query {
    let mut x = FieldQuery::new(Channel::X, "Q", FieldType::Quantitative);
    x.channel = Spec::short_wildcard();
    Query::new(SpecQuery::new(Mark::Point, vec![x.into()]))
}
#[test]
fn test_no_candidates_gives_an_empty_tree() -> anyhow::Result<()> {
    let mut row = FieldQuery::new(Channel::Row, "Q", FieldType::Quantitative);
    row.channel = Spec::Wildcard(Wildcard::with_values(vec![Channel::Row]));
    let query = Query::new(SpecQuery::new(Mark::Point, vec![row.into()]));
    let result = recommend(&query, &common::schema())?;
    assert!(result.result.is_empty(), "a measure cannot sit on a facet");
    assert!(result.top().is_none());
    Ok(())
}
#[test]
fn test_every_candidate_is_scored_overall_by_default() -> anyhow::Result<()> {
    let query = open_channel_query();
    assert_eq!(query.order_by(), vec!["overall".to_string()]);
    let result = recommend(&query, &common::schema())?;
    let models = result.result.models();
    assert_eq!(models.len(), 2);
    for model in models {
        assert!(model.ranking_score("overall").is_some(), "{} was not scored", model.to_shorthand());
    }
    assert!(result.query.config.is_some(), "the effective config is echoed back");
    Ok(())
}
#[test]
fn test_max_results_truncates_after_ranking() -> anyhow::Result<()> {
    let query = open_channel_query().with_config(QueryConfig {
        max_results: Some(1),
        ..QueryConfig::default()
    });
    let result = recommend(&query, &common::schema())?;
    assert_eq!(result.result.models().len(), 1);
    Ok(())
}
#[test]
fn test_unknown_group_by_is_a_config_error() {
    let query = open_channel_query().with_nest(GroupBy::Named("bogus".into()));
    let err = recommend(&query, &common::schema()).expect_err("unknown grouping");
    assert!(matches!(err, CompassError::Config(_)), "got {err}");
}
#[test]
fn test_unknown_order_by_is_rejected() {
    let mut query = open_channel_query();
    query.order_by = vec!["prettiness".into()];
    assert!(recommend(&query, &common::schema()).is_err());
}
#[test]
fn test_invalid_config_is_rejected() {
    let query = open_channel_query().with_config(QueryConfig {
        marks: Vec::new(),
        ..QueryConfig::default()
    });
    assert!(recommend(&query, &common::schema()).is_err());
}
#[test]
fn test_choose_by_keeps_one_candidate_per_group() -> anyhow::Result<()> {
    let mut query = open_channel_query().with_nest(GroupBy::field());
    query.choose_by = Some("effectiveness".into());
    let result = recommend(&query, &common::schema())?;
    assert_eq!(result.result.items.len(), 1);
    let ResultItem::Group(group) = &result.result.items[0] else {
        panic!("expected a field group");
    };
    assert_eq!(group.name, "Q,q");
    assert_eq!(group.items.len(), 1);
    Ok(())
}
#[test]
fn test_groups_sort_by_their_best_candidate() -> anyhow::Result<()> {
    let query = Query::new(compass::shorthand::parse("point|?:N,n|?:Q,q")?).with_nest(GroupBy::encoding());
    let mut query = query;
    query.nest[0].order_group_by = Some("effectiveness".into());
    let result = recommend(&query, &common::schema())?;
    let tops: Vec<f64> = result
        .result
        .items
        .iter()
        .filter_map(|item| match item {
            ResultItem::Group(group) => group.top(),
            ResultItem::Model(_) => None,
        })
        .map(|model| model.ranking_score("effectiveness").map_or(0.0, |s| s.score))
        .collect();
    assert!(!tops.is_empty());
    assert!(tops.windows(2).all(|w| w[0] >= w[1]), "groups out of order: {tops:?}");
    Ok(())
}
#[test]
fn test_unsupported_mark_surfaces_as_error() -> anyhow::Result<()> {
    let query = Query::new(compass::shorthand::parse("rect|?:Q,q")?);
    assert!(recommend(&query, &common::schema()).is_err());
    Ok(())
}
#[test]
fn test_query_reads_json_and_yaml() -> anyhow::Result<()> {
    let full = Query::parse(
        r#"{
            "spec": {"mark": "point", "encodings": [{"channel": "?", "field": "Q", "type": "quantitative"}]},
            "nest": [{"groupBy": "field", "orderGroupBy": "effectiveness"}],
            "orderBy": "effectiveness",
            "chooseBy": "aggregationQuality"
        }"#,
    )?;
    assert_eq!(full.order_by, vec!["effectiveness".to_string()]);
    assert_eq!(full.nest, vec![Nest {
        group_by: GroupBy::field(),
        order_group_by: Some("effectiveness".into()),
    }]);
    assert_eq!(full.choose_by.as_deref(), Some("aggregationQuality"));
    assert!(full.spec.encodings[0].channel().is_wildcard());
    let bare = Query::parse("mark: bar\nencodings:\n  - channel: x\n    field: N\n    type: nominal\n")?;
    assert!(bare.spec.mark.is(&Mark::Bar));
    assert!(bare.nest.is_empty());
    assert_eq!(bare.order_by(), vec!["overall".to_string()]);
    Ok(())
}
#[test]
fn test_recommender_uses_its_own_config() -> anyhow::Result<()> {
    let config = QueryConfig {
        max_results: Some(1),
        ..QueryConfig::default()
    };
    let recommender = compass::Recommender::with_config(common::schema(), config)?;
    let result = recommender.recommend_shorthand("point|?:Q,q", &[GroupBy::field()])?;
    assert_eq!(result.result.models().len(), 1);
    assert_eq!(result.query.config.as_ref().and_then(|c| c.max_results), Some(1));
    Ok(())
}

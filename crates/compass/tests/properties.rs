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


// Generated field-only queries. Soak: PROPTEST_CASES=10000 cargo test --release

mod common;

use compass::query::shorthand::{self, Replacers, INCLUDE_ALL};
use compass::{nest, GroupBy, Nest, QueryConfig, SpecQueryModel};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}
// Retinal channels are left out so no candidate stacks.
const CHANNELS: [&str; 4] = ["x", "y", "row", "column"];
const MARKS: [&str; 4] = ["point", "bar", "line", "tick"];
/// A field definition valid for the fixture schema.
fn arb_field_def() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["Q", "Q1", "Q2"]).prop_flat_map(|f| {
            prop::sample::select(vec!["{f},q", "mean({f},q)", "sum({f},q)", "bin({f},q)"])
                .prop_map(move |t| t.replace("{f}", f))
        }),
        prop::sample::select(vec!["year(T,t)", "month(T,t)", "T,t"]).prop_map(str::to_string),
        prop::sample::select(vec!["N,n", "N20,n", "O,o"]).prop_map(str::to_string),
        Just("count(*,q)".to_string()),
    ]
}
fn arb_shorthand() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        prop::sample::select(MARKS.to_vec()),
        prop::collection::vec(arb_field_def(), 1..=CHANNELS.len()),
    )
        .prop_map(|(mark, defs)| {
            let parts: Vec<String> = CHANNELS
                .iter()
                .zip(defs)
                .map(|(channel, def)| format!("{channel}:{def}"))
                .collect();
            (mark.to_string(), parts)
        })
}
proptest! {
    #![proptest_config(config())]
    #[test]
    fn prop_shorthand_is_canonical((mark, parts) in arb_shorthand()) {
        let input = std::iter::once(mark.clone()).chain(parts.iter().cloned()).collect::<Vec<_>>().join("|");
        let query = shorthand::parse(&input).expect("generated shorthand parses");
        let rendered = shorthand::spec(&query, &INCLUDE_ALL, &Replacers::new());
        let mut sorted = parts.clone();
        sorted.sort();
        let expected = std::iter::once(mark).chain(sorted).collect::<Vec<_>>().join("|");
        prop_assert_eq!(&rendered, &expected);
        let again = shorthand::parse(&rendered).expect("rendered shorthand parses");
        prop_assert_eq!(shorthand::spec(&again, &INCLUDE_ALL, &Replacers::new()), rendered);
    }
    #[test]
    fn prop_grouping_keeps_every_candidate(inputs in prop::collection::vec(arb_shorthand(), 1..12)) {
        let models: Vec<SpecQueryModel> = inputs
            .into_iter()
            .map(|(mark, parts)| {
                let input = std::iter::once(mark).chain(parts).collect::<Vec<_>>().join("|");
                common::model_with(&input, &QueryConfig::default())
            })
            .collect();
        let expected: Vec<String> = models.iter().map(SpecQueryModel::to_shorthand).collect();
        let levels = [Nest::new(GroupBy::field()), Nest::new(GroupBy::encoding())];
        let tree = nest(models.clone(), &levels);
        let mut got: Vec<String> = tree.models().into_iter().map(SpecQueryModel::to_shorthand).collect();
        prop_assert_eq!(got.len(), expected.len());
        let again = nest(models, &levels);
        let names = |t: &compass::ResultTree| t.items.iter().map(|i| match i {
            compass::ResultItem::Group(g) => g.name.clone(),
            compass::ResultItem::Model(m) => m.to_shorthand(),
        }).collect::<Vec<_>>();
        prop_assert_eq!(names(&tree), names(&again));
        let mut expected = expected;
        expected.sort();
        got.sort();
        prop_assert_eq!(got, expected);
    }
}

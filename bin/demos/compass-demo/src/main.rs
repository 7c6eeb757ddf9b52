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

mod args;

use anyhow::{bail, Context, Result};
use args::{Args, OutputFormat};
use clap::Parser;
use compass::nest::{PropertyGroupBy, ENCODING, FIELD, FIELD_TRANSFORM, SPEC, TRANSPOSE};
use compass::property::parse_property_list;
use compass::{GroupBy, Nest, Query, RecommendResult, Recommender, ResultItem, ResultTree};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_group_by(raw: &str) -> Result<GroupBy> {
    if [FIELD, FIELD_TRANSFORM, ENCODING, TRANSPOSE, SPEC].contains(&raw) {
        return Ok(GroupBy::Named(raw.to_string()));
    }
    let properties = parse_property_list(raw).with_context(|| format!("invalid --group-by '{raw}'"))?;
    Ok(GroupBy::Properties(
        properties.into_iter().map(PropertyGroupBy::Property).collect(),
    ))
}
fn load_query(args: &Args) -> Result<Query> {
    match (&args.query, &args.shorthand) {
        (Some(path), _) => {
            Query::from_file(path).with_context(|| format!("failed to load query {}", path.display()))
        }
        (None, Some(shorthand)) => {
            let spec = compass::shorthand::parse(shorthand).context("failed to parse shorthand")?;
            Ok(Query::new(spec))
        }
        (None, None) => bail!("either --query or --shorthand is required"),
    }
}
fn print_tree(tree: &ResultTree, depth: usize, limit: usize) {
    let indent = "  ".repeat(depth);
    for item in tree.items.iter().take(limit) {
        match item {
            ResultItem::Group(group) => {
                println!("{indent}[{}] {} candidate(s)", group.name, group.models().len());
                print_tree(group, depth + 1, limit);
            }
            ResultItem::Model(model) => {
                let score = model.ranking_score("overall").map_or(0.0, |s| s.score);
                println!("{indent}{score:>8.3}  {}", model.to_shorthand());
            }
        }
    }
}
fn print_result(result: &RecommendResult, args: &Args) -> Result<()> {
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            println!("Query: {}", compass::shorthand::spec(
                &result.query.spec,
                &compass::shorthand::INCLUDE_ALL,
                &compass::shorthand::Replacers::new(),
            ));
            println!("Candidates: {}", result.result.models().len());
            print_tree(&result.result, 0, args.top);
            if let Some(top) = result.top() {
                println!("\nTop chart:\n{}", serde_json::to_string_pretty(&top.to_spec())?);
            }
        }
    }
    Ok(())
}
fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
    let recommender = Recommender::from_files(&args.schema, args.config.as_deref())
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;
    let mut query = load_query(&args)?;
    for raw in &args.group_by {
        query.nest.push(Nest::new(parse_group_by(raw)?));
    }
    if args.verbose {
        let mut config = query.config.clone().unwrap_or_else(|| recommender.config().clone());
        config.verbose = true;
        query.config = Some(config);
    }
    info!(fields = recommender.schema().fields().len(), "running recommendation");
    let result = match recommender.recommend(&query) {
        Ok(result) => result,
        Err(e) => {
            compass::logging::log_error("recommend", &e);
            eprintln!("{}", compass::ErrorReporter::new().report(&e));
            std::process::exit(1);
        }
    };
    print_result(&result, &args)
}
